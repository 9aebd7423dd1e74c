//! Grading engine: assessments, grade input and weighted final scores

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sisfo_common::db::TenantScope;
use sisfo_common::models::{Assessment, Grade, GradeStatus, RecordMeta};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{assessments, grade_categories, grades, report_cards};
use crate::services::scoring::WeightedScore;

#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentInput {
    pub grade_category_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    #[serde(default)]
    pub semester_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_score: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeInput {
    #[serde(alias = "assessment")]
    pub assessment_id: Uuid,
    #[serde(alias = "student")]
    pub student_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub notes: String,
    /// Kept from the existing grade when omitted on an update
    #[serde(default)]
    pub status: Option<GradeStatus>,
}

/// Weighted final score of one student in one subject
#[derive(Debug, Clone, Serialize)]
pub struct FinalScore {
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub semester_id: Option<Uuid>,
    pub final_score: f64,
    /// Assessments that contributed a grade
    pub graded_assessments: usize,
    pub total_assessments: usize,
}

#[derive(Clone)]
pub struct GradingService {
    db: SqlitePool,
}

impl GradingService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_assessment(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        input: AssessmentInput,
    ) -> Result<Assessment> {
        let assessment = Assessment {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            grade_category_id: input.grade_category_id,
            teacher_id: input.teacher_id,
            subject_id: input.subject_id,
            class_id: input.class_id,
            semester_id: input.semester_id,
            name: input.name.trim().to_string(),
            description: input.description,
            max_score: input.max_score,
            date: input.date,
            meta: RecordMeta::new(actor),
        };
        assessment.validate()?;

        let scope = TenantScope::new(tenant);
        if grade_categories::get_category(&self.db, &scope, assessment.grade_category_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound(format!(
                "grade category {}",
                assessment.grade_category_id
            )));
        }

        assessments::insert_assessment(&self.db, &assessment).await?;
        info!(
            tenant = %tenant,
            assessment_id = %assessment.id,
            class_id = %assessment.class_id,
            subject_id = %assessment.subject_id,
            "assessment created"
        );
        Ok(assessment)
    }

    pub async fn get_assessment(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Assessment>> {
        assessments::get_assessment(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_assessments(
        &self,
        tenant: &TenantId,
        class_id: Option<Uuid>,
        subject_id: Option<Uuid>,
    ) -> Result<Vec<Assessment>> {
        assessments::list_assessments(&self.db, &TenantScope::new(tenant), class_id, subject_id).await
    }

    /// Create the student's grade for an assessment or overwrite the live one
    ///
    /// Fails with `AlreadyPublished` once the report card covering the
    /// assessment is published.
    pub async fn input_grade(&self, tenant: &TenantId, actor: Option<Uuid>, input: GradeInput) -> Result<Grade> {
        let scope = TenantScope::new(tenant);
        let assessment = assessments::get_assessment(&self.db, &scope, input.assessment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("assessment {}", input.assessment_id)))?;

        let mut grade = Grade {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            assessment_id: input.assessment_id,
            student_id: input.student_id,
            score: input.score,
            feedback: input.feedback,
            notes: input.notes,
            status: input.status.unwrap_or(GradeStatus::Draft),
            graded_by: actor,
            approved_by: None,
            approved_at: None,
            meta: RecordMeta::new(actor),
        };
        grade.validate()?;
        if grade.score > assessment.max_score {
            return Err(Error::invalid_field(
                "score",
                format!("Score cannot exceed the assessment maximum of {}", assessment.max_score),
            ));
        }

        let mut tx = self.db.begin().await?;
        if report_cards::has_published(
            &mut *tx,
            &scope,
            grade.student_id,
            assessment.class_id,
            assessment.semester_id,
        )
        .await?
        {
            return Err(Error::AlreadyPublished);
        }
        let existing =
            grades::get_by_student_and_assessment(&mut *tx, &scope, grade.student_id, grade.assessment_id).await?;
        match existing {
            Some(existing) => {
                grade.id = existing.id;
                grade.meta = existing.meta;
                grade.meta.touch(actor);
                if input.status.is_none() {
                    grade.status = existing.status;
                }
                if grade.status == GradeStatus::Final {
                    grade.approved_by = existing.approved_by;
                    grade.approved_at = existing.approved_at;
                }
                grades::update_grade(&mut *tx, &grade).await?;
                debug!(grade_id = %grade.id, "grade overwritten");
            }
            None => grades::insert_grade(&mut *tx, &grade).await?,
        }
        tx.commit().await?;

        info!(
            tenant = %tenant,
            grade_id = %grade.id,
            assessment_id = %grade.assessment_id,
            student_id = %grade.student_id,
            score = grade.score,
            "grade recorded"
        );
        Ok(grade)
    }

    pub async fn get_grade(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Grade>> {
        grades::get_grade(&self.db, &TenantScope::new(tenant), id).await
    }

    /// A student's grades, optionally limited to a class and/or semester
    pub async fn list_student_grades(
        &self,
        tenant: &TenantId,
        student_id: Uuid,
        class_id: Option<Uuid>,
        semester_id: Option<Uuid>,
    ) -> Result<Vec<Grade>> {
        let scope = TenantScope::new(tenant);
        let all = grades::list_by_student(&self.db, &scope, student_id).await?;
        if class_id.is_none() && semester_id.is_none() {
            return Ok(all);
        }

        let wanted: HashMap<Uuid, Assessment> = assessments::list_assessments(&self.db, &scope, class_id, None)
            .await?
            .into_iter()
            .filter(|a| semester_id.map_or(true, |s| a.counts_for(s)))
            .map(|a| (a.id, a))
            .collect();
        Ok(all
            .into_iter()
            .filter(|g| wanted.contains_key(&g.assessment_id))
            .collect())
    }

    /// Mark a grade final; grades frozen by a published card stay as they are
    pub async fn approve_grade(&self, tenant: &TenantId, actor: Option<Uuid>, id: Uuid) -> Result<Grade> {
        let scope = TenantScope::new(tenant);
        let mut grade = grades::get_grade(&self.db, &scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("grade {}", id)))?;
        let assessment = assessments::get_assessment(&self.db, &scope, grade.assessment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("assessment {}", grade.assessment_id)))?;

        grade.status = GradeStatus::Final;
        grade.approved_by = actor;
        grade.approved_at = Some(sisfo_common::time::now());
        grade.meta.touch(actor);

        let mut tx = self.db.begin().await?;
        if report_cards::has_published(
            &mut *tx,
            &scope,
            grade.student_id,
            assessment.class_id,
            assessment.semester_id,
        )
        .await?
        {
            return Err(Error::AlreadyPublished);
        }
        if !grades::update_grade(&mut *tx, &grade).await? {
            return Err(Error::NotFound(format!("grade {}", id)));
        }
        tx.commit().await?;
        info!(tenant = %tenant, grade_id = %id, "grade approved");
        Ok(grade)
    }

    /// Weighted average of a student's normalised scores in one subject
    ///
    /// Assessments without a grade for the student are skipped, as are
    /// assessments bound to a different semester.
    pub async fn final_score(
        &self,
        tenant: &TenantId,
        student_id: Uuid,
        class_id: Uuid,
        subject_id: Uuid,
        semester_id: Option<Uuid>,
    ) -> Result<FinalScore> {
        let scope = TenantScope::new(tenant);
        let candidates: Vec<Assessment> =
            assessments::get_by_class_and_subject(&self.db, &scope, class_id, subject_id)
                .await?
                .into_iter()
                .filter(|a| semester_id.map_or(true, |s| a.counts_for(s)))
                .collect();

        let mut result = FinalScore {
            student_id,
            class_id,
            subject_id,
            semester_id,
            final_score: 0.0,
            graded_assessments: 0,
            total_assessments: candidates.len(),
        };
        if candidates.is_empty() {
            return Ok(result);
        }

        let weights = grade_categories::weights(&self.db, &scope).await?;
        let mut acc = WeightedScore::default();
        for assessment in &candidates {
            let grade = grades::get_by_student_and_assessment(&self.db, &scope, student_id, assessment.id).await?;
            let (grade, weight) = match (grade, weights.get(&assessment.grade_category_id)) {
                (Some(g), Some(w)) => (g, *w),
                (None, _) => continue,
                (Some(_), None) => {
                    debug!(assessment_id = %assessment.id, "category missing, assessment skipped");
                    continue;
                }
            };
            acc.add(assessment.normalize(grade.score), weight);
            result.graded_assessments += 1;
        }

        result.final_score = acc.value();
        Ok(result)
    }
}

/// Per-subject weighted scores of a student in a class for a semester
///
/// Joins the student's grades to the class's assessments; grades of other
/// classes and assessments bound to other semesters drop out.
pub(crate) async fn subject_scores(
    pool: &SqlitePool,
    scope: &TenantScope,
    student_id: Uuid,
    class_id: Uuid,
    semester_id: Uuid,
) -> Result<BTreeMap<Uuid, WeightedScore>> {
    let class_assessments: HashMap<Uuid, Assessment> =
        assessments::list_assessments(pool, scope, Some(class_id), None)
            .await?
            .into_iter()
            .filter(|a| a.counts_for(semester_id))
            .map(|a| (a.id, a))
            .collect();
    let weights = grade_categories::weights(pool, scope).await?;

    let mut by_subject: BTreeMap<Uuid, WeightedScore> = BTreeMap::new();
    for grade in grades::list_by_student(pool, scope, student_id).await? {
        let Some(assessment) = class_assessments.get(&grade.assessment_id) else {
            continue;
        };
        let Some(weight) = weights.get(&assessment.grade_category_id) else {
            continue;
        };
        by_subject
            .entry(assessment.subject_id)
            .or_default()
            .add(assessment.normalize(grade.score), *weight);
    }
    Ok(by_subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::categories::{GradeCategoryInput, GradeCategoryService};
    use sisfo_common::db::init_memory_database;
    use sisfo_common::models::{ReportCard, ReportCardStatus};

    struct Fixture {
        pool: SqlitePool,
        svc: GradingService,
        tenant: TenantId,
        class_id: Uuid,
        subject_id: Uuid,
        semester_id: Uuid,
        k1: Uuid,
        k2: Uuid,
    }

    async fn fixture() -> Fixture {
        let pool = init_memory_database().await.unwrap();
        let tenant = TenantId::new("t1");
        let categories = GradeCategoryService::new(pool.clone());
        let category = |name: &str, weight: f64| GradeCategoryInput {
            name: name.into(),
            description: String::new(),
            weight,
        };
        let k1 = categories.create(&tenant, None, category("Tugas", 1.0)).await.unwrap().id;
        let k2 = categories.create(&tenant, None, category("Ujian", 3.0)).await.unwrap().id;

        Fixture {
            svc: GradingService::new(pool.clone()),
            pool,
            tenant,
            class_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            semester_id: Uuid::new_v4(),
            k1,
            k2,
        }
    }

    impl Fixture {
        async fn assessment(&self, category: Uuid, max_score: f64, semester_id: Option<Uuid>) -> Assessment {
            self.svc
                .create_assessment(
                    &self.tenant,
                    None,
                    AssessmentInput {
                        grade_category_id: category,
                        teacher_id: Uuid::new_v4(),
                        subject_id: self.subject_id,
                        class_id: self.class_id,
                        semester_id,
                        name: "Penilaian".into(),
                        description: String::new(),
                        max_score,
                        date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
                    },
                )
                .await
                .unwrap()
        }

        async fn grade(&self, assessment_id: Uuid, student_id: Uuid, score: f64) -> Result<Grade> {
            self.svc
                .input_grade(
                    &self.tenant,
                    None,
                    GradeInput {
                        assessment_id,
                        student_id,
                        score,
                        feedback: String::new(),
                        notes: String::new(),
                        status: None,
                    },
                )
                .await
        }

        async fn final_score(&self, student_id: Uuid, semester_id: Option<Uuid>) -> FinalScore {
            self.svc
                .final_score(&self.tenant, student_id, self.class_id, self.subject_id, semester_id)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_weighted_final_score() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a1 = f.assessment(f.k1, 100.0, None).await;
        let a2 = f.assessment(f.k2, 50.0, None).await;

        f.grade(a1.id, student, 80.0).await.unwrap();
        f.grade(a2.id, student, 40.0).await.unwrap();

        let score = f.final_score(student, None).await;
        assert!((score.final_score - 80.0).abs() < 1e-9);
        assert_eq!(score.graded_assessments, 2);
    }

    #[tokio::test]
    async fn test_missing_grade_is_skipped() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a1 = f.assessment(f.k1, 100.0, None).await;
        f.assessment(f.k2, 50.0, None).await;

        f.grade(a1.id, student, 70.0).await.unwrap();

        let score = f.final_score(student, None).await;
        assert!((score.final_score - 70.0).abs() < 1e-9);
        assert_eq!(score.graded_assessments, 1);
        assert_eq!(score.total_assessments, 2);
    }

    #[tokio::test]
    async fn test_no_assessments_scores_zero() {
        let f = fixture().await;
        let score = f.final_score(Uuid::new_v4(), None).await;
        assert_eq!(score.final_score, 0.0);
        assert_eq!(score.total_assessments, 0);
    }

    #[tokio::test]
    async fn test_other_semester_is_ignored() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let current = f.assessment(f.k1, 100.0, Some(f.semester_id)).await;
        let other = f.assessment(f.k1, 100.0, Some(Uuid::new_v4())).await;

        f.grade(current.id, student, 90.0).await.unwrap();
        f.grade(other.id, student, 10.0).await.unwrap();

        let score = f.final_score(student, Some(f.semester_id)).await;
        assert!((score.final_score - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_grade_input_is_idempotent() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a = f.assessment(f.k1, 100.0, None).await;

        let first = f.grade(a.id, student, 80.0).await.unwrap();
        let second = f.grade(a.id, student, 90.0).await.unwrap();
        assert_eq!(first.id, second.id);

        let grades = f.svc.list_student_grades(&f.tenant, student, None, None).await.unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].score, 90.0);
    }

    #[tokio::test]
    async fn test_grade_validation() {
        let f = fixture().await;
        let a = f.assessment(f.k2, 50.0, None).await;

        match f.grade(a.id, Uuid::new_v4(), 51.0).await {
            Err(Error::Validation(e)) => assert!(e.contains("score")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(matches!(f.grade(a.id, Uuid::new_v4(), -1.0).await, Err(Error::Validation(_))));
        assert!(matches!(
            f.grade(Uuid::new_v4(), Uuid::new_v4(), 10.0).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_assessment_needs_known_category() {
        let f = fixture().await;
        let result = f
            .svc
            .create_assessment(
                &f.tenant,
                None,
                AssessmentInput {
                    grade_category_id: Uuid::new_v4(),
                    teacher_id: Uuid::new_v4(),
                    subject_id: f.subject_id,
                    class_id: f.class_id,
                    semester_id: None,
                    name: "Kuis".into(),
                    description: String::new(),
                    max_score: 10.0,
                    date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
                },
            )
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_grade() {
        let f = fixture().await;
        let a = f.assessment(f.k1, 100.0, None).await;
        let grade = f.grade(a.id, Uuid::new_v4(), 75.0).await.unwrap();
        let approver = Uuid::new_v4();

        let approved = f.svc.approve_grade(&f.tenant, Some(approver), grade.id).await.unwrap();
        assert_eq!(approved.status, GradeStatus::Final);
        assert_eq!(approved.approved_by, Some(approver));
        assert!(approved.approved_at.is_some());

        let stored = f.svc.get_grade(&f.tenant, grade.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GradeStatus::Final);
    }

    #[tokio::test]
    async fn test_published_card_freezes_grades() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a = f.assessment(f.k1, 100.0, Some(f.semester_id)).await;
        f.grade(a.id, student, 60.0).await.unwrap();

        let mut card = ReportCard::new("t1", student, f.class_id, f.semester_id);
        card.status = ReportCardStatus::Published;
        let mut tx = f.pool.begin().await.unwrap();
        report_cards::insert_report_card(&mut tx, &card).await.unwrap();
        tx.commit().await.unwrap();

        assert!(matches!(f.grade(a.id, student, 95.0).await, Err(Error::AlreadyPublished)));
        let grades = f.svc.list_student_grades(&f.tenant, student, None, None).await.unwrap();
        assert_eq!(grades[0].score, 60.0);
    }

    #[tokio::test]
    async fn test_published_card_blocks_approval() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a = f.assessment(f.k1, 100.0, Some(f.semester_id)).await;
        let grade = f.grade(a.id, student, 70.0).await.unwrap();

        let mut card = ReportCard::new("t1", student, f.class_id, f.semester_id);
        card.status = ReportCardStatus::Published;
        let mut tx = f.pool.begin().await.unwrap();
        report_cards::insert_report_card(&mut tx, &card).await.unwrap();
        tx.commit().await.unwrap();

        assert!(matches!(
            f.svc.approve_grade(&f.tenant, Some(Uuid::new_v4()), grade.id).await,
            Err(Error::AlreadyPublished)
        ));
        let stored = f.svc.get_grade(&f.tenant, grade.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GradeStatus::Draft);
        assert!(stored.approved_by.is_none());
    }

    #[tokio::test]
    async fn test_subject_scores_group_by_subject() {
        let f = fixture().await;
        let student = Uuid::new_v4();
        let a = f.assessment(f.k1, 100.0, None).await;
        f.grade(a.id, student, 88.0).await.unwrap();

        let scores = subject_scores(&f.pool, &TenantScope::new(&f.tenant), student, f.class_id, f.semester_id)
            .await
            .unwrap();
        assert_eq!(scores.len(), 1);
        assert!((scores[&f.subject_id].value() - 88.0).abs() < 1e-9);

        let elsewhere = subject_scores(&f.pool, &TenantScope::new(&f.tenant), student, Uuid::new_v4(), f.semester_id)
            .await
            .unwrap();
        assert!(elsewhere.is_empty());
    }
}
