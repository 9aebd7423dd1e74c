//! Curricula with their subjects and grading rules

use crate::db::curricula as db;
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{Curriculum, CurriculumSubject, GradingRule, RecordMeta};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub year: i64,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumSubjectInput {
    pub subject_id: Uuid,
    pub grade_level: i64,
    pub semester: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradingRuleInput {
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    pub points: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone)]
pub struct CurriculumService {
    db: SqlitePool,
}

impl CurriculumService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: CurriculumInput) -> Result<Curriculum> {
        let curriculum = Curriculum {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            year: input.year,
            is_active: input.is_active,
            meta: RecordMeta::new(actor),
        };
        curriculum.validate()?;
        db::insert_curriculum(&self.db, &curriculum).await?;
        info!(tenant = %tenant, curriculum_id = %curriculum.id, "curriculum created");
        Ok(curriculum)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Curriculum>> {
        db::get_curriculum(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<Curriculum>> {
        db::list_curricula(&self.db, &TenantScope::new(tenant)).await
    }

    pub async fn add_subject(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        curriculum_id: Uuid,
        input: CurriculumSubjectInput,
    ) -> Result<CurriculumSubject> {
        self.ensure_exists(tenant, curriculum_id).await?;
        let subject = CurriculumSubject {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            curriculum_id,
            subject_id: input.subject_id,
            grade_level: input.grade_level,
            semester: input.semester,
            meta: RecordMeta::new(actor),
        };
        subject.validate()?;
        db::insert_curriculum_subject(&self.db, &subject).await?;
        Ok(subject)
    }

    pub async fn list_subjects(&self, tenant: &TenantId, curriculum_id: Uuid) -> Result<Vec<CurriculumSubject>> {
        db::list_curriculum_subjects(&self.db, &TenantScope::new(tenant), curriculum_id).await
    }

    pub async fn add_grading_rule(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        curriculum_id: Uuid,
        input: GradingRuleInput,
    ) -> Result<GradingRule> {
        self.ensure_exists(tenant, curriculum_id).await?;
        let rule = GradingRule {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            curriculum_id,
            grade: input.grade.trim().to_string(),
            min_score: input.min_score,
            max_score: input.max_score,
            points: input.points,
            description: input.description,
            meta: RecordMeta::new(actor),
        };
        rule.validate()?;
        db::insert_grading_rule(&self.db, &rule).await?;
        info!(tenant = %tenant, curriculum_id = %curriculum_id, grade = %rule.grade, "grading rule added");
        Ok(rule)
    }

    /// Rules ordered by `min_score` descending
    pub async fn list_grading_rules(&self, tenant: &TenantId, curriculum_id: Uuid) -> Result<Vec<GradingRule>> {
        db::list_grading_rules(&self.db, &TenantScope::new(tenant), curriculum_id).await
    }

    async fn ensure_exists(&self, tenant: &TenantId, curriculum_id: Uuid) -> Result<()> {
        match self.get(tenant, curriculum_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("curriculum {}", curriculum_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;

    fn rule(grade: &str, min: f64, max: f64, points: f64) -> GradingRuleInput {
        GradingRuleInput {
            grade: grade.into(),
            min_score: min,
            max_score: max,
            points,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_rules_listed_highest_first() {
        let svc = CurriculumService::new(init_memory_database().await.unwrap());
        let tenant = TenantId::new("t1");
        let curriculum = svc
            .create(
                &tenant,
                None,
                CurriculumInput { name: "Merdeka".into(), description: String::new(), year: 2024, is_active: true },
            )
            .await
            .unwrap();

        svc.add_grading_rule(&tenant, None, curriculum.id, rule("C", 70.0, 79.99, 2.0)).await.unwrap();
        svc.add_grading_rule(&tenant, None, curriculum.id, rule("A", 90.0, 100.0, 4.0)).await.unwrap();
        svc.add_grading_rule(&tenant, None, curriculum.id, rule("B", 80.0, 89.99, 3.0)).await.unwrap();

        let grades: Vec<String> = svc
            .list_grading_rules(&tenant, curriculum.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.grade)
            .collect();
        assert_eq!(grades, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_rule_for_unknown_curriculum() {
        let svc = CurriculumService::new(init_memory_database().await.unwrap());
        let err = svc
            .add_grading_rule(&TenantId::new("t1"), None, Uuid::new_v4(), rule("A", 90.0, 100.0, 4.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subject_semester_must_be_one_or_two() {
        let svc = CurriculumService::new(init_memory_database().await.unwrap());
        let tenant = TenantId::new("t1");
        let curriculum = svc
            .create(
                &tenant,
                None,
                CurriculumInput { name: "K13".into(), description: String::new(), year: 2013, is_active: false },
            )
            .await
            .unwrap();

        let err = svc
            .add_subject(
                &tenant,
                None,
                curriculum.id,
                CurriculumSubjectInput { subject_id: Uuid::new_v4(), grade_level: 10, semester: 3 },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
