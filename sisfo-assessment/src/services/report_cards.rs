//! Report-card engine: generation, PDF upload and publishing

use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{AttendanceSummary, RecordMeta, ReportCard, ReportCardDetail, ReportCardStatus};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{academic, report_cards as db, templates};
use crate::services::grading::subject_scores;
use crate::services::letter_grade::{credit_for, GradeScale};
use crate::services::pdf::{render_report_card, CardHeader};
use crate::services::storage::{report_card_path, FileStorage};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInput {
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub semester_id: Uuid,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub attendance_summary: Option<AttendanceSummary>,
}

#[derive(Clone)]
pub struct ReportCardService {
    db: SqlitePool,
    storage: Arc<dyn FileStorage>,
}

impl ReportCardService {
    pub fn new(db: SqlitePool, storage: Arc<dyn FileStorage>) -> Self {
        Self { db, storage }
    }

    /// Compute and store the student's card for a semester
    ///
    /// Regenerating an unpublished card rewrites it in place; a published
    /// card is never touched.
    pub async fn generate(&self, tenant: &TenantId, actor: Option<Uuid>, input: GenerateInput) -> Result<ReportCard> {
        let scope = TenantScope::new(tenant);
        let existing = db::get_by_student_and_semester(&self.db, &scope, input.student_id, input.semester_id).await?;
        let is_new = existing.is_none();

        let mut card = match existing {
            Some(card) if card.is_published() => return Err(Error::AlreadyPublished),
            Some(mut card) => {
                card.class_id = input.class_id;
                card.meta.touch(actor);
                card
            }
            None => {
                let mut card = ReportCard::new(tenant.as_str(), input.student_id, input.class_id, input.semester_id);
                card.meta = RecordMeta::new(actor);
                card
            }
        };
        card.validate()?;
        if let Some(comments) = input.comments {
            card.comments = comments;
        }
        if let Some(attendance) = input.attendance_summary {
            card.attendance_summary = attendance;
        }

        let scale = self.grade_scale(&scope, card.semester_id).await?;
        self.fill_details(&scope, &mut card, &scale).await?;

        card.status = ReportCardStatus::Generated;
        card.generated_at = Some(sisfo_common::time::now());
        card.pdf_url = self.upload_pdf(&scope, &card).await;

        let stored = self.store(&card, is_new).await;
        if !matches!(stored, Ok(true)) {
            // A new card owns its object path; an existing card's file is
            // put back from the stored row below
            if is_new && !card.pdf_url.is_empty() {
                self.discard_pdf(&scope, card.id).await;
            }
            stored?;
            return Err(self.lost_update(&scope, card.id).await?);
        }

        info!(
            tenant = %tenant,
            report_card_id = %card.id,
            student_id = %card.student_id,
            subjects = card.details.len(),
            gpa = card.gpa,
            "report card generated"
        );
        Ok(card)
    }

    /// Lock a generated card; publishing twice is a no-op
    pub async fn publish(&self, tenant: &TenantId, actor: Option<Uuid>, id: Uuid) -> Result<ReportCard> {
        let mut card = db::get_report_card(&self.db, &TenantScope::new(tenant), id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("report card {}", id)))?;

        if card.is_published() {
            return Ok(card);
        }
        if !card.status.can_transition_to(ReportCardStatus::Published) {
            return Err(Error::InvalidTransition(format!(
                "report card {} is {} and cannot be published",
                id, card.status
            )));
        }

        card.status = ReportCardStatus::Published;
        card.published_at = Some(sisfo_common::time::now());
        card.meta.touch(actor);
        if !db::update_status(&self.db, &card).await? {
            return Err(Error::NotFound(format!("report card {}", id)));
        }

        info!(tenant = %tenant, report_card_id = %id, "report card published");
        Ok(card)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<ReportCard>> {
        db::get_report_card(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_by_student(
        &self,
        tenant: &TenantId,
        student_id: Uuid,
        semester_id: Option<Uuid>,
    ) -> Result<Vec<ReportCard>> {
        db::list_by_student(&self.db, &TenantScope::new(tenant), student_id, semester_id).await
    }

    /// Render the stored card; `None` when the card does not exist
    pub async fn render_pdf(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Vec<u8>>> {
        let scope = TenantScope::new(tenant);
        match db::get_report_card(&self.db, &scope, id).await? {
            Some(card) => Ok(Some(self.render(&scope, &card).await?)),
            None => Ok(None),
        }
    }

    async fn grade_scale(&self, scope: &TenantScope, semester_id: Uuid) -> Result<GradeScale> {
        match academic::semester_curriculum(&self.db, scope, semester_id).await? {
            Some(curriculum_id) => Ok(GradeScale::from_rules(
                academic::grading_rules(&self.db, scope, curriculum_id).await?,
            )),
            None => Ok(GradeScale::Builtin),
        }
    }

    /// Replace the card's details and recompute credits and GPA
    async fn fill_details(&self, scope: &TenantScope, card: &mut ReportCard, scale: &GradeScale) -> Result<()> {
        let scores = subject_scores(&self.db, scope, card.student_id, card.class_id, card.semester_id).await?;

        let mut details = Vec::with_capacity(scores.len());
        let mut total_points = 0.0;
        let mut total_credits = 0;
        for (subject_id, score) in scores {
            let subject = academic::subject_info(&self.db, scope, subject_id).await?;
            let final_score = score.value();
            let letter = scale.grade(final_score);
            let credit = credit_for(subject.as_ref().map(|s| s.credit_units));

            total_points += letter.points * credit as f64;
            total_credits += credit;
            details.push(ReportCardDetail {
                id: Uuid::new_v4(),
                report_card_id: card.id,
                subject_id,
                subject_name: subject.map(|s| s.name).unwrap_or_else(|| subject_id.to_string()),
                credit,
                final_score,
                grade_letter: letter.letter,
                points: letter.points,
                comments: String::new(),
            });
        }
        details.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));

        card.details = details;
        card.total_credits = total_credits;
        card.gpa = if total_credits > 0 {
            total_points / total_credits as f64
        } else {
            0.0
        };
        Ok(())
    }

    /// Insert or rewrite the card; `false` when an existing card could not be
    /// rewritten because it was published or deleted meanwhile
    async fn store(&self, card: &ReportCard, is_new: bool) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let written = if is_new {
            db::insert_report_card(&mut tx, card).await?;
            true
        } else {
            db::update_report_card(&mut tx, card).await?
        };
        if written {
            tx.commit().await?;
        }
        Ok(written)
    }

    /// Error for a rewrite that matched no row
    async fn lost_update(&self, scope: &TenantScope, id: Uuid) -> Result<Error> {
        match db::get_report_card(&self.db, scope, id).await? {
            Some(current) if current.is_published() => {
                warn!(report_card_id = %id, "report card published during regeneration");
                self.upload_pdf(scope, &current).await;
                Ok(Error::AlreadyPublished)
            }
            _ => Ok(Error::NotFound(format!("report card {}", id))),
        }
    }

    async fn render(&self, scope: &TenantScope, card: &ReportCard) -> Result<Vec<u8>> {
        let student = academic::student_name(&self.db, scope, card.student_id).await?;
        let class = academic::class_name(&self.db, scope, card.class_id).await?;
        let semester = academic::semester_name(&self.db, scope, card.semester_id).await?;
        let config = templates::get_default(&self.db, scope)
            .await?
            .map(|t| t.config)
            .unwrap_or_default();
        Ok(render_report_card(
            card,
            CardHeader {
                student_name: student.as_deref().unwrap_or("-"),
                class_name: class.as_deref().unwrap_or("-"),
                semester_name: semester.as_deref().unwrap_or("-"),
                header_text: &config.header_text,
                footer_text: &config.footer_text,
            },
        ))
    }

    async fn discard_pdf(&self, scope: &TenantScope, id: Uuid) {
        let path = report_card_path(scope.tenant(), id);
        if let Err(e) = self.storage.remove(&path).await {
            warn!(report_card_id = %id, error = %e, "orphaned report card file not removed");
        }
    }

    /// Render and upload; failures leave the URL empty for the next regeneration
    async fn upload_pdf(&self, scope: &TenantScope, card: &ReportCard) -> String {
        let bytes = match self.render(scope, card).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(report_card_id = %card.id, error = %e, "report card render failed");
                return String::new();
            }
        };
        let path = report_card_path(scope.tenant(), card.id);
        match self.storage.upload(&path, bytes).await {
            Ok(url) => url,
            Err(e) => {
                warn!(report_card_id = %card.id, error = %e, "report card upload failed");
                String::new()
            }
        }
    }
}
