//! Entity types shared by every SISFO service
//!
//! Each entity carries its identifier, tenant and a flattened [`RecordMeta`]
//! block. Validation returns field-keyed messages through
//! [`crate::Error::Validation`].

use crate::uuid_utils::get_opt_uuid;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

mod calendar;
mod curriculum;
mod grading;
mod report_card;
mod roster;
mod schedule;

pub use calendar::{AcademicYear, Semester, SemesterType};
pub use curriculum::{Curriculum, CurriculumSubject, GradingRule};
pub use grading::{Assessment, Grade, GradeCategory, GradeStatus};
pub use report_card::{
    AttendanceSummary, ReportCard, ReportCardDetail, ReportCardStatus, ReportCardTemplate, TemplateConfig,
};
pub use roster::{Class, ClassSubject, Enrollment, EnrollmentStatus, Student, Subject, Teacher};
pub use schedule::{Schedule, ScheduleTemplate, ScheduleTemplateItem};

/// Audit and soft-delete columns present on every entity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub updated_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
    /// Fresh metadata for a record created now
    pub fn new(actor: Option<Uuid>) -> Self {
        let now = crate::time::now();
        Self {
            created_at: now,
            updated_at: now,
            created_by: actor,
            updated_by: actor,
            deleted_at: None,
        }
    }

    /// Refresh the update timestamp
    pub fn touch(&mut self, actor: Option<Uuid>) {
        self.updated_at = crate::time::now();
        if actor.is_some() {
            self.updated_by = actor;
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Read the audit columns from a row selected with `*`
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            created_by: get_opt_uuid(row, "created_by")?,
            updated_by: get_opt_uuid(row, "updated_by")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Record a "required" message when a reference is the nil UUID
pub(crate) fn require_id(errors: &mut crate::FieldErrors, field: &str, label: &str, id: Uuid) {
    if id.is_nil() {
        errors.add(field, format!("{} is required", label));
    }
}

/// Record a "required" message when text is blank
pub(crate) fn require_text(errors: &mut crate::FieldErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
    }
}
