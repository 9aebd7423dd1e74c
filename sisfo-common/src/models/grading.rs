//! Grade categories, assessments and grades

use super::{require_id, require_text, RecordMeta};
use crate::{Error, FieldErrors, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Weighted bucket of assessments (e.g. homework, exams)
///
/// Weights are relative: only their ratio matters after normalisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeCategory {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl GradeCategory {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if !(self.weight > 0.0) || !self.weight.is_finite() {
            errors.add("weight", "Weight must be greater than 0");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub tenant_id: String,
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
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Assessment {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        require_id(&mut errors, "grade_category_id", "Grade category ID", self.grade_category_id);
        require_id(&mut errors, "teacher_id", "Teacher ID", self.teacher_id);
        require_id(&mut errors, "subject_id", "Subject ID", self.subject_id);
        require_id(&mut errors, "class_id", "Class ID", self.class_id);
        if !(self.max_score > 0.0) || !self.max_score.is_finite() {
            errors.add("max_score", "Max score must be greater than 0");
        }
        errors.into_result()
    }

    /// Whether this assessment counts towards `semester_id`
    ///
    /// Assessments with no semester binding count for every semester.
    pub fn counts_for(&self, semester_id: Uuid) -> bool {
        self.semester_id.map_or(true, |s| s == semester_id)
    }

    /// Raw score on a 0..100 scale
    pub fn normalize(&self, score: f64) -> f64 {
        score / self.max_score * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    #[serde(alias = "DRAFT")]
    Draft,
    #[serde(alias = "SUBMITTED")]
    Submitted,
    #[serde(alias = "FINAL", alias = "approved", alias = "APPROVED")]
    Final,
}

impl GradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeStatus::Draft => "draft",
            GradeStatus::Submitted => "submitted",
            GradeStatus::Final => "final",
        }
    }
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(GradeStatus::Draft),
            "submitted" => Ok(GradeStatus::Submitted),
            "final" | "approved" => Ok(GradeStatus::Final),
            other => Err(Error::InvalidInput(format!("unknown grade status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: Uuid,
    pub tenant_id: String,
    pub assessment_id: Uuid,
    pub student_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub notes: String,
    pub status: GradeStatus,
    #[serde(default)]
    pub graded_by: Option<Uuid>,
    #[serde(default)]
    pub approved_by: Option<Uuid>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Grade {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "assessment_id", "Assessment ID", self.assessment_id);
        require_id(&mut errors, "student_id", "Student ID", self.student_id);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.score < 0.0 || !self.score.is_finite() {
            errors.add("score", "Score cannot be negative");
        }
        errors.into_result()
    }
}
