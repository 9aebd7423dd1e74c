//! Report cards

use super::{require_id, require_text, RecordMeta};
use crate::{Error, FieldErrors, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle: draft -> generated -> published
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCardStatus {
    Draft,
    Generated,
    Published,
}

impl ReportCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCardStatus::Draft => "draft",
            ReportCardStatus::Generated => "generated",
            ReportCardStatus::Published => "published",
        }
    }

    /// Transitions only move forward through the lattice
    pub fn can_transition_to(&self, next: ReportCardStatus) -> bool {
        matches!(
            (self, next),
            (ReportCardStatus::Draft, ReportCardStatus::Generated)
                | (ReportCardStatus::Generated, ReportCardStatus::Generated)
                | (ReportCardStatus::Generated, ReportCardStatus::Published)
        )
    }
}

impl fmt::Display for ReportCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportCardStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(ReportCardStatus::Draft),
            "generated" => Ok(ReportCardStatus::Generated),
            "published" => Ok(ReportCardStatus::Published),
            other => Err(Error::InvalidInput(format!("unknown report card status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present: i64,
    pub absent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCard {
    pub id: Uuid,
    pub tenant_id: String,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub semester_id: Uuid,
    pub status: ReportCardStatus,
    pub gpa: f64,
    pub total_credits: i64,
    pub attendance_summary: AttendanceSummary,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub details: Vec<ReportCardDetail>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl ReportCard {
    pub fn new(tenant_id: &str, student_id: Uuid, class_id: Uuid, semester_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            student_id,
            class_id,
            semester_id,
            status: ReportCardStatus::Draft,
            gpa: 0.0,
            total_credits: 0,
            attendance_summary: AttendanceSummary::default(),
            comments: String::new(),
            pdf_url: String::new(),
            generated_at: None,
            published_at: None,
            details: Vec::new(),
            meta: RecordMeta::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "student_id", "Student ID", self.student_id);
        require_id(&mut errors, "class_id", "Class ID", self.class_id);
        require_id(&mut errors, "semester_id", "Semester ID", self.semester_id);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        errors.into_result()
    }

    pub fn is_published(&self) -> bool {
        self.status == ReportCardStatus::Published
    }
}

/// Per-subject line of a report card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCardDetail {
    pub id: Uuid,
    pub report_card_id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub credit: i64,
    pub final_score: f64,
    pub grade_letter: String,
    pub points: f64,
    #[serde(default)]
    pub comments: String,
}

/// Presentation settings printed on a tenant's report cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub header_text: String,
    #[serde(default)]
    pub logo_url: String,
    /// `#RRGGBB`
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
    #[serde(default)]
    pub footer_text: String,
}

/// Named report card layout; at most one per tenant is the default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCardTemplate {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub config: TemplateConfig,
    #[serde(default)]
    pub is_default: bool,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl ReportCardTemplate {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        for (field, value) in [
            ("primary_color", &self.config.primary_color),
            ("secondary_color", &self.config.secondary_color),
        ] {
            if !value.is_empty() && !is_hex_color(value) {
                errors.add(field, "Color must be a hex code like #1A2B3C");
            }
        }
        errors.into_result()
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
