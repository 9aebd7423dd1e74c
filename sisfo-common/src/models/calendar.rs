//! Academic calendar entities

use super::{require_id, require_text, RecordMeta};
use crate::{FieldErrors, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYear {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl AcademicYear {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.start_date >= self.end_date {
            errors.add("date_range", "Start date must be before end date");
        }
        errors.into_result()
    }
}

/// Odd (first) or even (second) half of an academic year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemesterType {
    Odd,
    Even,
}

impl SemesterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemesterType::Odd => "ODD",
            SemesterType::Even => "EVEN",
        }
    }
}

impl fmt::Display for SemesterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemesterType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ODD" => Ok(SemesterType::Odd),
            "EVEN" => Ok(SemesterType::Even),
            other => Err(crate::Error::InvalidInput(format!("unknown semester type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    pub id: Uuid,
    pub tenant_id: String,
    pub academic_year_id: Uuid,
    /// Curriculum whose grading rules map final scores to letters
    #[serde(default)]
    pub curriculum_id: Option<Uuid>,
    pub name: String,
    pub semester_type: SemesterType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Semester {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        require_id(&mut errors, "academic_year_id", "Academic Year ID", self.academic_year_id);
        require_text(&mut errors, "name", "Name", &self.name);
        if self.start_date >= self.end_date {
            errors.add("date_range", "Start date must be before end date");
        }
        errors.into_result()
    }
}
