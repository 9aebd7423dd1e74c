//! Subjects, people, classes and their links

use super::{require_id, require_text, RecordMeta};
use crate::{Error, FieldErrors, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credit_units: i64,
    #[serde(default, rename = "type")]
    pub subject_type: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Subject {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "code", "Code", &self.code);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.credit_units < 0 {
            errors.add("credit_units", "Credit units cannot be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub tenant_id: String,
    #[serde(default)]
    pub nip: String,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub status: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Teacher {
    pub fn validate(&mut self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.status.trim().is_empty() {
            self.status = "active".to_string();
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub tenant_id: String,
    /// Registration number assigned at admission
    pub nis: String,
    #[serde(default)]
    pub nisn: String,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    pub status: String,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Student {
    /// Validate, defaulting an empty status to `active`
    pub fn validate(&mut self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.status.trim().is_empty() {
            self.status = "active".to_string();
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub tenant_id: String,
    #[serde(default)]
    pub school_id: Option<Uuid>,
    #[serde(default)]
    pub academic_year_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub homeroom_teacher_id: Option<Uuid>,
    pub capacity: i64,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Class {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        if self.capacity < 0 {
            errors.add("capacity", "Capacity cannot be negative");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSubject {
    pub id: Uuid,
    pub tenant_id: String,
    pub class_id: Uuid,
    pub subject_id: Uuid,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl ClassSubject {
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "class_id", "Class ID", self.class_id);
        require_id(&mut errors, "subject_id", "Subject ID", self.subject_id);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        errors.into_result()
    }
}

/// Membership state of a student in a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Dropped,
    Moved,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Moved => "moved",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "dropped" => Ok(EnrollmentStatus::Dropped),
            "moved" => Ok(EnrollmentStatus::Moved),
            other => Err(Error::InvalidInput(format!("unknown enrollment status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub tenant_id: String,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub status: EnrollmentStatus,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Enrollment {
    pub fn new(tenant_id: &str, class_id: Uuid, student_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            class_id,
            student_id,
            status: EnrollmentStatus::Active,
            meta: RecordMeta::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::default();
        require_id(&mut errors, "class_id", "Class ID", self.class_id);
        require_id(&mut errors, "student_id", "Student ID", self.student_id);
        require_text(&mut errors, "tenant_id", "Tenant ID", &self.tenant_id);
        errors.into_result()
    }
}
