//! Common error types for SISFO services

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Common result type for SISFO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SISFO microservices
///
/// Engines return these untouched; only the HTTP layer decides on a status code.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity failed validation; keyed by field name
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Candidate slot overlaps persisted slots sharing class, teacher or room
    #[error("schedule conflict detected: overlapping with existing schedule")]
    ScheduleConflict { conflicts: Vec<Uuid> },

    /// Uniqueness or capacity rule violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Report card is published and can no longer be regenerated
    #[error("report card already published")]
    AlreadyPublished,

    /// Status change not allowed by the lifecycle
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Schedule template has no items to materialise
    #[error("schedule template has no items")]
    TemplateEmpty,

    /// Template materialisation found no teacher for a subject
    #[error("no teacher assigned for subject {0}")]
    MissingTeacherForSubject(Uuid),

    /// Engine call exceeded its deadline
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Object storage collaborator failed
    #[error("File storage error: {0}")]
    FileStorage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            Error::Conflict(_) => "CONFLICT",
            Error::AlreadyPublished => "ALREADY_PUBLISHED",
            Error::InvalidTransition(_) => "INVALID_TRANSITION",
            Error::TemplateEmpty => "TEMPLATE_EMPTY",
            Error::MissingTeacherForSubject(_) => "MISSING_TEACHER_FOR_SUBJECT",
            Error::Timeout(_) => "TIMEOUT",
            Error::FileStorage(_) => "FILE_STORAGE_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        Error::Validation(errors)
    }
}

/// Field-keyed validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record a message for a field; the first message per field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Ok when nothing was recorded, otherwise `Error::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Translate database constraint failures into domain errors
///
/// The schedule triggers abort with `schedule conflict`; partial unique
/// indexes surface as unique violations.
pub fn map_constraint(err: sqlx::Error, what: &str) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.message().contains("schedule conflict") {
            return Error::ScheduleConflict { conflicts: Vec::new() };
        }
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("{} already exists", what));
        }
    }
    Error::Database(err)
}
