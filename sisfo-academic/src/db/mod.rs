//! Persistence gateway for the academic service
//!
//! Free functions over a pool or an open transaction. Single-row reads
//! return `Ok(None)` when the row is absent or soft-deleted.

pub mod academic_years;
pub mod class_subjects;
pub mod classes;
pub mod curricula;
pub mod enrollments;
pub mod schedule_templates;
pub mod schedules;
pub mod semesters;
pub mod students;
pub mod subjects;
pub mod teachers;
