//! HTTP API handlers for sisfo-academic
//!
//! Handlers parse identifiers, call one engine under the request deadline
//! and wrap the result in the success envelope.

pub mod classes;
pub mod curricula;
pub mod enrollments;
pub mod reference;
pub mod schedule_templates;
pub mod schedules;
pub mod semesters;
pub mod students;

pub use classes::class_routes;
pub use curricula::curriculum_routes;
pub use enrollments::enrollment_routes;
pub use reference::reference_routes;
pub use schedule_templates::template_routes;
pub use schedules::schedule_routes;
pub use semesters::semester_routes;
pub use students::student_routes;
