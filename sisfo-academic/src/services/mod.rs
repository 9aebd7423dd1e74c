//! Academic engines
//!
//! Each service holds the pool and enforces invariants before calling the
//! persistence gateway. Errors are returned typed; status codes are chosen
//! by the HTTP layer.

pub mod class_subjects;
pub mod curricula;
pub mod enrollments;
pub mod reference;
pub mod schedule_engine;
pub mod schedule_templates;
pub mod semesters;
pub mod students;

pub use class_subjects::ClassSubjectService;
pub use curricula::CurriculumService;
pub use enrollments::EnrollmentService;
pub use reference::ReferenceService;
pub use schedule_engine::ScheduleService;
pub use schedule_templates::ScheduleTemplateService;
pub use semesters::SemesterService;
pub use students::StudentService;
