//! Assessment engines
//!
//! Grade categories, assessments and grades feed the weighted scoring that
//! report cards are built from.

pub mod categories;
pub mod grading;
pub mod letter_grade;
pub mod pdf;
pub mod report_cards;
pub mod scoring;
pub mod storage;
pub mod templates;

pub use categories::GradeCategoryService;
pub use grading::GradingService;
pub use report_cards::ReportCardService;
pub use templates::TemplateService;
