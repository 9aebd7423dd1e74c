//! HTTP API handlers for sisfo-assessment

pub mod assessments;
pub mod categories;
pub mod grades;
pub mod report_cards;
pub mod templates;

pub use assessments::assessment_routes;
pub use categories::category_routes;
pub use grades::grade_routes;
pub use report_cards::report_card_routes;
pub use templates::template_routes;
