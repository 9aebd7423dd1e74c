//! Persistence gateway for the assessment service
//!
//! Same conventions as the academic gateway: free functions, tenant-scoped
//! reads through `TenantScope`, `Ok(None)` for absent rows.

pub mod academic;
pub mod assessments;
pub mod grade_categories;
pub mod grades;
pub mod report_cards;
pub mod templates;
