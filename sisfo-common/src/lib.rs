//! # SISFO Common Library
//!
//! Shared code for the SISFO academic microservices including:
//! - Entity types and validation (`models`)
//! - Database bootstrap, schema and tenant-scoped query building (`db`)
//! - JSON envelope, extractors and error mapping for HTTP handlers (`api`)
//! - Configuration loading and tracing setup
//! - Deadline and pagination helpers

pub mod api;
pub mod config;
pub mod db;
pub mod deadline;
pub mod error;
pub mod models;
pub mod pagination;
pub mod tenant;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, FieldErrors, Result};
pub use tenant::TenantId;
