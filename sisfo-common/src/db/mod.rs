//! Database bootstrap and tenant-scoped query building

pub mod init;
pub mod scope;

pub use init::{init_database, init_memory_database};
pub use scope::{soft_delete, TenantScope};
