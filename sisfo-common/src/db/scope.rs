//! Tenant-scoped query building
//!
//! All tenant-scoped reads start here so that the tenant filter and the
//! soft-delete filter are emitted before any caller predicate.

use crate::{Result, TenantId};
use sqlx::{Executor, QueryBuilder, Sqlite};
use uuid::Uuid;

/// Query builder factory bound to one tenant
#[derive(Debug, Clone)]
pub struct TenantScope {
    tenant: String,
}

impl TenantScope {
    pub fn new(tenant: &TenantId) -> Self {
        Self {
            tenant: tenant.as_str().to_string(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// `SELECT * FROM <table> WHERE tenant_id = ? AND deleted_at IS NULL`
    ///
    /// `table` is always a compile-time table name, never user input.
    pub fn select(&self, table: &str) -> QueryBuilder<'static, Sqlite> {
        self.select_columns(table, "*")
    }

    /// Like [`select`](Self::select) with an explicit column list
    pub fn select_columns(&self, table: &str, columns: &str) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM {} WHERE tenant_id = ", columns, table));
        builder.push_bind(self.tenant.clone());
        builder.push(" AND deleted_at IS NULL");
        builder
    }

    /// `SELECT COUNT(*) ...` with the same scoping
    pub fn count(&self, table: &str) -> QueryBuilder<'static, Sqlite> {
        self.select_columns(table, "COUNT(*)")
    }

    /// Scoped single-row lookup by id
    pub fn by_id(&self, table: &str, id: Uuid) -> QueryBuilder<'static, Sqlite> {
        let mut builder = self.select(table);
        builder.push(" AND id = ").push_bind(id.to_string());
        builder
    }
}

/// Set `deleted_at` on a live row; returns false when nothing matched
pub async fn soft_delete<'e, E>(executor: E, table: &str, tenant: &str, id: Uuid) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = crate::time::now();
    let sql = format!(
        "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL",
        table
    );
    let result = sqlx::query(&sql)
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .bind(tenant)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
