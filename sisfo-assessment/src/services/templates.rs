//! Report card templates
//!
//! The tenant's first template becomes its default. Marking another
//! template default moves the flag in one transaction.

use serde::Deserialize;
use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::models::{RecordMeta, ReportCardTemplate, TemplateConfig};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::templates as db;

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub config: TemplateConfig,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Clone)]
pub struct TemplateService {
    db: SqlitePool,
}

impl TemplateService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: TemplateInput) -> Result<ReportCardTemplate> {
        let scope = TenantScope::new(tenant);
        let mut template = ReportCardTemplate {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            config: input.config,
            is_default: input.is_default,
            meta: RecordMeta::new(actor),
        };
        template.validate()?;

        let mut tx = self.db.begin().await?;
        if db::count_templates(&mut *tx, &scope).await? == 0 {
            template.is_default = true;
        }
        if template.is_default {
            db::clear_default(&mut *tx, tenant.as_str(), template.id).await?;
        }
        db::insert_template(&mut *tx, &template).await?;
        tx.commit().await?;

        info!(
            tenant = %tenant,
            template_id = %template.id,
            is_default = template.is_default,
            "report card template created"
        );
        Ok(template)
    }

    /// Replace name, config and default flag
    pub async fn update(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        input: TemplateInput,
    ) -> Result<ReportCardTemplate> {
        let mut template = db::get_template(&self.db, &TenantScope::new(tenant), id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("template {}", id)))?;
        template.name = input.name.trim().to_string();
        template.config = input.config;
        template.is_default = input.is_default;
        template.meta.touch(actor);
        template.validate()?;

        let mut tx = self.db.begin().await?;
        if template.is_default {
            db::clear_default(&mut *tx, tenant.as_str(), id).await?;
        }
        if !db::update_template(&mut *tx, &template).await? {
            return Err(Error::NotFound(format!("template {}", id)));
        }
        tx.commit().await?;

        info!(tenant = %tenant, template_id = %id, "report card template updated");
        Ok(template)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<ReportCardTemplate>> {
        db::get_template(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<ReportCardTemplate>> {
        db::list_templates(&self.db, &TenantScope::new(tenant)).await
    }

    /// Deleting the default leaves the tenant without one
    pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !soft_delete(&self.db, db::TABLE, tenant.as_str(), id).await? {
            return Err(Error::NotFound(format!("template {}", id)));
        }
        info!(tenant = %tenant, template_id = %id, "report card template deleted");
        Ok(())
    }
}
