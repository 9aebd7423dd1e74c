//! Schedule template maintenance
//!
//! Items are owned by their template and are only reachable through it.

use crate::db::schedule_templates as db;
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{RecordMeta, ScheduleTemplate, ScheduleTemplateItem};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<TemplateItemInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateItemInput {
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
}

impl TemplateItemInput {
    fn into_item(self, tenant: &TenantId, actor: Option<Uuid>, template_id: Uuid) -> Result<ScheduleTemplateItem> {
        let mut item = ScheduleTemplateItem {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            template_id,
            subject_id: self.subject_id,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            meta: RecordMeta::new(actor),
        };
        item.validate()?;
        Ok(item)
    }
}

#[derive(Clone)]
pub struct ScheduleTemplateService {
    db: SqlitePool,
}

impl ScheduleTemplateService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: TemplateInput) -> Result<ScheduleTemplate> {
        let id = Uuid::new_v4();
        let items = input
            .items
            .into_iter()
            .map(|item| item.into_item(tenant, actor, id))
            .collect::<Result<Vec<_>>>()?;

        let template = ScheduleTemplate {
            id,
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            is_active: input.is_active,
            items,
            meta: RecordMeta::new(actor),
        };
        template.validate()?;

        db::insert_template_with_items(&self.db, &template).await?;
        info!(tenant = %tenant, template_id = %id, items = template.items.len(), "schedule template created");
        Ok(template)
    }

    /// Template with its items
    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<ScheduleTemplate>> {
        let scope = TenantScope::new(tenant);
        let Some(mut template) = db::get_template(&self.db, &scope, id).await? else {
            return Ok(None);
        };
        template.items = db::list_items(&self.db, &scope, id).await?;
        Ok(Some(template))
    }

    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<ScheduleTemplate>> {
        db::list_templates(&self.db, &TenantScope::new(tenant)).await
    }

    /// Update the header; items are managed with `add_item` and `remove_item`
    pub async fn update(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        input: TemplateInput,
    ) -> Result<ScheduleTemplate> {
        let mut template = self
            .get(tenant, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("schedule template {}", id)))?;
        template.name = input.name.trim().to_string();
        template.description = input.description;
        template.is_active = input.is_active;
        template.meta.touch(actor);
        template.validate()?;

        db::update_template(&self.db, &template).await?;
        info!(tenant = %tenant, template_id = %id, "schedule template updated");
        Ok(template)
    }

    pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !db::delete_template(&self.db, &TenantScope::new(tenant), id).await? {
            return Err(Error::NotFound(format!("schedule template {}", id)));
        }
        info!(tenant = %tenant, template_id = %id, "schedule template deleted");
        Ok(())
    }

    pub async fn add_item(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        template_id: Uuid,
        input: TemplateItemInput,
    ) -> Result<ScheduleTemplateItem> {
        let scope = TenantScope::new(tenant);
        if db::get_template(&self.db, &scope, template_id).await?.is_none() {
            return Err(Error::NotFound(format!("schedule template {}", template_id)));
        }

        let item = input.into_item(tenant, actor, template_id)?;
        db::insert_item(&self.db, &item).await?;
        info!(tenant = %tenant, template_id = %template_id, item_id = %item.id, "template item added");
        Ok(item)
    }

    pub async fn remove_item(&self, tenant: &TenantId, item_id: Uuid) -> Result<()> {
        if !db::delete_item(&self.db, &TenantScope::new(tenant), item_id).await? {
            return Err(Error::NotFound(format!("template item {}", item_id)));
        }
        Ok(())
    }
}
