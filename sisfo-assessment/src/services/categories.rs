//! Grade categories

use serde::Deserialize;
use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::models::{GradeCategory, RecordMeta};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::grade_categories as db;

#[derive(Debug, Clone, Deserialize)]
pub struct GradeCategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
}

#[derive(Clone)]
pub struct GradeCategoryService {
    db: SqlitePool,
}

impl GradeCategoryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        input: GradeCategoryInput,
    ) -> Result<GradeCategory> {
        let category = GradeCategory {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            weight: input.weight,
            meta: RecordMeta::new(actor),
        };
        category.validate()?;

        db::insert_category(&self.db, &category).await?;
        info!(tenant = %tenant, category_id = %category.id, weight = category.weight, "grade category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        input: GradeCategoryInput,
    ) -> Result<GradeCategory> {
        let mut category = db::get_category(&self.db, &TenantScope::new(tenant), id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("grade category {}", id)))?;
        category.name = input.name.trim().to_string();
        category.description = input.description;
        category.weight = input.weight;
        category.meta.touch(actor);
        category.validate()?;

        if !db::update_category(&self.db, &category).await? {
            return Err(Error::NotFound(format!("grade category {}", id)));
        }
        info!(tenant = %tenant, category_id = %id, "grade category updated");
        Ok(category)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<GradeCategory>> {
        db::get_category(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<GradeCategory>> {
        db::list_categories(&self.db, &TenantScope::new(tenant)).await
    }

    pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !soft_delete(&self.db, db::TABLE, tenant.as_str(), id).await? {
            return Err(Error::NotFound(format!("grade category {}", id)));
        }
        info!(tenant = %tenant, category_id = %id, "grade category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;

    async fn service() -> GradeCategoryService {
        GradeCategoryService::new(init_memory_database().await.unwrap())
    }

    fn input(name: &str, weight: f64) -> GradeCategoryInput {
        GradeCategoryInput {
            name: name.into(),
            description: String::new(),
            weight,
        }
    }

    #[tokio::test]
    async fn test_weight_must_be_positive() {
        let svc = service().await;
        let tenant = TenantId::new("t1");
        match svc.create(&tenant, None, input("Tugas", 0.0)).await {
            Err(Error::Validation(e)) => assert!(e.contains("weight")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let svc = service().await;
        let tenant = TenantId::new("t1");
        let created = svc.create(&tenant, None, input("Ulangan", 1.0)).await.unwrap();

        let updated = svc.update(&tenant, None, created.id, input("Ulangan Harian", 2.5)).await.unwrap();
        assert_eq!(updated.weight, 2.5);
        assert_eq!(svc.get(&tenant, created.id).await.unwrap().unwrap().name, "Ulangan Harian");

        svc.delete(&tenant, created.id).await.unwrap();
        assert!(svc.get(&tenant, created.id).await.unwrap().is_none());
        assert!(matches!(svc.delete(&tenant, created.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let svc = service().await;
        svc.create(&TenantId::new("t1"), None, input("UTS", 2.0)).await.unwrap();
        assert!(svc.list(&TenantId::new("t2")).await.unwrap().is_empty());
    }
}
