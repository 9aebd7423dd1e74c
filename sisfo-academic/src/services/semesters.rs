//! Semester lifecycle and activation
//!
//! At most one semester per academic year is active. Activation clears the
//! flag on the siblings and sets it on the target inside one transaction;
//! the partial unique index on `semesters` backs the rule under races.

use crate::db::semesters as db;
use chrono::NaiveDate;
use serde::Deserialize;
use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::models::{RecordMeta, Semester, SemesterType};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct SemesterInput {
    pub academic_year_id: Uuid,
    #[serde(default)]
    pub curriculum_id: Option<Uuid>,
    pub name: String,
    pub semester_type: SemesterType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Clone)]
pub struct SemesterService {
    db: SqlitePool,
}

impl SemesterService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: SemesterInput) -> Result<Semester> {
        let semester = Semester {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            academic_year_id: input.academic_year_id,
            curriculum_id: input.curriculum_id,
            name: input.name.trim().to_string(),
            semester_type: input.semester_type,
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: input.is_active,
            meta: RecordMeta::new(actor),
        };
        semester.validate()?;

        let mut tx = self.db.begin().await?;
        if semester.is_active {
            db::deactivate_others(&mut *tx, tenant.as_str(), semester.academic_year_id, semester.id).await?;
        }
        db::insert_semester(&mut *tx, &semester).await?;
        tx.commit().await?;

        info!(tenant = %tenant, semester_id = %semester.id, active = semester.is_active, "semester created");
        Ok(semester)
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        input: SemesterInput,
    ) -> Result<Semester> {
        let mut semester = self.load(tenant, id).await?;
        semester.academic_year_id = input.academic_year_id;
        semester.curriculum_id = input.curriculum_id;
        semester.name = input.name.trim().to_string();
        semester.semester_type = input.semester_type;
        semester.start_date = input.start_date;
        semester.end_date = input.end_date;
        semester.is_active = input.is_active;
        semester.meta.touch(actor);
        semester.validate()?;

        self.persist(&semester).await?;
        info!(tenant = %tenant, semester_id = %id, active = semester.is_active, "semester updated");
        Ok(semester)
    }

    /// Make this the only active semester of its academic year
    pub async fn set_active(&self, tenant: &TenantId, actor: Option<Uuid>, id: Uuid) -> Result<Semester> {
        let mut semester = self.load(tenant, id).await?;
        semester.is_active = true;
        semester.meta.touch(actor);

        self.persist(&semester).await?;
        info!(tenant = %tenant, semester_id = %id, academic_year_id = %semester.academic_year_id, "semester activated");
        Ok(semester)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Semester>> {
        db::get_semester(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list(&self, tenant: &TenantId, academic_year_id: Option<Uuid>) -> Result<Vec<Semester>> {
        db::list_semesters(&self.db, &TenantScope::new(tenant), academic_year_id).await
    }

    pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !soft_delete(&self.db, "semesters", tenant.as_str(), id).await? {
            return Err(Error::NotFound(format!("semester {}", id)));
        }
        info!(tenant = %tenant, semester_id = %id, "semester deleted");
        Ok(())
    }

    async fn load(&self, tenant: &TenantId, id: Uuid) -> Result<Semester> {
        db::get_semester(&self.db, &TenantScope::new(tenant), id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("semester {}", id)))
    }

    async fn persist(&self, semester: &Semester) -> Result<()> {
        let mut tx = self.db.begin().await?;
        if semester.is_active {
            db::deactivate_others(&mut *tx, &semester.tenant_id, semester.academic_year_id, semester.id).await?;
        }
        if !db::update_semester(&mut *tx, semester).await? {
            return Err(Error::NotFound(format!("semester {}", semester.id)));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;

    fn input(year: Uuid, name: &str, active: bool) -> SemesterInput {
        SemesterInput {
            academic_year_id: year,
            curriculum_id: None,
            name: name.into(),
            semester_type: SemesterType::Odd,
            start_date: NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_create_active_deactivates_sibling() {
        let pool = init_memory_database().await.unwrap();
        let svc = SemesterService::new(pool.clone());
        let tenant = TenantId::new("t1");
        let year = Uuid::new_v4();

        let first = svc.create(&tenant, None, input(year, "Ganjil", true)).await.unwrap();
        let second = svc.create(&tenant, None, input(year, "Genap", true)).await.unwrap();

        let scope = TenantScope::new(&tenant);
        assert_eq!(db::count_active_in_year(&pool, &scope, year).await.unwrap(), 1);
        assert!(!svc.get(&tenant, first.id).await.unwrap().unwrap().is_active);
        assert!(svc.get(&tenant, second.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_set_active_moves_flag() {
        let pool = init_memory_database().await.unwrap();
        let svc = SemesterService::new(pool.clone());
        let tenant = TenantId::new("t1");
        let year = Uuid::new_v4();

        let first = svc.create(&tenant, None, input(year, "Ganjil", true)).await.unwrap();
        let second = svc.create(&tenant, None, input(year, "Genap", false)).await.unwrap();
        svc.set_active(&tenant, None, second.id).await.unwrap();

        assert!(!svc.get(&tenant, first.id).await.unwrap().unwrap().is_active);
        assert!(svc.get(&tenant, second.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_other_years_untouched() {
        let pool = init_memory_database().await.unwrap();
        let svc = SemesterService::new(pool.clone());
        let tenant = TenantId::new("t1");

        let a = svc.create(&tenant, None, input(Uuid::new_v4(), "Ganjil", true)).await.unwrap();
        svc.create(&tenant, None, input(Uuid::new_v4(), "Ganjil", true)).await.unwrap();
        assert!(svc.get(&tenant, a.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_missing_semester() {
        let pool = init_memory_database().await.unwrap();
        let svc = SemesterService::new(pool);
        let tenant = TenantId::new("t1");
        assert!(matches!(svc.set_active(&tenant, None, Uuid::new_v4()).await, Err(Error::NotFound(_))));
        assert!(matches!(svc.delete(&tenant, Uuid::new_v4()).await, Err(Error::NotFound(_))));
    }
}
