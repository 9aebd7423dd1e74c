//! Student records

use crate::db::students as db;
use chrono::NaiveDate;
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{RecordMeta, Student};
use sisfo_common::pagination::{Page, Pagination};
use sisfo_common::{Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentInput {
    #[serde(default)]
    pub nis: String,
    #[serde(default)]
    pub nisn: String,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone)]
pub struct StudentService {
    db: SqlitePool,
}

impl StudentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a student; a live duplicate `nis` is a conflict
    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: StudentInput) -> Result<Student> {
        let mut student = Student {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            nis: input.nis.trim().to_string(),
            nisn: input.nisn,
            name: input.name.trim().to_string(),
            gender: input.gender,
            phone: input.phone,
            email: input.email,
            admission_date: input.admission_date,
            status: input.status,
            meta: RecordMeta::new(actor),
        };
        student.validate()?;

        db::insert_student(&self.db, &student).await?;
        info!(tenant = %tenant, student_id = %student.id, nis = %student.nis, "student created");
        Ok(student)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Student>> {
        db::get_student(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn find_by_nis(&self, tenant: &TenantId, nis: &str) -> Result<Option<Student>> {
        db::find_by_nis(&self.db, &TenantScope::new(tenant), nis).await
    }

    pub async fn list(&self, tenant: &TenantId, page: Pagination) -> Result<Page<Student>> {
        let (items, total) = db::list_students(&self.db, &TenantScope::new(tenant), page).await?;
        Ok(Page::new(items, total, page))
    }
}
