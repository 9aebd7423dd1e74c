//! Reference data used by the engines: academic years, subjects, teachers
//! and classes

use crate::db::{academic_years, classes, subjects, teachers};
use chrono::NaiveDate;
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{AcademicYear, Class, RecordMeta, Subject, Teacher};
use sisfo_common::{Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AcademicYearInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credit_units: i64,
    #[serde(default, rename = "type")]
    pub subject_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherInput {
    #[serde(default)]
    pub nip: String,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassInput {
    #[serde(default)]
    pub school_id: Option<Uuid>,
    #[serde(default)]
    pub academic_year_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub homeroom_teacher_id: Option<Uuid>,
    pub capacity: i64,
}

#[derive(Clone)]
pub struct ReferenceService {
    db: SqlitePool,
}

impl ReferenceService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_academic_year(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        input: AcademicYearInput,
    ) -> Result<AcademicYear> {
        let year = AcademicYear {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            name: input.name.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: input.is_active,
            meta: RecordMeta::new(actor),
        };
        year.validate()?;
        academic_years::insert_academic_year(&self.db, &year).await?;
        info!(tenant = %tenant, academic_year_id = %year.id, "academic year created");
        Ok(year)
    }

    pub async fn get_academic_year(&self, tenant: &TenantId, id: Uuid) -> Result<Option<AcademicYear>> {
        academic_years::get_academic_year(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_academic_years(&self, tenant: &TenantId) -> Result<Vec<AcademicYear>> {
        academic_years::list_academic_years(&self.db, &TenantScope::new(tenant)).await
    }

    pub async fn create_subject(&self, tenant: &TenantId, actor: Option<Uuid>, input: SubjectInput) -> Result<Subject> {
        let subject = Subject {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            credit_units: input.credit_units,
            subject_type: input.subject_type,
            meta: RecordMeta::new(actor),
        };
        subject.validate()?;
        subjects::insert_subject(&self.db, &subject).await?;
        info!(tenant = %tenant, subject_id = %subject.id, code = %subject.code, "subject created");
        Ok(subject)
    }

    pub async fn get_subject(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Subject>> {
        subjects::get_subject(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_subjects(&self, tenant: &TenantId) -> Result<Vec<Subject>> {
        subjects::list_subjects(&self.db, &TenantScope::new(tenant)).await
    }

    pub async fn create_teacher(&self, tenant: &TenantId, actor: Option<Uuid>, input: TeacherInput) -> Result<Teacher> {
        let mut teacher = Teacher {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            nip: input.nip,
            name: input.name.trim().to_string(),
            gender: input.gender,
            phone: input.phone,
            email: input.email,
            status: input.status,
            meta: RecordMeta::new(actor),
        };
        teacher.validate()?;
        teachers::insert_teacher(&self.db, &teacher).await?;
        info!(tenant = %tenant, teacher_id = %teacher.id, "teacher created");
        Ok(teacher)
    }

    pub async fn get_teacher(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Teacher>> {
        teachers::get_teacher(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_teachers(&self, tenant: &TenantId) -> Result<Vec<Teacher>> {
        teachers::list_teachers(&self.db, &TenantScope::new(tenant)).await
    }

    pub async fn create_class(&self, tenant: &TenantId, actor: Option<Uuid>, input: ClassInput) -> Result<Class> {
        let class = Class {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            school_id: input.school_id,
            academic_year_id: input.academic_year_id,
            name: input.name.trim().to_string(),
            level: input.level,
            major: input.major,
            homeroom_teacher_id: input.homeroom_teacher_id,
            capacity: input.capacity,
            meta: RecordMeta::new(actor),
        };
        class.validate()?;
        classes::insert_class(&self.db, &class).await?;
        info!(tenant = %tenant, class_id = %class.id, capacity = class.capacity, "class created");
        Ok(class)
    }

    pub async fn get_class(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Class>> {
        classes::get_class(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_classes(&self, tenant: &TenantId) -> Result<Vec<Class>> {
        classes::list_classes(&self.db, &TenantScope::new(tenant)).await
    }
}
