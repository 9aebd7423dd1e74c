//! Enrollment engine
//!
//! The active, non-deleted enrollments of a class never exceed its capacity.
//! The count and the insert happen inside one transaction.

use crate::db::{classes, enrollments as db};
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{Enrollment, EnrollmentStatus, RecordMeta};
use sisfo_common::{Error, Result, TenantId};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollInput {
    pub class_id: Uuid,
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkEnrollInput {
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusInput {
    pub status: EnrollmentStatus,
}

#[derive(Clone)]
pub struct EnrollmentService {
    db: SqlitePool,
}

impl EnrollmentService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn enroll(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        class_id: Uuid,
        student_id: Uuid,
    ) -> Result<Enrollment> {
        let mut enrollment = Enrollment::new(tenant.as_str(), class_id, student_id);
        enrollment.meta = RecordMeta::new(actor);
        enrollment.validate()?;

        let scope = TenantScope::new(tenant);
        let mut tx = self.db.begin().await?;
        ensure_seats(&mut tx, &scope, class_id, 1).await?;
        db::insert_enrollment(&mut *tx, &enrollment).await?;
        tx.commit().await?;

        info!(tenant = %tenant, class_id = %class_id, student_id = %student_id, "student enrolled");
        Ok(enrollment)
    }

    /// Enroll many students at once; all or nothing
    pub async fn bulk_enroll(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        class_id: Uuid,
        student_ids: Vec<Uuid>,
    ) -> Result<Vec<Enrollment>> {
        if student_ids.is_empty() {
            return Err(Error::invalid_field("student_ids", "At least one student is required"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = student_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(Error::InvalidInput(format!("student {} listed more than once", dup)));
        }

        let enrollments = student_ids
            .into_iter()
            .map(|student_id| {
                let mut e = Enrollment::new(tenant.as_str(), class_id, student_id);
                e.meta = RecordMeta::new(actor);
                e.validate().map(|_| e)
            })
            .collect::<Result<Vec<_>>>()?;

        let scope = TenantScope::new(tenant);
        let mut tx = self.db.begin().await?;
        ensure_seats(&mut tx, &scope, class_id, enrollments.len() as i64).await?;
        for enrollment in &enrollments {
            db::insert_enrollment(&mut *tx, enrollment).await?;
        }
        tx.commit().await?;

        info!(tenant = %tenant, class_id = %class_id, count = enrollments.len(), "students enrolled");
        Ok(enrollments)
    }

    /// Change status; re-activation needs a free seat
    pub async fn update_status(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Enrollment> {
        let scope = TenantScope::new(tenant);
        let mut tx = self.db.begin().await?;
        let mut enrollment = db::get_enrollment(&mut *tx, &scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("enrollment {}", id)))?;

        if status == EnrollmentStatus::Active && enrollment.status != EnrollmentStatus::Active {
            ensure_seats(&mut tx, &scope, enrollment.class_id, 1).await?;
        }

        enrollment.status = status;
        enrollment.meta.touch(actor);
        db::update_status(&mut *tx, &enrollment).await?;
        tx.commit().await?;

        info!(tenant = %tenant, enrollment_id = %id, status = %status, "enrollment status changed");
        Ok(enrollment)
    }

    pub async fn unenroll(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !db::delete_enrollment(&self.db, &TenantScope::new(tenant), id).await? {
            return Err(Error::NotFound(format!("enrollment {}", id)));
        }
        info!(tenant = %tenant, enrollment_id = %id, "enrollment removed");
        Ok(())
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Enrollment>> {
        db::get_enrollment(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list_by_class(&self, tenant: &TenantId, class_id: Uuid) -> Result<Vec<Enrollment>> {
        db::list_by_class(&self.db, &TenantScope::new(tenant), class_id).await
    }

    pub async fn list_by_student(&self, tenant: &TenantId, student_id: Uuid) -> Result<Vec<Enrollment>> {
        db::list_by_student(&self.db, &TenantScope::new(tenant), student_id).await
    }
}

async fn ensure_seats(
    tx: &mut Transaction<'_, Sqlite>,
    scope: &TenantScope,
    class_id: Uuid,
    wanted: i64,
) -> Result<()> {
    let class = classes::get_class(&mut **tx, scope, class_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("class {}", class_id)))?;
    let active = db::count_active(&mut **tx, scope, class_id).await?;

    if active + wanted > class.capacity {
        debug!(class_id = %class_id, active, wanted, capacity = class.capacity, "class full");
        return Err(Error::Conflict(format!(
            "class {} is at capacity ({} of {} seats taken)",
            class_id, active, class.capacity
        )));
    }
    Ok(())
}
