//! Subject assignment per class

use crate::db::{class_subjects as db, classes};
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{ClassSubject, RecordMeta};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignSubjectInput {
    pub subject_id: Uuid,
    #[serde(default)]
    pub teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignTeacherInput {
    pub teacher_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ClassSubjectService {
    db: SqlitePool,
}

impl ClassSubjectService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Attach a subject to a class; a live duplicate is a conflict
    pub async fn assign(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        class_id: Uuid,
        input: AssignSubjectInput,
    ) -> Result<ClassSubject> {
        let scope = TenantScope::new(tenant);
        if classes::get_class(&self.db, &scope, class_id).await?.is_none() {
            return Err(Error::NotFound(format!("class {}", class_id)));
        }

        let assignment = ClassSubject {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            class_id,
            subject_id: input.subject_id,
            teacher_id: input.teacher_id,
            meta: RecordMeta::new(actor),
        };
        assignment.validate()?;

        db::insert_class_subject(&self.db, &assignment).await?;
        info!(tenant = %tenant, class_id = %class_id, subject_id = %input.subject_id, "subject assigned to class");
        Ok(assignment)
    }

    pub async fn assign_teacher(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        class_id: Uuid,
        subject_id: Uuid,
        teacher_id: Option<Uuid>,
    ) -> Result<ClassSubject> {
        let mut assignment = self.load(tenant, class_id, subject_id).await?;
        assignment.teacher_id = teacher_id;
        assignment.meta.touch(actor);

        db::set_teacher(&self.db, &assignment).await?;
        info!(tenant = %tenant, class_id = %class_id, subject_id = %subject_id, "class subject teacher set");
        Ok(assignment)
    }

    pub async fn list(&self, tenant: &TenantId, class_id: Uuid) -> Result<Vec<ClassSubject>> {
        db::list_by_class(&self.db, &TenantScope::new(tenant), class_id).await
    }

    pub async fn remove(&self, tenant: &TenantId, class_id: Uuid, subject_id: Uuid) -> Result<()> {
        let assignment = self.load(tenant, class_id, subject_id).await?;
        db::delete_class_subject(&self.db, &TenantScope::new(tenant), assignment.id).await?;
        info!(tenant = %tenant, class_id = %class_id, subject_id = %subject_id, "subject removed from class");
        Ok(())
    }

    async fn load(&self, tenant: &TenantId, class_id: Uuid, subject_id: Uuid) -> Result<ClassSubject> {
        db::find(&self.db, &TenantScope::new(tenant), class_id, subject_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("subject {} in class {}", subject_id, class_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;
    use sisfo_common::models::Class;

    async fn setup() -> (ClassSubjectService, Uuid) {
        let pool = init_memory_database().await.unwrap();
        let class = Class {
            id: Uuid::new_v4(),
            tenant_id: "t1".into(),
            school_id: None,
            academic_year_id: None,
            name: "XI IPS 2".into(),
            level: 11,
            major: "IPS".into(),
            homeroom_teacher_id: None,
            capacity: 30,
            meta: RecordMeta::default(),
        };
        classes::insert_class(&pool, &class).await.unwrap();
        (ClassSubjectService::new(pool), class.id)
    }

    #[tokio::test]
    async fn test_duplicate_assignment_conflicts() {
        let (svc, class_id) = setup().await;
        let tenant = TenantId::new("t1");
        let subject_id = Uuid::new_v4();
        let input = AssignSubjectInput { subject_id, teacher_id: None };

        svc.assign(&tenant, None, class_id, input.clone()).await.unwrap();
        let err = svc.assign(&tenant, None, class_id, input.clone()).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        svc.remove(&tenant, class_id, subject_id).await.unwrap();
        svc.assign(&tenant, None, class_id, input).await.unwrap();
        assert_eq!(svc.list(&tenant, class_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_teacher() {
        let (svc, class_id) = setup().await;
        let tenant = TenantId::new("t1");
        let subject_id = Uuid::new_v4();
        let teacher_id = Uuid::new_v4();
        svc.assign(&tenant, None, class_id, AssignSubjectInput { subject_id, teacher_id: None })
            .await
            .unwrap();

        svc.assign_teacher(&tenant, None, class_id, subject_id, Some(teacher_id)).await.unwrap();
        let listed = svc.list(&tenant, class_id).await.unwrap();
        assert_eq!(listed[0].teacher_id, Some(teacher_id));
    }
}
