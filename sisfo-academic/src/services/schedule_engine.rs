//! Schedule engine
//!
//! Conflict-checked creation and update of weekly slots, transactional
//! bulk creation and materialisation of schedule templates.
//!
//! The conflict probe gives callers a useful error listing the clashing
//! slots. The `schedules` triggers remain the authority under concurrent
//! writes and surface the same `ScheduleConflict` error.

use crate::db::{schedule_templates as template_db, schedules as db};
use serde::Deserialize;
use sisfo_common::db::TenantScope;
use sisfo_common::models::{RecordMeta, Schedule};
use sisfo_common::pagination::{Page, Pagination};
use sisfo_common::{Error, Result, TenantId};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Caller-supplied slot fields
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInput {
    pub class_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Uuid,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub room: String,
}

impl ScheduleInput {
    fn into_schedule(self, tenant: &TenantId, actor: Option<Uuid>) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            tenant_id: tenant.to_string(),
            class_id: self.class_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            day_of_week: self.day_of_week,
            start_time: self.start_time,
            end_time: self.end_time,
            room: self.room,
            meta: RecordMeta::new(actor),
        }
    }
}

/// Subject to teacher mapping for template materialisation
///
/// Accepts either `{"<subject>": "<teacher>"}` or
/// `[{"subject_id": ..., "teacher_id": ...}]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TeacherAssignments {
    Map(HashMap<Uuid, Uuid>),
    List(Vec<TeacherAssignment>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherAssignment {
    pub subject_id: Uuid,
    pub teacher_id: Uuid,
}

impl TeacherAssignments {
    pub fn into_map(self) -> HashMap<Uuid, Uuid> {
        match self {
            TeacherAssignments::Map(map) => map,
            TeacherAssignments::List(list) => list
                .into_iter()
                .map(|a| (a.subject_id, a.teacher_id))
                .collect(),
        }
    }
}

impl Default for TeacherAssignments {
    fn default() -> Self {
        TeacherAssignments::Map(HashMap::new())
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    db: SqlitePool,
}

impl ScheduleService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Validate, probe for conflicts, insert
    pub async fn create(&self, tenant: &TenantId, actor: Option<Uuid>, input: ScheduleInput) -> Result<Schedule> {
        let mut schedule = input.into_schedule(tenant, actor);
        schedule.validate()?;
        self.ensure_no_conflicts(&schedule).await?;

        db::insert_schedule(&self.db, &schedule).await?;
        info!(tenant = %tenant, schedule_id = %schedule.id, class_id = %schedule.class_id, "schedule created");
        Ok(schedule)
    }

    /// Replace the slot fields of an existing schedule
    ///
    /// The slot never conflicts with its own persisted row.
    pub async fn update(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        id: Uuid,
        input: ScheduleInput,
    ) -> Result<Schedule> {
        let scope = TenantScope::new(tenant);
        let mut schedule = db::get_schedule(&self.db, &scope, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("schedule {}", id)))?;

        schedule.class_id = input.class_id;
        schedule.subject_id = input.subject_id;
        schedule.teacher_id = input.teacher_id;
        schedule.day_of_week = input.day_of_week;
        schedule.start_time = input.start_time;
        schedule.end_time = input.end_time;
        schedule.room = input.room;
        schedule.meta.touch(actor);

        schedule.validate()?;
        self.ensure_no_conflicts(&schedule).await?;

        if !db::update_schedule(&self.db, &schedule).await? {
            return Err(Error::NotFound(format!("schedule {}", id)));
        }
        info!(tenant = %tenant, schedule_id = %id, "schedule updated");
        Ok(schedule)
    }

    /// Create many slots atomically
    ///
    /// Every candidate is probed against persisted rows and against the
    /// other members of the batch; nothing is written unless all pass.
    pub async fn bulk_create(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        inputs: Vec<ScheduleInput>,
    ) -> Result<Vec<Schedule>> {
        if inputs.is_empty() {
            return Err(Error::invalid_field("schedules", "At least one schedule is required"));
        }

        let mut schedules = Vec::with_capacity(inputs.len());
        for input in inputs {
            let mut schedule = input.into_schedule(tenant, actor);
            schedule.validate()?;
            schedules.push(schedule);
        }

        self.commit_batch(tenant, schedules).await
    }

    /// Materialise a template into concrete slots for one class
    ///
    /// Items without a subject are placeholders and are skipped.
    pub async fn create_from_template(
        &self,
        tenant: &TenantId,
        actor: Option<Uuid>,
        template_id: Uuid,
        class_id: Uuid,
        assignments: &HashMap<Uuid, Uuid>,
    ) -> Result<Vec<Schedule>> {
        if class_id.is_nil() {
            return Err(Error::invalid_field("class_id", "Class ID is required"));
        }

        let scope = TenantScope::new(tenant);
        let template = template_db::get_template(&self.db, &scope, template_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("schedule template {}", template_id)))?;

        let items = template_db::list_items(&self.db, &scope, template.id).await?;
        if items.is_empty() {
            return Err(Error::TemplateEmpty);
        }

        let mut schedules = Vec::new();
        for item in items {
            let Some(subject_id) = item.subject_id else {
                debug!(item_id = %item.id, "skipping template item without subject");
                continue;
            };
            let teacher_id = *assignments
                .get(&subject_id)
                .ok_or(Error::MissingTeacherForSubject(subject_id))?;

            let mut schedule = Schedule {
                id: Uuid::new_v4(),
                tenant_id: template.tenant_id.clone(),
                class_id,
                subject_id,
                teacher_id,
                day_of_week: item.day_of_week,
                start_time: item.start_time,
                end_time: item.end_time,
                room: String::new(),
                meta: RecordMeta::new(actor),
            };
            schedule.validate()?;
            schedules.push(schedule);
        }

        if schedules.is_empty() {
            info!(tenant = %tenant, template_id = %template_id, "template has only placeholder items");
            return Ok(schedules);
        }

        let created = self.commit_batch(tenant, schedules).await?;
        info!(
            tenant = %tenant,
            template_id = %template_id,
            class_id = %class_id,
            count = created.len(),
            "schedules materialised from template"
        );
        Ok(created)
    }

    pub async fn get(&self, tenant: &TenantId, id: Uuid) -> Result<Option<Schedule>> {
        db::get_schedule(&self.db, &TenantScope::new(tenant), id).await
    }

    pub async fn list(&self, tenant: &TenantId, page: Pagination) -> Result<Page<Schedule>> {
        let (items, total) = db::list_schedules(&self.db, &TenantScope::new(tenant), page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn list_by_class(&self, tenant: &TenantId, class_id: Uuid) -> Result<Vec<Schedule>> {
        db::list_by_class(&self.db, &TenantScope::new(tenant), class_id).await
    }

    pub async fn delete(&self, tenant: &TenantId, id: Uuid) -> Result<()> {
        if !db::delete_schedule(&self.db, &TenantScope::new(tenant), id).await? {
            return Err(Error::NotFound(format!("schedule {}", id)));
        }
        info!(tenant = %tenant, schedule_id = %id, "schedule deleted");
        Ok(())
    }

    async fn ensure_no_conflicts(&self, candidate: &Schedule) -> Result<()> {
        let conflicts = db::find_conflicts(&self.db, candidate).await?;
        if conflicts.is_empty() {
            return Ok(());
        }
        debug!(schedule_id = %candidate.id, conflicts = conflicts.len(), "schedule conflict");
        Err(Error::ScheduleConflict {
            conflicts: conflicts.into_iter().map(|s| s.id).collect(),
        })
    }

    async fn commit_batch(&self, tenant: &TenantId, schedules: Vec<Schedule>) -> Result<Vec<Schedule>> {
        for (index, candidate) in schedules.iter().enumerate() {
            self.ensure_no_conflicts(candidate).await?;

            let clashes: Vec<Uuid> = schedules[..index]
                .iter()
                .filter(|earlier| earlier.conflicts_with(candidate))
                .map(|earlier| earlier.id)
                .collect();
            if !clashes.is_empty() {
                return Err(Error::ScheduleConflict { conflicts: clashes });
            }
        }

        db::insert_schedules_batch(&self.db, &schedules).await?;
        info!(tenant = %tenant, count = schedules.len(), "schedule batch committed");
        Ok(schedules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;
    use sisfo_common::models::{ScheduleTemplate, ScheduleTemplateItem};

    fn tenant() -> TenantId {
        TenantId::new("t1")
    }

    fn input(class_id: Uuid, teacher_id: Uuid, day: i64, start: &str, end: &str) -> ScheduleInput {
        ScheduleInput {
            class_id,
            subject_id: Uuid::new_v4(),
            teacher_id,
            day_of_week: day,
            start_time: start.into(),
            end_time: end.into(),
            room: String::new(),
        }
    }

    async fn service() -> ScheduleService {
        ScheduleService::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_then_conflict() {
        let svc = service().await;
        let class_id = Uuid::new_v4();
        let first = svc
            .create(&tenant(), None, input(class_id, Uuid::new_v4(), 1, "08:00", "10:00"))
            .await
            .unwrap();

        let err = svc
            .create(&tenant(), None, input(class_id, Uuid::new_v4(), 1, "09:00", "11:00"))
            .await
            .unwrap_err();
        match err {
            Error::ScheduleConflict { conflicts } => assert_eq!(conflicts, vec![first.id]),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_does_not_conflict_with_itself() {
        let svc = service().await;
        let class_id = Uuid::new_v4();
        let teacher_id = Uuid::new_v4();
        let created = svc
            .create(&tenant(), None, input(class_id, teacher_id, 1, "08:00", "10:00"))
            .await
            .unwrap();

        let mut moved = input(class_id, teacher_id, 1, "08:30", "10:30");
        moved.subject_id = created.subject_id;
        let updated = svc.update(&tenant(), None, created.id, moved).await.unwrap();
        assert_eq!(updated.start_time, "08:30:00");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let svc = service().await;
        let err = svc
            .update(&tenant(), None, Uuid::new_v4(), input(Uuid::new_v4(), Uuid::new_v4(), 1, "08:00", "09:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bulk_rejects_intra_batch_overlap() {
        let svc = service().await;
        let teacher_id = Uuid::new_v4();
        let batch = vec![
            input(Uuid::new_v4(), teacher_id, 5, "07:00", "08:00"),
            input(Uuid::new_v4(), teacher_id, 5, "07:30", "08:30"),
        ];
        let err = svc.bulk_create(&tenant(), None, batch).await.unwrap_err();
        assert!(matches!(err, Error::ScheduleConflict { .. }));

        let page = svc.list(&tenant(), Pagination { limit: 10, offset: 0 }).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_bulk_validates_every_member() {
        let svc = service().await;
        let batch = vec![
            input(Uuid::new_v4(), Uuid::new_v4(), 1, "07:00", "08:00"),
            input(Uuid::new_v4(), Uuid::new_v4(), 9, "07:00", "08:00"),
        ];
        assert!(matches!(
            svc.bulk_create(&tenant(), None, batch).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            svc.bulk_create(&tenant(), None, Vec::new()).await,
            Err(Error::Validation(_))
        ));
    }

    async fn seed_template(pool: &SqlitePool, items: Vec<(Option<Uuid>, i64, &str, &str)>) -> Uuid {
        let template_id = Uuid::new_v4();
        let template = ScheduleTemplate {
            id: template_id,
            tenant_id: "t1".into(),
            name: "Reguler".into(),
            description: String::new(),
            is_active: true,
            items: items
                .into_iter()
                .map(|(subject_id, day, start, end)| ScheduleTemplateItem {
                    id: Uuid::new_v4(),
                    tenant_id: "t1".into(),
                    template_id,
                    subject_id,
                    day_of_week: day,
                    start_time: start.into(),
                    end_time: end.into(),
                    meta: RecordMeta::default(),
                })
                .collect(),
            meta: RecordMeta::default(),
        };
        template_db::insert_template_with_items(pool, &template).await.unwrap();
        template_id
    }

    #[tokio::test]
    async fn test_template_skips_placeholders() {
        let pool = init_memory_database().await.unwrap();
        let svc = ScheduleService::new(pool.clone());
        let subject = Uuid::new_v4();
        let teacher = Uuid::new_v4();
        let template_id = seed_template(
            &pool,
            vec![(Some(subject), 1, "08:00:00", "09:00:00"), (None, 2, "10:00:00", "11:00:00")],
        )
        .await;

        let class_id = Uuid::new_v4();
        let assignments = HashMap::from([(subject, teacher)]);
        let created = svc
            .create_from_template(&tenant(), None, template_id, class_id, &assignments)
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].teacher_id, teacher);
        assert_eq!(created[0].room, "");
        assert_eq!(svc.list_by_class(&tenant(), class_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_template_missing_teacher() {
        let pool = init_memory_database().await.unwrap();
        let svc = ScheduleService::new(pool.clone());
        let subject = Uuid::new_v4();
        let template_id = seed_template(&pool, vec![(Some(subject), 1, "08:00:00", "09:00:00")]).await;

        let err = svc
            .create_from_template(&tenant(), None, template_id, Uuid::new_v4(), &HashMap::new())
            .await
            .unwrap_err();
        match err {
            Error::MissingTeacherForSubject(id) => assert_eq!(id, subject),
            other => panic!("expected missing teacher, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_template_empty_and_missing() {
        let pool = init_memory_database().await.unwrap();
        let svc = ScheduleService::new(pool.clone());
        let empty = seed_template(&pool, Vec::new()).await;

        assert!(matches!(
            svc.create_from_template(&tenant(), None, empty, Uuid::new_v4(), &HashMap::new()).await,
            Err(Error::TemplateEmpty)
        ));
        assert!(matches!(
            svc.create_from_template(&tenant(), None, Uuid::new_v4(), Uuid::new_v4(), &HashMap::new())
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_template_conflict_inserts_nothing() {
        let pool = init_memory_database().await.unwrap();
        let svc = ScheduleService::new(pool.clone());
        let class_id = Uuid::new_v4();
        let (s1, s2) = (Uuid::new_v4(), Uuid::new_v4());
        let template_id = seed_template(
            &pool,
            vec![(Some(s1), 1, "07:00:00", "08:00:00"), (Some(s2), 3, "08:00:00", "09:00:00")],
        )
        .await;

        svc.create(&tenant(), None, input(class_id, Uuid::new_v4(), 3, "08:30", "09:30"))
            .await
            .unwrap();

        let assignments = HashMap::from([(s1, Uuid::new_v4()), (s2, Uuid::new_v4())]);
        let err = svc
            .create_from_template(&tenant(), None, template_id, class_id, &assignments)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ScheduleConflict { .. }));
        assert_eq!(svc.list_by_class(&tenant(), class_id).await.unwrap().len(), 1);
    }

    #[test]
    fn test_assignments_accept_both_shapes() {
        let subject = Uuid::new_v4();
        let teacher = Uuid::new_v4();

        let map: TeacherAssignments =
            serde_json::from_value(serde_json::json!({ subject.to_string(): teacher })).unwrap();
        assert_eq!(map.into_map().get(&subject), Some(&teacher));

        let list: TeacherAssignments = serde_json::from_value(serde_json::json!([
            { "subject_id": subject, "teacher_id": teacher }
        ]))
        .unwrap();
        assert_eq!(list.into_map().get(&subject), Some(&teacher));
    }
}
