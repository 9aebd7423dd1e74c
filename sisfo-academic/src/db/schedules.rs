//! Schedule persistence

use sisfo_common::db::{soft_delete, TenantScope};
use sisfo_common::error::map_constraint;
use sisfo_common::models::{RecordMeta, Schedule};
use sisfo_common::pagination::Pagination;
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::{Result, TenantId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "schedules";

fn row_to_schedule(row: &SqliteRow) -> Result<Schedule> {
    Ok(Schedule {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        class_id: get_uuid(row, "class_id")?,
        subject_id: get_uuid(row, "subject_id")?,
        teacher_id: get_uuid(row, "teacher_id")?,
        day_of_week: row.try_get("day_of_week")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        room: row.try_get("room")?,
        meta: RecordMeta::from_row(row)?,
    })
}

pub async fn insert_schedule<'e, E>(executor: E, s: &Schedule) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO schedules (
            id, tenant_id, class_id, subject_id, teacher_id, day_of_week,
            start_time, end_time, room, created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .bind(s.class_id.to_string())
    .bind(s.subject_id.to_string())
    .bind(s.teacher_id.to_string())
    .bind(s.day_of_week)
    .bind(&s.start_time)
    .bind(&s.end_time)
    .bind(&s.room)
    .bind(s.meta.created_at)
    .bind(s.meta.updated_at)
    .bind(s.meta.created_by.map(|u| u.to_string()))
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|e| map_constraint(e, "schedule"))?;

    Ok(())
}

/// Insert every slot in one transaction; any failure rolls back the batch
pub async fn insert_schedules_batch(pool: &SqlitePool, schedules: &[Schedule]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for schedule in schedules {
        insert_schedule(&mut *tx, schedule).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Returns false when the row is absent or soft-deleted
pub async fn update_schedule(pool: &SqlitePool, s: &Schedule) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE schedules
        SET class_id = ?, subject_id = ?, teacher_id = ?, day_of_week = ?,
            start_time = ?, end_time = ?, room = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(s.class_id.to_string())
    .bind(s.subject_id.to_string())
    .bind(s.teacher_id.to_string())
    .bind(s.day_of_week)
    .bind(&s.start_time)
    .bind(&s.end_time)
    .bind(&s.room)
    .bind(s.meta.updated_at)
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .execute(pool)
    .await
    .map_err(|e| map_constraint(e, "schedule"))?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_schedule(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Schedule>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_schedule).transpose()
}

/// Page of schedules ordered by day then start time, plus the total count
pub async fn list_schedules(
    pool: &SqlitePool,
    scope: &TenantScope,
    page: Pagination,
) -> Result<(Vec<Schedule>, i64)> {
    let total: i64 = scope.count(TABLE).build_query_scalar().fetch_one(pool).await?;

    let mut query = scope.select(TABLE);
    query
        .push(" ORDER BY day_of_week, start_time LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    let rows = query.build().fetch_all(pool).await?;

    let schedules = rows.iter().map(row_to_schedule).collect::<Result<Vec<_>>>()?;
    Ok((schedules, total))
}

pub async fn list_by_class(pool: &SqlitePool, scope: &TenantScope, class_id: Uuid) -> Result<Vec<Schedule>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND class_id = ")
        .push_bind(class_id.to_string())
        .push(" ORDER BY day_of_week, start_time");
    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_schedule).collect()
}

/// Persisted slots that may not coexist with `candidate`
///
/// Same tenant and day, sharing class, teacher or non-empty room, with an
/// overlapping half-open interval, and a different id.
pub async fn find_conflicts(pool: &SqlitePool, candidate: &Schedule) -> Result<Vec<Schedule>> {
    let scope = TenantScope::new(&TenantId::new(candidate.tenant_id.as_str()));
    let mut query = scope.select(TABLE);
    query
        .push(" AND day_of_week = ")
        .push_bind(candidate.day_of_week)
        .push(" AND id <> ")
        .push_bind(candidate.id.to_string())
        .push(" AND start_time < ")
        .push_bind(candidate.end_time.clone())
        .push(" AND end_time > ")
        .push_bind(candidate.start_time.clone())
        .push(" AND (class_id = ")
        .push_bind(candidate.class_id.to_string())
        .push(" OR teacher_id = ")
        .push_bind(candidate.teacher_id.to_string());
    if !candidate.room.is_empty() {
        query.push(" OR room = ").push_bind(candidate.room.clone());
    }
    query.push(")");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(row_to_schedule).collect()
}

pub async fn delete_schedule(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<bool> {
    soft_delete(pool, TABLE, scope.tenant(), id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sisfo_common::db::init_memory_database;
    use sisfo_common::Error;

    fn slot(tenant: &str, class_id: Uuid, teacher_id: Uuid, day: i64, start: &str, end: &str, room: &str) -> Schedule {
        let mut s = Schedule {
            id: Uuid::new_v4(),
            tenant_id: tenant.into(),
            class_id,
            subject_id: Uuid::new_v4(),
            teacher_id,
            day_of_week: day,
            start_time: start.into(),
            end_time: end.into(),
            room: room.into(),
            meta: RecordMeta::default(),
        };
        s.validate().unwrap();
        s
    }

    fn scope(tenant: &str) -> TenantScope {
        TenantScope::new(&TenantId::new(tenant))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = init_memory_database().await.unwrap();
        let s = slot("t1", Uuid::new_v4(), Uuid::new_v4(), 1, "08:00", "09:00", "R1");
        insert_schedule(&pool, &s).await.unwrap();

        let loaded = get_schedule(&pool, &scope("t1"), s.id).await.unwrap().unwrap();
        assert_eq!(loaded.start_time, "08:00:00");
        assert_eq!(loaded.room, "R1");

        assert!(get_schedule(&pool, &scope("t2"), s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_conflicts_by_room() {
        let pool = init_memory_database().await.unwrap();
        let existing = slot("t1", Uuid::new_v4(), Uuid::new_v4(), 2, "08:00", "10:00", "Lab");
        insert_schedule(&pool, &existing).await.unwrap();

        let other_room = slot("t1", Uuid::new_v4(), Uuid::new_v4(), 2, "09:00", "11:00", "R2");
        assert!(find_conflicts(&pool, &other_room).await.unwrap().is_empty());

        let same_room = slot("t1", Uuid::new_v4(), Uuid::new_v4(), 2, "09:00", "11:00", "Lab");
        let conflicts = find_conflicts(&pool, &same_room).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].id, existing.id);
    }

    #[tokio::test]
    async fn test_find_conflicts_excludes_self_and_deleted() {
        let pool = init_memory_database().await.unwrap();
        let class_id = Uuid::new_v4();
        let existing = slot("t1", class_id, Uuid::new_v4(), 1, "08:00", "10:00", "");
        insert_schedule(&pool, &existing).await.unwrap();

        assert!(find_conflicts(&pool, &existing).await.unwrap().is_empty());

        let overlapping = slot("t1", class_id, Uuid::new_v4(), 1, "09:00", "09:30", "");
        assert_eq!(find_conflicts(&pool, &overlapping).await.unwrap().len(), 1);

        delete_schedule(&pool, &scope("t1"), existing.id).await.unwrap();
        assert!(find_conflicts(&pool, &overlapping).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_rejects_overlap() {
        let pool = init_memory_database().await.unwrap();
        let teacher = Uuid::new_v4();
        insert_schedule(&pool, &slot("t1", Uuid::new_v4(), teacher, 3, "08:00", "10:00", ""))
            .await
            .unwrap();

        let err = insert_schedule(&pool, &slot("t1", Uuid::new_v4(), teacher, 3, "09:00", "11:00", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ScheduleConflict { .. }));

        // Other tenants are unaffected
        insert_schedule(&pool, &slot("t2", Uuid::new_v4(), teacher, 3, "09:00", "11:00", ""))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_batch_rolls_back() {
        let pool = init_memory_database().await.unwrap();
        let class_id = Uuid::new_v4();
        let first = slot("t1", class_id, Uuid::new_v4(), 4, "08:00", "09:00", "");
        let clash = slot("t1", class_id, Uuid::new_v4(), 4, "08:30", "09:30", "");

        assert!(insert_schedules_batch(&pool, &[first, clash]).await.is_err());
        assert!(list_by_class(&pool, &scope("t1"), class_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_ordering_and_total() {
        let pool = init_memory_database().await.unwrap();
        let class_id = Uuid::new_v4();
        for (day, start, end) in [(2, "08:00", "09:00"), (1, "10:00", "11:00"), (1, "08:00", "09:00")] {
            insert_schedule(&pool, &slot("t1", class_id, Uuid::new_v4(), day, start, end, ""))
                .await
                .unwrap();
        }

        let (page, total) = list_schedules(&pool, &scope("t1"), Pagination { limit: 2, offset: 0 })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!((page[0].day_of_week, page[0].start_time.as_str()), (1, "08:00:00"));
        assert_eq!((page[1].day_of_week, page[1].start_time.as_str()), (1, "10:00:00"));
    }
}
