//! Student persistence

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{RecordMeta, Student};
use sisfo_common::pagination::Pagination;
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const TABLE: &str = "students";

fn row_to_student(row: &SqliteRow) -> Result<Student> {
    Ok(Student {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        nis: row.try_get("nis")?,
        nisn: row.try_get("nisn")?,
        name: row.try_get("name")?,
        gender: row.try_get("gender")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        admission_date: row.try_get("admission_date")?,
        status: row.try_get("status")?,
        meta: RecordMeta::from_row(row)?,
    })
}

/// Insert a student; a duplicate registration number maps to `Conflict`
pub async fn insert_student(pool: &SqlitePool, s: &Student) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO students (
            id, tenant_id, nis, nisn, name, gender, phone, email, admission_date, status,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(s.id.to_string())
    .bind(&s.tenant_id)
    .bind(&s.nis)
    .bind(&s.nisn)
    .bind(&s.name)
    .bind(&s.gender)
    .bind(&s.phone)
    .bind(&s.email)
    .bind(s.admission_date)
    .bind(&s.status)
    .bind(s.meta.created_at)
    .bind(s.meta.updated_at)
    .bind(s.meta.created_by.map(|u| u.to_string()))
    .bind(s.meta.updated_by.map(|u| u.to_string()))
    .execute(pool)
    .await
    .map_err(|e| map_constraint(e, "student with this registration number"))?;
    Ok(())
}

pub async fn get_student(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<Student>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_student).transpose()
}

pub async fn find_by_nis(pool: &SqlitePool, scope: &TenantScope, nis: &str) -> Result<Option<Student>> {
    let mut query = scope.select(TABLE);
    query.push(" AND nis = ").push_bind(nis.to_string());
    let row = query.build().fetch_optional(pool).await?;
    row.as_ref().map(row_to_student).transpose()
}

pub async fn list_students(
    pool: &SqlitePool,
    scope: &TenantScope,
    page: Pagination,
) -> Result<(Vec<Student>, i64)> {
    let total: i64 = scope.count(TABLE).build_query_scalar().fetch_one(pool).await?;

    let mut query = scope.select(TABLE);
    query
        .push(" ORDER BY name LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    let rows = query.build().fetch_all(pool).await?;
    let students = rows.iter().map(row_to_student).collect::<Result<Vec<_>>>()?;
    Ok((students, total))
}
