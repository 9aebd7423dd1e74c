//! Report card persistence
//!
//! A card and its detail rows are written together inside the caller's
//! transaction. Updating a card soft-deletes the previous details and
//! inserts the new set.

use sisfo_common::db::TenantScope;
use sisfo_common::error::map_constraint;
use sisfo_common::models::{AttendanceSummary, RecordMeta, ReportCard, ReportCardDetail};
use sisfo_common::uuid_utils::get_uuid;
use sisfo_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

const TABLE: &str = "report_cards";
const DETAILS_TABLE: &str = "report_card_details";

fn row_to_card(row: &SqliteRow) -> Result<ReportCard> {
    let status: String = row.try_get("status")?;
    Ok(ReportCard {
        id: get_uuid(row, "id")?,
        tenant_id: row.try_get("tenant_id")?,
        student_id: get_uuid(row, "student_id")?,
        class_id: get_uuid(row, "class_id")?,
        semester_id: get_uuid(row, "semester_id")?,
        status: status.parse()?,
        gpa: row.try_get("gpa")?,
        total_credits: row.try_get("total_credits")?,
        attendance_summary: AttendanceSummary {
            present: row.try_get("attendance_present")?,
            absent: row.try_get("attendance_absent")?,
        },
        comments: row.try_get("comments")?,
        pdf_url: row.try_get("pdf_url")?,
        generated_at: row.try_get("generated_at")?,
        published_at: row.try_get("published_at")?,
        details: Vec::new(),
        meta: RecordMeta::from_row(row)?,
    })
}

fn row_to_detail(row: &SqliteRow) -> Result<ReportCardDetail> {
    Ok(ReportCardDetail {
        id: get_uuid(row, "id")?,
        report_card_id: get_uuid(row, "report_card_id")?,
        subject_id: get_uuid(row, "subject_id")?,
        subject_name: row.try_get("subject_name")?,
        credit: row.try_get("credit")?,
        final_score: row.try_get("final_score")?,
        grade_letter: row.try_get("grade_letter")?,
        points: row.try_get("points")?,
        comments: row.try_get("comments")?,
    })
}

/// Insert a card with its details
pub async fn insert_report_card(tx: &mut Transaction<'_, Sqlite>, card: &ReportCard) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO report_cards (
            id, tenant_id, student_id, class_id, semester_id, status, gpa, total_credits,
            attendance_present, attendance_absent, comments, pdf_url, generated_at, published_at,
            created_at, updated_at, created_by, updated_by
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(card.id.to_string())
    .bind(&card.tenant_id)
    .bind(card.student_id.to_string())
    .bind(card.class_id.to_string())
    .bind(card.semester_id.to_string())
    .bind(card.status.as_str())
    .bind(card.gpa)
    .bind(card.total_credits)
    .bind(card.attendance_summary.present)
    .bind(card.attendance_summary.absent)
    .bind(&card.comments)
    .bind(&card.pdf_url)
    .bind(card.generated_at)
    .bind(card.published_at)
    .bind(card.meta.created_at)
    .bind(card.meta.updated_at)
    .bind(card.meta.created_by.map(|u| u.to_string()))
    .bind(card.meta.updated_by.map(|u| u.to_string()))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_constraint(e, "report card for this student and semester"))?;

    insert_details(tx, card).await
}

/// Rewrite a card and replace its details wholesale
///
/// A published card matches no row, so a publish that lands between the
/// caller's read and this write wins.
pub async fn update_report_card(tx: &mut Transaction<'_, Sqlite>, card: &ReportCard) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE report_cards
        SET class_id = ?, status = ?, gpa = ?, total_credits = ?, attendance_present = ?,
            attendance_absent = ?, comments = ?, pdf_url = ?, generated_at = ?, published_at = ?,
            updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL AND status <> 'published'
        "#,
    )
    .bind(card.class_id.to_string())
    .bind(card.status.as_str())
    .bind(card.gpa)
    .bind(card.total_credits)
    .bind(card.attendance_summary.present)
    .bind(card.attendance_summary.absent)
    .bind(&card.comments)
    .bind(&card.pdf_url)
    .bind(card.generated_at)
    .bind(card.published_at)
    .bind(card.meta.updated_at)
    .bind(card.meta.updated_by.map(|u| u.to_string()))
    .bind(card.id.to_string())
    .bind(&card.tenant_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        "UPDATE report_card_details SET deleted_at = ? WHERE report_card_id = ? AND tenant_id = ? AND deleted_at IS NULL",
    )
    .bind(sisfo_common::time::now())
    .bind(card.id.to_string())
    .bind(&card.tenant_id)
    .execute(&mut **tx)
    .await?;

    insert_details(tx, card).await?;
    Ok(true)
}

async fn insert_details(tx: &mut Transaction<'_, Sqlite>, card: &ReportCard) -> Result<()> {
    let now = sisfo_common::time::now();
    for d in &card.details {
        sqlx::query(
            r#"
            INSERT INTO report_card_details (
                id, tenant_id, report_card_id, subject_id, subject_name, credit,
                final_score, grade_letter, points, comments, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(d.id.to_string())
        .bind(&card.tenant_id)
        .bind(card.id.to_string())
        .bind(d.subject_id.to_string())
        .bind(&d.subject_name)
        .bind(d.credit)
        .bind(d.final_score)
        .bind(&d.grade_letter)
        .bind(d.points)
        .bind(&d.comments)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Status-only write used by publish; details are left untouched
pub async fn update_status<'e, E>(executor: E, card: &ReportCard) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE report_cards
        SET status = ?, published_at = ?, updated_at = ?, updated_by = ?
        WHERE id = ? AND tenant_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(card.status.as_str())
    .bind(card.published_at)
    .bind(card.meta.updated_at)
    .bind(card.meta.updated_by.map(|u| u.to_string()))
    .bind(card.id.to_string())
    .bind(&card.tenant_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

async fn load_details(pool: &SqlitePool, scope: &TenantScope, card: &mut ReportCard) -> Result<()> {
    let mut query = scope.select(DETAILS_TABLE);
    query
        .push(" AND report_card_id = ")
        .push_bind(card.id.to_string())
        .push(" ORDER BY subject_name");
    let rows = query.build().fetch_all(pool).await?;
    card.details = rows.iter().map(row_to_detail).collect::<Result<_>>()?;
    Ok(())
}

/// Card with its live details
pub async fn get_report_card(pool: &SqlitePool, scope: &TenantScope, id: Uuid) -> Result<Option<ReportCard>> {
    let row = scope.by_id(TABLE, id).build().fetch_optional(pool).await?;
    match row.as_ref().map(row_to_card).transpose()? {
        Some(mut card) => {
            load_details(pool, scope, &mut card).await?;
            Ok(Some(card))
        }
        None => Ok(None),
    }
}

/// The student's card for a semester, with details
pub async fn get_by_student_and_semester(
    pool: &SqlitePool,
    scope: &TenantScope,
    student_id: Uuid,
    semester_id: Uuid,
) -> Result<Option<ReportCard>> {
    let mut query = scope.select(TABLE);
    query
        .push(" AND student_id = ")
        .push_bind(student_id.to_string())
        .push(" AND semester_id = ")
        .push_bind(semester_id.to_string());
    let row = query.build().fetch_optional(pool).await?;
    match row.as_ref().map(row_to_card).transpose()? {
        Some(mut card) => {
            load_details(pool, scope, &mut card).await?;
            Ok(Some(card))
        }
        None => Ok(None),
    }
}

/// A student's cards, optionally for one semester, newest first
pub async fn list_by_student(
    pool: &SqlitePool,
    scope: &TenantScope,
    student_id: Uuid,
    semester_id: Option<Uuid>,
) -> Result<Vec<ReportCard>> {
    let mut query = scope.select(TABLE);
    query.push(" AND student_id = ").push_bind(student_id.to_string());
    if let Some(semester_id) = semester_id {
        query.push(" AND semester_id = ").push_bind(semester_id.to_string());
    }
    query.push(" ORDER BY created_at DESC");
    let rows = query.build().fetch_all(pool).await?;

    let mut cards = rows.iter().map(row_to_card).collect::<Result<Vec<_>>>()?;
    for card in &mut cards {
        load_details(pool, scope, card).await?;
    }
    Ok(cards)
}

/// Whether a published card freezes grades of this student
///
/// With a semester, only that semester's card counts. Without one, any
/// published card of the class does.
pub async fn has_published<'e, E>(
    executor: E,
    scope: &TenantScope,
    student_id: Uuid,
    class_id: Uuid,
    semester_id: Option<Uuid>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = scope.count(TABLE);
    query
        .push(" AND status = 'published' AND student_id = ")
        .push_bind(student_id.to_string());
    match semester_id {
        Some(semester_id) => query.push(" AND semester_id = ").push_bind(semester_id.to_string()),
        None => query.push(" AND class_id = ").push_bind(class_id.to_string()),
    };
    let count: i64 = query.build_query_scalar().fetch_one(executor).await?;
    Ok(count > 0)
}
