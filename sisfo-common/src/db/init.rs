//! Database initialization
//!
//! Every service runs the same idempotent bootstrap against the shared
//! database. Tables carry `tenant_id`, audit columns and `deleted_at`.
//!
//! The store is the source of truth for the uniqueness and non-overlap
//! rules: partial unique indexes ignore soft-deleted rows, and the
//! `schedules` triggers abort with `schedule conflict` on overlap.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database at `url` and apply the schema
pub async fn init_database(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect_with(options)
        .await?;

    info!("Opened database: {}", url);

    apply_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the production schema
///
/// A single connection that never recycles keeps the database alive for
/// the lifetime of the pool.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    apply_schema(&pool).await?;
    Ok(pool)
}

/// Create every table, index and trigger (idempotent)
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Calendar and roster (academic service)
    create_academic_years_table(pool).await?;
    create_curricula_tables(pool).await?;
    create_semesters_table(pool).await?;
    create_subjects_table(pool).await?;
    create_teachers_table(pool).await?;
    create_students_table(pool).await?;
    create_classes_table(pool).await?;
    create_class_subjects_table(pool).await?;
    create_enrollments_table(pool).await?;

    // Timetable
    create_schedules_table(pool).await?;
    create_schedule_overlap_triggers(pool).await?;
    create_schedule_templates_tables(pool).await?;

    // Assessment service
    create_grade_categories_table(pool).await?;
    create_assessments_table(pool).await?;
    create_grades_table(pool).await?;
    create_report_cards_tables(pool).await?;
    create_report_card_templates_table(pool).await?;

    Ok(())
}

async fn exec_all(pool: &SqlitePool, statements: &[&str]) -> Result<()> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

async fn create_academic_years_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS academic_years (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_by TEXT,
            updated_by TEXT,
            deleted_at TEXT,
            CHECK (start_date < end_date)
        )
        "#],
    )
    .await
}

async fn create_curricula_tables(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS curricula (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                year INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS curriculum_subjects (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                curriculum_id TEXT NOT NULL REFERENCES curricula(id),
                subject_id TEXT NOT NULL,
                grade_level INTEGER NOT NULL,
                semester INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS grading_rules (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                curriculum_id TEXT NOT NULL REFERENCES curricula(id),
                grade TEXT NOT NULL,
                min_score REAL NOT NULL CHECK (min_score >= 0),
                max_score REAL NOT NULL CHECK (max_score >= min_score),
                points REAL NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_grading_rules_curriculum ON grading_rules(curriculum_id, min_score)",
        ],
    )
    .await
}

async fn create_semesters_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS semesters (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                academic_year_id TEXT NOT NULL,
                curriculum_id TEXT,
                name TEXT NOT NULL,
                semester_type TEXT NOT NULL DEFAULT 'ODD',
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT,
                CHECK (start_date < end_date)
            )
            "#,
            // At most one active semester per academic year
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_semesters_one_active
            ON semesters(tenant_id, academic_year_id)
            WHERE is_active = 1 AND deleted_at IS NULL
            "#,
        ],
    )
    .await
}

async fn create_subjects_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            credit_units INTEGER NOT NULL DEFAULT 0,
            subject_type TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_by TEXT,
            updated_by TEXT,
            deleted_at TEXT
        )
        "#],
    )
    .await
}

async fn create_teachers_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS teachers (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            nip TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            gender TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_by TEXT,
            updated_by TEXT,
            deleted_at TEXT
        )
        "#],
    )
    .await
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                nis TEXT NOT NULL DEFAULT '',
                nisn TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL,
                gender TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                admission_date TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            // Registration numbers are unique per tenant; event redelivery relies on it
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_students_tenant_nis
            ON students(tenant_id, nis)
            WHERE deleted_at IS NULL AND nis <> ''
            "#,
        ],
    )
    .await
}

async fn create_classes_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS classes (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            school_id TEXT,
            academic_year_id TEXT,
            name TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 0,
            major TEXT NOT NULL DEFAULT '',
            homeroom_teacher_id TEXT,
            capacity INTEGER NOT NULL DEFAULT 0 CHECK (capacity >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_by TEXT,
            updated_by TEXT,
            deleted_at TEXT
        )
        "#],
    )
    .await
}

async fn create_class_subjects_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS class_subjects (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                teacher_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_class_subjects_unique
            ON class_subjects(tenant_id, class_id, subject_id)
            WHERE deleted_at IS NULL
            "#,
        ],
    )
    .await
}

async fn create_enrollments_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS enrollments (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_enrollments_class ON enrollments(tenant_id, class_id, status)",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_enrollments_unique
            ON enrollments(tenant_id, class_id, student_id)
            WHERE deleted_at IS NULL
            "#,
        ],
    )
    .await
}

async fn create_schedules_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                teacher_id TEXT NOT NULL,
                day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 1 AND 7),
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                room TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT,
                CHECK (start_time < end_time)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_schedules_day ON schedules(tenant_id, day_of_week, start_time)",
            "CREATE INDEX IF NOT EXISTS idx_schedules_class ON schedules(tenant_id, class_id)",
        ],
    )
    .await
}

/// Overlap predicate shared by the insert and update triggers
const SCHEDULE_OVERLAP_EXISTS: &str = r#"
    EXISTS (
        SELECT 1 FROM schedules s
        WHERE s.tenant_id = NEW.tenant_id
          AND s.deleted_at IS NULL
          AND s.id <> NEW.id
          AND s.day_of_week = NEW.day_of_week
          AND s.start_time < NEW.end_time
          AND s.end_time > NEW.start_time
          AND (s.class_id = NEW.class_id
               OR s.teacher_id = NEW.teacher_id
               OR (NEW.room <> '' AND s.room = NEW.room))
    )
"#;

async fn create_schedule_overlap_triggers(pool: &SqlitePool) -> Result<()> {
    let insert_trigger = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_schedules_no_overlap_insert
        BEFORE INSERT ON schedules
        WHEN NEW.deleted_at IS NULL
        BEGIN
            SELECT RAISE(ABORT, 'schedule conflict') WHERE {};
        END
        "#,
        SCHEDULE_OVERLAP_EXISTS
    );
    let update_trigger = format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS trg_schedules_no_overlap_update
        BEFORE UPDATE ON schedules
        WHEN NEW.deleted_at IS NULL
        BEGIN
            SELECT RAISE(ABORT, 'schedule conflict') WHERE {};
        END
        "#,
        SCHEDULE_OVERLAP_EXISTS
    );

    sqlx::query(&insert_trigger).execute(pool).await?;
    sqlx::query(&update_trigger).execute(pool).await?;
    Ok(())
}

async fn create_schedule_templates_tables(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS schedule_templates (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS schedule_template_items (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                template_id TEXT NOT NULL REFERENCES schedule_templates(id),
                subject_id TEXT,
                day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 1 AND 7),
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_template_items_template ON schedule_template_items(template_id)",
        ],
    )
    .await
}

async fn create_grade_categories_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[r#"
        CREATE TABLE IF NOT EXISTS grade_categories (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            weight REAL NOT NULL CHECK (weight > 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_by TEXT,
            updated_by TEXT,
            deleted_at TEXT
        )
        "#],
    )
    .await
}

async fn create_assessments_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                grade_category_id TEXT NOT NULL,
                teacher_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                semester_id TEXT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                max_score REAL NOT NULL CHECK (max_score > 0),
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_assessments_class_subject ON assessments(tenant_id, class_id, subject_id)",
        ],
    )
    .await
}

async fn create_grades_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS grades (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                assessment_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                score REAL NOT NULL CHECK (score >= 0),
                feedback TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'draft',
                graded_by TEXT,
                approved_by TEXT,
                approved_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_grades_student_assessment
            ON grades(tenant_id, student_id, assessment_id)
            WHERE deleted_at IS NULL
            "#,
        ],
    )
    .await
}

async fn create_report_cards_tables(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS report_cards (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                semester_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                gpa REAL NOT NULL DEFAULT 0,
                total_credits INTEGER NOT NULL DEFAULT 0,
                attendance_present INTEGER NOT NULL DEFAULT 0,
                attendance_absent INTEGER NOT NULL DEFAULT 0,
                comments TEXT NOT NULL DEFAULT '',
                pdf_url TEXT NOT NULL DEFAULT '',
                generated_at TEXT,
                published_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_report_cards_student_semester
            ON report_cards(tenant_id, student_id, semester_id)
            WHERE deleted_at IS NULL
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS report_card_details (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                report_card_id TEXT NOT NULL REFERENCES report_cards(id),
                subject_id TEXT NOT NULL,
                subject_name TEXT NOT NULL,
                credit INTEGER NOT NULL,
                final_score REAL NOT NULL,
                grade_letter TEXT NOT NULL,
                points REAL NOT NULL DEFAULT 0,
                comments TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                deleted_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_report_card_details_card ON report_card_details(report_card_id)",
        ],
    )
    .await
}

async fn create_report_card_templates_table(pool: &SqlitePool) -> Result<()> {
    exec_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS report_card_templates (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                config TEXT NOT NULL DEFAULT '{}',
                is_default INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                created_by TEXT,
                updated_by TEXT,
                deleted_at TEXT
            )
            "#,
            // One default template per tenant
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_report_card_templates_default
            ON report_card_templates(tenant_id)
            WHERE is_default = 1 AND deleted_at IS NULL
            "#,
        ],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_database_has_schema() {
        let pool = init_memory_database().await.unwrap();
        let tables = table_names(&pool).await;
        for expected in [
            "academic_years",
            "assessments",
            "class_subjects",
            "classes",
            "curricula",
            "enrollments",
            "grade_categories",
            "grades",
            "grading_rules",
            "report_card_details",
            "report_card_templates",
            "report_cards",
            "schedule_template_items",
            "schedule_templates",
            "schedules",
            "semesters",
            "students",
            "subjects",
            "teachers",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        apply_schema(&pool).await.unwrap();
        apply_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_created() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("sisfo.db").display());
        let pool = init_database(&url).await.unwrap();
        assert!(dir.path().join("sisfo.db").exists());
        assert!(!table_names(&pool).await.is_empty());
    }
}
