//! UUID utilities
//!
//! Identifiers are stored as hyphenated text; these helpers convert at the
//! row boundary so the rest of the code only ever sees `Uuid`.

use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse a path or body identifier, mapping failure to `InvalidInput`
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s.trim()).map_err(|_| Error::InvalidInput(format!("invalid id: {}", s)))
}

/// Read a non-null UUID column
pub fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let text: String = row.try_get(column)?;
    Uuid::parse_str(&text)
        .map_err(|e| Error::Internal(format!("corrupt uuid in column {}: {}", column, e)))
}

/// Read a nullable UUID column
pub fn get_opt_uuid(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let text: Option<String> = row.try_get(column)?;
    match text {
        Some(t) if !t.is_empty() => Uuid::parse_str(&t)
            .map(Some)
            .map_err(|e| Error::Internal(format!("corrupt uuid in column {}: {}", column, e))),
        _ => Ok(None),
    }
}

/// Bindable text form of an optional UUID
pub fn opt_to_string(id: Option<Uuid>) -> Option<String> {
    id.map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_hyphenated() {
        let id = generate();
        assert_eq!(parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse("not-a-uuid"), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_row_helpers() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let id = generate();
        let row = sqlx::query("SELECT ? AS id, NULL AS other")
            .bind(id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(get_uuid(&row, "id").unwrap(), id);
        assert_eq!(get_opt_uuid(&row, "other").unwrap(), None);
    }
}
