//! Pagination utilities for list endpoints

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not pass `limit`
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Query-string pagination parameters (`?limit=&offset=`)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Sanitised limit/offset pair for SQL `LIMIT ? OFFSET ?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl PageParams {
    /// Clamp limit into [1, MAX_LIMIT] and offset to non-negative
    pub fn resolve(self) -> Pagination {
        let limit = match self.limit {
            Some(l) if l > 0 => l.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        let offset = self.offset.unwrap_or(0).max(0);
        Pagination { limit, offset }
    }
}

/// One page of a list plus the total row count
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}
