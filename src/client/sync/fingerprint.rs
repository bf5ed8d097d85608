//! # Fingerprint Builder
//!
//! Derives the cache key of a query from its collection name and parameters.
//!
//! The parameter part is the canonical JSON encoding of the parameters:
//! object keys are sorted and strings are escaped, so two parameter sets
//! produce the same fingerprint exactly when they are equal field by field.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::shared::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::todo::{Priority, SortBy, SortOrder};

/// Collection name of the todo list queries
pub const TODOS: &str = "todos";
/// Collection name of the liveness check
pub const HEALTH: &str = "health";
/// Collection name of the database check
pub const HEALTH_DB: &str = "health-db";

/// Filter and sort parameters of the todo list
///
/// Replaced wholesale on change, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Filter {
    pub search: String,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Offset/limit pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPageWindow")]
pub struct PageWindow {
    offset: u32,
    limit: u32,
}

#[derive(Deserialize)]
struct RawPageWindow {
    offset: u32,
    limit: u32,
}

impl TryFrom<RawPageWindow> for PageWindow {
    type Error = SyncError;

    fn try_from(raw: RawPageWindow) -> SyncResult<Self> {
        Self::new(raw.offset, raw.limit)
    }
}

impl PageWindow {
    pub fn new(offset: u32, limit: u32) -> SyncResult<Self> {
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(SyncError::validation(
                "limit",
                format!("limit must be within 1..={}", MAX_PAGE_LIMIT),
            ));
        }
        Ok(Self { offset, limit })
    }

    /// First page with the given limit
    pub fn first(limit: u32) -> SyncResult<Self> {
        Self::new(0, limit)
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn with_offset(self, offset: u32) -> Self {
        Self { offset, ..self }
    }

    pub fn next(self) -> Self {
        self.with_offset(self.offset.saturating_add(self.limit))
    }

    pub fn previous(self) -> Self {
        self.with_offset(self.offset.saturating_sub(self.limit))
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Parameters of one todo list request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TodoQuery {
    pub filter: Filter,
    pub window: PageWindow,
}

impl TodoQuery {
    pub fn new(filter: Filter, window: PageWindow) -> Self {
        Self { filter, window }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::for_todos(&self.filter, &self.window)
    }

    /// Query-string pairs for the list endpoint; an empty search is omitted
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("offset", self.window.offset.to_string()),
            ("limit", self.window.limit.to_string()),
        ];
        if let Some(completed) = self.filter.completed {
            pairs.push(("completed", completed.to_string()));
        }
        if let Some(priority) = self.filter.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if !self.filter.search.is_empty() {
            pairs.push(("search", self.filter.search.clone()));
        }
        pairs.push(("sort_by", self.filter.sort_by.as_str().to_string()));
        pairs.push(("sort_order", self.filter.sort_order.as_str().to_string()));
        pairs
    }
}

/// Stable cache key: owning collection plus canonical parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    collection: String,
    params: String,
}

impl Fingerprint {
    pub fn new(collection: impl Into<String>, params: &serde_json::Value) -> Self {
        Self {
            collection: collection.into(),
            params: params.to_string(),
        }
    }

    /// Fingerprint of a parameterless resource
    pub fn resource(collection: impl Into<String>) -> Self {
        Self::new(collection, &serde_json::Value::Null)
    }

    pub fn for_todos(filter: &Filter, window: &PageWindow) -> Self {
        let params = json!({
            "search": filter.search,
            "completed": filter.completed,
            "priority": filter.priority.map(|p| p.as_str()),
            "sort_by": filter.sort_by.as_str(),
            "sort_order": filter.sort_order.as_str(),
            "offset": window.offset,
            "limit": window.limit,
        });
        Self::new(TODOS, &params)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn belongs_to(&self, collection: &str) -> bool {
        self.collection == collection
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection, self.params)
    }
}
