//! Todo Data Structures
//!
//! Wire types for the `/api/v1/todos` resource plus the client-side form
//! model and its validation rules.
//!
//! The server is the sole source of truth for ids and timestamps: a `Todo`
//! is only ever built from a response, never assembled locally.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::{SyncError, SyncResult};

/// Maximum title length accepted by the backend
pub const MAX_TITLE_LEN: usize = 200;

/// Todo priority level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse the wire/form representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Field the list endpoint sorts by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DueDate => "due_date",
            Self::Priority => "priority",
            Self::Title => "title",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// A todo item as returned by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Not completed and due before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Payload for `POST /api/v1/todos`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoCreate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
        }
    }
}

/// Partial update payload for `PATCH /api/v1/todos/{id}`
///
/// Outer `None` leaves a field untouched; `Some(None)` on the nullable
/// fields sends an explicit `null` and clears the value server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// One page of the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

/// Title rules shared by the form and the mutation payloads
pub fn validate_title(title: &str) -> SyncResult<()> {
    if title.is_empty() {
        return Err(SyncError::validation("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(SyncError::validation(
            "title",
            format!("Title must be {} characters or less", MAX_TITLE_LEN),
        ));
    }
    Ok(())
}

/// Raw form input for creating or editing a todo
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: String,
}

/// Form contents after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTodoForm {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoForm {
    /// Check the form without touching the network
    pub fn validate(&self) -> SyncResult<ValidTodoForm> {
        validate_title(&self.title)?;
        let priority = Priority::parse(&self.priority).ok_or_else(|| {
            SyncError::validation("priority", "Priority must be one of low, medium, high")
        })?;
        let due_date = if self.due_date.is_empty() {
            None
        } else {
            Some(parse_due_date(&self.due_date)?)
        };
        let description = (!self.description.is_empty()).then(|| self.description.clone());

        Ok(ValidTodoForm {
            title: self.title.clone(),
            description,
            priority,
            due_date,
        })
    }
}

impl ValidTodoForm {
    pub fn into_create(self) -> TodoCreate {
        TodoCreate {
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
        }
    }

    /// Edits replace every form field, clearing the empty ones
    pub fn into_patch(self) -> TodoPatch {
        TodoPatch {
            title: Some(self.title),
            description: Some(self.description),
            completed: None,
            priority: Some(self.priority),
            due_date: Some(self.due_date),
        }
    }
}

/// Accepts RFC 3339 or a `datetime-local` value (`YYYY-MM-DDTHH:MM[:SS]`, UTC)
fn parse_due_date(value: &str) -> SyncResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SyncError::validation("due_date", format!("Invalid date: {}", value)))
}

/// Summary counts over a page of todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
}

impl TodoStats {
    pub fn from_items(items: &[Todo], now: DateTime<Utc>) -> Self {
        let completed = items.iter().filter(|todo| todo.completed).count();
        Self {
            total: items.len(),
            completed,
            active: items.len() - completed,
            overdue: items.iter().filter(|todo| todo.is_overdue(now)).count(),
        }
    }
}
