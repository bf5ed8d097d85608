//! # View Projector
//!
//! Pure functions from cache + in-flight state to render-ready models. The
//! view layer draws these models as-is; no decision about what to show is
//! left to it.

use chrono::{DateTime, Utc};

use crate::client::sync::cache::Snapshot;
use crate::client::sync::fingerprint::PageWindow;
use crate::client::sync::inflight::InFlightState;
use crate::shared::error::SyncError;
use crate::shared::health::{DatabaseHealthResponse, HealthResponse};
use crate::shared::todo::{Todo, TodoPage, TodoStats};

/// Status shown before an endpoint has answered
pub const UNKNOWN_STATUS: &str = "unknown";

/// Which of the mutually exclusive list states to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Loading,
    Error,
    Empty,
    Data,
}

/// Everything the todo list view draws
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRenderModel {
    pub items: Vec<Todo>,
    pub total: u64,
    pub is_loading: bool,
    pub error: Option<SyncError>,
    pub can_go_next: bool,
    pub can_go_previous: bool,
    pub page_label: String,
    pub range_label: String,
    /// Pagination controls are only drawn when there is more than one page
    pub show_pagination: bool,
    pub stats: TodoStats,
    pub view: ViewKind,
}

pub fn project_todos(
    snapshot: Option<&Snapshot<TodoPage>>,
    in_flight: &InFlightState,
    window: PageWindow,
) -> TodoRenderModel {
    project_todos_at(snapshot, in_flight, window, Utc::now())
}

/// [`project_todos`] with an explicit clock for the overdue count
pub fn project_todos_at(
    snapshot: Option<&Snapshot<TodoPage>>,
    in_flight: &InFlightState,
    window: PageWindow,
    now: DateTime<Utc>,
) -> TodoRenderModel {
    let items = snapshot.map(|s| s.data.items.clone()).unwrap_or_default();
    let total = snapshot.map_or(0, |s| s.data.total);
    let error = in_flight.last_error.clone();

    let view = if snapshot.is_none() && in_flight.is_loading {
        ViewKind::Loading
    } else if !in_flight.is_loading && error.is_some() {
        ViewKind::Error
    } else if items.is_empty() {
        ViewKind::Empty
    } else {
        ViewKind::Data
    };

    let offset = u64::from(window.offset());
    let limit = u64::from(window.limit());

    TodoRenderModel {
        stats: TodoStats::from_items(&items, now),
        items,
        total,
        is_loading: in_flight.is_loading,
        error,
        can_go_next: offset + limit < total,
        can_go_previous: offset > 0,
        page_label: page_label(offset, limit, total),
        range_label: range_label(offset, limit, total),
        show_pagination: total > limit,
        view,
    }
}

fn page_label(offset: u64, limit: u64, total: u64) -> String {
    let page = offset / limit + 1;
    let pages = total.div_ceil(limit).max(1);
    format!("Page {} of {}", page, pages)
}

fn range_label(offset: u64, limit: u64, total: u64) -> String {
    if total == 0 {
        return "Showing 0 of 0".to_string();
    }
    let first = (offset + 1).min(total);
    let last = (offset + limit).min(total);
    format!("Showing {}-{} of {}", first, last, total)
}

/// Liveness endpoint as drawn by the status page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStatus {
    pub status: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Database endpoint as drawn by the status page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStatus {
    pub status: String,
    pub connection: String,
    pub error: Option<String>,
    pub is_loading: bool,
    /// The last request failed at the HTTP level (503 when the db is down)
    pub http_error: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRenderModel {
    pub app: AppStatus,
    pub database: DatabaseStatus,
}

impl HealthRenderModel {
    /// Most recent update of either endpoint, for a combined label only.
    /// Each endpoint's freshness is tracked separately.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.app.last_updated.max(self.database.last_updated)
    }
}

pub fn project_health(
    app: (Option<&Snapshot<HealthResponse>>, &InFlightState),
    database: (Option<&Snapshot<DatabaseHealthResponse>>, &InFlightState),
) -> HealthRenderModel {
    let (app_snapshot, app_flight) = app;
    let (db_snapshot, db_flight) = database;

    let db_error = db_snapshot
        .and_then(|s| s.data.error.clone())
        .or_else(|| db_flight.last_error.as_ref().map(database_error_message));

    HealthRenderModel {
        app: AppStatus {
            status: app_snapshot
                .map_or_else(|| UNKNOWN_STATUS.to_string(), |s| s.data.status.clone()),
            is_loading: app_flight.is_loading && app_snapshot.is_none(),
            error: app_flight.last_error.as_ref().map(ToString::to_string),
            last_updated: app_snapshot.map(|s| s.fetched_at),
        },
        database: DatabaseStatus {
            status: db_snapshot
                .map_or_else(|| UNKNOWN_STATUS.to_string(), |s| s.data.status.clone()),
            connection: db_snapshot
                .map_or_else(|| UNKNOWN_STATUS.to_string(), |s| s.data.database.clone()),
            error: db_error,
            is_loading: db_flight.is_loading && db_snapshot.is_none(),
            http_error: db_flight.last_error.is_some(),
            last_updated: db_snapshot.map(|s| s.fetched_at),
        },
    }
}

/// The db check answers 503 with a regular body; prefer its `error` field
fn database_error_message(error: &SyncError) -> String {
    match error {
        SyncError::Http { body, .. } => serde_json::from_str::<DatabaseHealthResponse>(body)
            .ok()
            .and_then(|response| response.error)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}
