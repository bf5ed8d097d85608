//! Filter and pagination state of the todo list view.
//!
//! Any filter change sends the view back to the first page; only the explicit
//! page helpers move the offset.

use crate::client::sync::fingerprint::{Filter, Fingerprint, PageWindow, TodoQuery};
use crate::shared::error::SyncResult;
use crate::shared::todo::{Priority, SortBy};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListState {
    filter: Filter,
    window: PageWindow,
}

impl ListState {
    pub fn new(limit: u32) -> SyncResult<Self> {
        Ok(Self {
            filter: Filter::default(),
            window: PageWindow::first(limit)?,
        })
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    /// Replace the filter. The offset goes back to 0 even if nothing changed.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.window = self.window.with_offset(0);
    }

    /// Derive a new filter from the current one
    pub fn update_filter(&mut self, update: impl FnOnce(&Filter) -> Filter) {
        let filter = update(&self.filter);
        self.set_filter(filter);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.update_filter(|f| Filter {
            search,
            ..f.clone()
        });
    }

    pub fn set_completed(&mut self, completed: Option<bool>) {
        self.update_filter(|f| Filter {
            completed,
            ..f.clone()
        });
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.update_filter(|f| Filter {
            priority,
            ..f.clone()
        });
    }

    /// Change the sort column; the current order is kept
    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.update_filter(|f| Filter {
            sort_by,
            ..f.clone()
        });
    }

    pub fn toggle_sort_order(&mut self) {
        self.update_filter(|f| Filter {
            sort_order: f.sort_order.toggled(),
            ..f.clone()
        });
    }

    /// Advance one page if `total` has more items. Returns whether it moved.
    pub fn next_page(&mut self, total: u64) -> bool {
        let end = u64::from(self.window.offset()) + u64::from(self.window.limit());
        if end >= total {
            return false;
        }
        self.window = self.window.next();
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.window.offset() == 0 {
            return false;
        }
        self.window = self.window.previous();
        true
    }

    /// Default filter, first page, same page size
    pub fn reset(&mut self) {
        self.set_filter(Filter::default());
    }

    pub fn query(&self) -> TodoQuery {
        TodoQuery::new(self.filter.clone(), self.window)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::for_todos(&self.filter, &self.window)
    }
}
