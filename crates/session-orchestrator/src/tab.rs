//! One open table view.

use crate::monitor::PollHandle;
use crate::pagination::{PageDirection, PaginationCursor, PaginationDisplay};
use bridge_client::{Row, TablePage};
use serde::Serialize;

/// Last rendered content of a tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TabView {
    #[default]
    Loading,
    Rows {
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    /// The page came back without rows
    Empty,
    Error {
        message: String,
    },
}

/// Sync, pagination and poll state of one table tab.
#[derive(Debug)]
pub struct TableTabSession {
    table_name: String,
    cursor: PaginationCursor,
    poll: Option<PollHandle>,
    last_total: Option<u64>,
    view: TabView,
    pagination: PaginationDisplay,
}

impl TableTabSession {
    pub fn new(table_name: impl Into<String>, limit: u64) -> Self {
        Self {
            table_name: table_name.into(),
            cursor: PaginationCursor::new(limit),
            poll: None,
            last_total: None,
            view: TabView::Loading,
            pagination: PaginationDisplay::default(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn view(&self) -> &TabView {
        &self.view
    }

    pub fn pagination(&self) -> PaginationDisplay {
        self.pagination
    }

    pub fn last_total(&self) -> Option<u64> {
        self.last_total
    }

    pub fn monitor_enabled(&self) -> bool {
        self.poll.is_some()
    }

    pub(crate) fn poll_id(&self) -> Option<u64> {
        self.poll.as_ref().map(PollHandle::id)
    }

    pub(crate) fn step(&mut self, direction: PageDirection) -> bool {
        self.cursor.step(direction)
    }

    pub(crate) fn seek(&mut self, page_number: u64) {
        self.cursor.seek(page_number);
    }

    pub(crate) fn start_monitor(&mut self, handle: PollHandle) {
        self.stop_monitor();
        self.poll = Some(handle);
    }

    /// Returns true if a monitor was running.
    pub(crate) fn stop_monitor(&mut self) -> bool {
        match self.poll.take() {
            Some(mut handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Render a fetched page against the current cursor.
    pub(crate) fn apply_page(&mut self, page: TablePage) {
        self.pagination = self.cursor.display(page.total);
        self.last_total = Some(page.total);
        self.view = if page.rows.is_empty() {
            TabView::Empty
        } else {
            TabView::Rows {
                columns: page.columns,
                rows: page.rows,
            }
        };
    }

    pub(crate) fn apply_error(&mut self, message: impl Into<String>) {
        self.view = TabView::Error {
            message: message.into(),
        };
    }

    pub fn summary(&self) -> TabSummary {
        TabSummary {
            table_name: self.table_name.clone(),
            offset: self.cursor.offset(),
            limit: self.cursor.limit(),
            monitor_enabled: self.monitor_enabled(),
            last_total: self.last_total,
            pagination: self.pagination,
            view: self.view.clone(),
        }
    }
}

impl Drop for TableTabSession {
    fn drop(&mut self) {
        self.stop_monitor();
    }
}

/// Owned copy of a tab's display state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSummary {
    pub table_name: String,
    pub offset: u64,
    pub limit: u64,
    pub monitor_enabled: bool,
    pub last_total: Option<u64>,
    pub pagination: PaginationDisplay,
    pub view: TabView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(total: u64, rows: usize) -> TablePage {
        TablePage {
            columns: vec!["id".to_string()],
            rows: (0..rows)
                .map(|i| {
                    let mut row = Row::new();
                    row.insert("id".to_string(), json!(i));
                    row
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn new_tab_is_loading_on_first_page() {
        let tab = TableTabSession::new("users", 50);
        assert_eq!(tab.view(), &TabView::Loading);
        assert_eq!(tab.cursor().offset(), 0);
        assert!(!tab.monitor_enabled());
        assert!(tab.last_total().is_none());
    }

    #[test]
    fn empty_page_renders_empty_state() {
        let mut tab = TableTabSession::new("users", 50);
        tab.step(PageDirection::Next);
        tab.step(PageDirection::Next);
        tab.step(PageDirection::Next);
        tab.apply_page(page(120, 0));

        assert_eq!(tab.view(), &TabView::Empty);
        assert!(!tab.pagination().has_next);
        assert_eq!(tab.cursor().offset(), 150);
    }

    #[test]
    fn rows_page_updates_pagination() {
        let mut tab = TableTabSession::new("users", 50);
        tab.apply_page(page(120, 50));

        assert!(matches!(tab.view(), TabView::Rows { rows, .. } if rows.len() == 50));
        assert_eq!(tab.pagination().label(), "Page 1 (Total: 120)");
        assert_eq!(tab.last_total(), Some(120));
    }

    #[test]
    fn error_replaces_view_but_keeps_cursor() {
        let mut tab = TableTabSession::new("users", 50);
        tab.step(PageDirection::Next);
        tab.apply_error("Error loading data");

        let summary = tab.summary();
        assert_eq!(summary.offset, 50);
        assert_eq!(
            summary.view,
            TabView::Error {
                message: "Error loading data".to_string()
            }
        );
    }

    #[test]
    fn stop_monitor_without_handle_is_noop() {
        let mut tab = TableTabSession::new("users", 50);
        assert!(!tab.stop_monitor());
        assert!(tab.poll_id().is_none());
    }
}
