//! Client-side session and tab orchestration over a device-database bridge.
//!
//! This crate provides:
//! - `SessionManager`: device → package → database selection, the current
//!   snapshot token, the open table tabs and the query history
//! - `TableTabSession`: one table view with its cursor, monitor and last render
//! - `PaginationCursor`: offset/limit arithmetic for a view
//! - `QueryHistoryLog`: bounded, most-recent-first scrollback of ad hoc queries
//!
//! All bridge traffic goes through [`bridge_client::RemoteBridge`].

mod catalog;
mod error;
mod history;
mod manager;
mod monitor;
mod pagination;
mod tab;
mod view;

#[cfg(test)]
mod tests;

pub use catalog::PackageCatalog;
pub use error::{SessionError, SessionResult};
pub use history::{HistoryView, QueryHistoryEntry, QueryHistoryLog, QueryOutcome, QueryStatus};
pub use manager::{QueryDispatch, SessionManager, SessionSettings, SessionSnapshot};
pub use monitor::PollHandle;
pub use pagination::{PageDirection, PaginationCursor, PaginationDisplay};
pub use tab::{TabSummary, TabView, TableTabSession};
pub use view::{ActiveView, InlineError, Region, ViewEvent};
