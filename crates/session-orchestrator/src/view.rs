//! Display-facing state shared with front ends.

use bridge_client::DatabaseSnapshotToken;
use serde::Serialize;
use std::fmt;

/// Part of the screen a call belongs to; inline errors are scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "region", content = "table", rename_all = "snake_case")]
pub enum Region {
    Devices,
    Packages,
    Databases,
    Tables,
    Tab(String),
    QueryConsole,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Devices => f.write_str("devices"),
            Region::Packages => f.write_str("packages"),
            Region::Databases => f.write_str("databases"),
            Region::Tables => f.write_str("tables"),
            Region::Tab(table) => write!(f, "tab:{}", table),
            Region::QueryConsole => f.write_str("query"),
        }
    }
}

/// What the main pane is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "table", rename_all = "snake_case")]
pub enum ActiveView {
    /// Default location when no table tab is focused
    #[default]
    QueryConsole,
    Table(String),
}

/// Error text rendered inline in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineError {
    pub region: Region,
    pub message: String,
}

/// Notification that some part of the view state changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    DevicesChanged,
    PackagesChanged,
    DatabasesChanged,
    TablesChanged,
    TokenChanged {
        token: Option<DatabaseSnapshotToken>,
    },
    TabUpdated {
        table: String,
    },
    TabClosed {
        table: String,
    },
    ActiveViewChanged {
        view: ActiveView,
    },
    InlineError {
        region: Region,
        message: String,
    },
    Prompt {
        message: String,
    },
    HistoryAppended {
        sequence: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_display() {
        assert_eq!(Region::Tab("users".to_string()).to_string(), "tab:users");
        assert_eq!(Region::QueryConsole.to_string(), "query");
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = ViewEvent::InlineError {
            region: Region::Tab("users".to_string()),
            message: "Error loading data".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "inline_error");
        assert_eq!(json["region"]["region"], "tab");
        assert_eq!(json["region"]["table"], "users");
    }
}
