//! Bounded scrollback of ad hoc query executions.

use bridge_client::{QueryResponse, Row};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::vec_deque::{self, VecDeque};
use std::fmt;

/// Characters of query text shown in a collapsed history entry.
const SUMMARY_CHARS: usize = 50;

/// What a query produced, in the three shapes the bridge can answer with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rows { columns: Vec<String>, rows: Vec<Row> },
    Message { message: String },
    Error { error: String },
}

impl QueryOutcome {
    pub fn status(&self) -> QueryStatus {
        match self {
            QueryOutcome::Rows { .. } | QueryOutcome::Message { .. } => QueryStatus::Success,
            QueryOutcome::Error { .. } => QueryStatus::Error,
        }
    }
}

impl From<QueryResponse> for QueryOutcome {
    fn from(response: QueryResponse) -> Self {
        match response {
            QueryResponse::Rows { columns, rows } => QueryOutcome::Rows { columns, rows },
            QueryResponse::Message { message } => QueryOutcome::Message { message },
            QueryResponse::Error { error } => QueryOutcome::Error { error },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Error,
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStatus::Success => f.write_str("Success"),
            QueryStatus::Error => f.write_str("Error"),
        }
    }
}

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHistoryEntry {
    /// Monotonic from 1 for the lifetime of the log
    pub sequence: u64,
    pub query: String,
    pub submitted_at: DateTime<Utc>,
    pub status: QueryStatus,
    pub outcome: QueryOutcome,
}

impl QueryHistoryEntry {
    /// Query text cut to 50 characters, with an ellipsis when cut.
    pub fn summary(&self) -> String {
        let mut chars = self.query.chars();
        let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Most-recent-first log that evicts its oldest entry past `capacity`.
#[derive(Debug, Clone)]
pub struct QueryHistoryLog {
    entries: VecDeque<QueryHistoryEntry>,
    capacity: usize,
    last_sequence: u64,
}

impl QueryHistoryLog {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            last_sequence: 0,
        }
    }

    /// Record an execution under the next sequence number.
    pub fn append(
        &mut self,
        query: impl Into<String>,
        submitted_at: DateTime<Utc>,
        outcome: QueryOutcome,
    ) -> &QueryHistoryEntry {
        self.last_sequence += 1;
        self.entries.push_front(QueryHistoryEntry {
            sequence: self.last_sequence,
            query: query.into(),
            submitted_at,
            status: outcome.status(),
            outcome,
        });
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Restartable read view, newest first.
    pub fn entries(&self) -> HistoryView<'_> {
        HistoryView {
            entries: &self.entries,
        }
    }

    pub fn latest(&self) -> Option<&QueryHistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for QueryHistoryLog {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Borrowed view over the log. Each `iter()` starts again from the newest.
#[derive(Debug, Clone, Copy)]
pub struct HistoryView<'a> {
    entries: &'a VecDeque<QueryHistoryEntry>,
}

impl<'a> HistoryView<'a> {
    pub fn iter(&self) -> vec_deque::Iter<'a, QueryHistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, sequence: u64) -> Option<&'a QueryHistoryEntry> {
        self.entries.iter().find(|entry| entry.sequence == sequence)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for HistoryView<'a> {
    type Item = &'a QueryHistoryEntry;
    type IntoIter = vec_deque::Iter<'a, QueryHistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
