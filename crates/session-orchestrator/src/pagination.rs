//! Offset/limit arithmetic for one table view.

use serde::Serialize;

/// Direction of a page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Previous,
    Next,
}

impl TryFrom<i32> for PageDirection {
    type Error = i32;

    /// `-1` and `+1` are the only valid steps.
    fn try_from(step: i32) -> Result<Self, Self::Error> {
        match step {
            -1 => Ok(PageDirection::Previous),
            1 => Ok(PageDirection::Next),
            other => Err(other),
        }
    }
}

/// Position of a view inside its table.
///
/// `offset` is always a multiple of `limit`. Moving back stops at zero;
/// moving forward is never checked against the table size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationCursor {
    offset: u64,
    limit: u64,
}

impl PaginationCursor {
    /// Cursor at the first page. A zero limit is raised to one.
    pub fn new(limit: u64) -> Self {
        Self {
            offset: 0,
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn previous_offset(&self) -> u64 {
        self.offset.saturating_sub(self.limit)
    }

    /// Unclamped: may point past the last row.
    pub fn next_offset(&self) -> u64 {
        self.offset.saturating_add(self.limit)
    }

    /// 1-based page index.
    pub fn page_number(&self) -> u64 {
        self.offset / self.limit + 1
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    pub fn has_next(&self, total: u64) -> bool {
        self.next_offset() < total
    }

    /// Move one page. Returns false when stepping back from the first page.
    pub fn step(&mut self, direction: PageDirection) -> bool {
        match direction {
            PageDirection::Previous if self.offset > 0 => {
                self.offset = self.previous_offset();
                true
            }
            PageDirection::Previous => false,
            PageDirection::Next => {
                self.offset = self.next_offset();
                true
            }
        }
    }

    /// Jump to a 1-based page. Page 0 is treated as the first page.
    pub fn seek(&mut self, page_number: u64) {
        self.offset = page_number.saturating_sub(1).saturating_mul(self.limit);
    }

    /// Pager state for a table holding `total` rows.
    pub fn display(&self, total: u64) -> PaginationDisplay {
        PaginationDisplay {
            visible: total > self.limit,
            page_number: self.page_number(),
            total,
            has_previous: self.has_previous(),
            has_next: self.has_next(total),
        }
    }
}

/// What the pager controls show after a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaginationDisplay {
    /// Hidden when the whole table fits on one page
    pub visible: bool,
    pub page_number: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationDisplay {
    pub fn label(&self) -> String {
        format!("Page {} (Total: {})", self.page_number, self.total)
    }
}
