//! Behaviour tests for the session manager against a scripted bridge.
//!
//! - `harness.rs`   - scripted in-memory bridge recording every call
//! - `selection.rs` - device → package → database cascade and pulls
//! - `tabs.rs`      - tab lifecycle and pagination
//! - `monitor.rs`   - periodic pull+fetch scheduling
//! - `query.rs`     - query console and history
//! - `races.rs`     - overlapping fetches and stale tokens

mod selection;
mod tabs;
