//! Client side of the device-database bridge.
//!
//! This crate provides:
//! - Wire types for devices, packages, snapshots, table pages and query results
//! - `RemoteBridge`: the request/response contract the session layer consumes
//! - `HttpBridge`: the reqwest implementation talking to the bridge's REST API

mod bridge;
mod error;
mod http;
mod types;

pub use bridge::RemoteBridge;
pub use error::{BridgeError, BridgeResult};
pub use http::HttpBridge;
pub use types::{
    DatabaseSnapshotToken, Debuggable, Device, PackageEntry, PackageFilter, PullResponse,
    PullTarget, QueryResponse, Row, TablePage,
};
