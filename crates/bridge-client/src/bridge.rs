//! The request/response contract of the device-database bridge.

use crate::{
    BridgeResult, DatabaseSnapshotToken, Device, PackageEntry, PackageFilter, PullResponse,
    PullTarget, QueryResponse, TablePage,
};
use async_trait::async_trait;

/// Remote service that lists devices, pulls database snapshots and reads them.
///
/// Every call is a single request with a single response. Implementations
/// never retry.
#[async_trait]
pub trait RemoteBridge: Send + Sync {
    async fn list_devices(&self) -> BridgeResult<Vec<Device>>;

    async fn list_packages(
        &self,
        device_id: &str,
        filter: PackageFilter,
    ) -> BridgeResult<Vec<PackageEntry>>;

    async fn resolve_debuggable(&self, device_id: &str, package_name: &str) -> BridgeResult<bool>;

    /// Database file names of a package. Empty when access is denied.
    async fn list_databases(&self, device_id: &str, package_name: &str)
        -> BridgeResult<Vec<String>>;

    /// Copy the device's database into a readable snapshot.
    async fn pull_database(&self, target: &PullTarget) -> BridgeResult<PullResponse>;

    async fn list_tables(&self, token: &DatabaseSnapshotToken) -> BridgeResult<Vec<String>>;

    async fn read_table(
        &self,
        token: &DatabaseSnapshotToken,
        table_name: &str,
        limit: u64,
        offset: u64,
    ) -> BridgeResult<TablePage>;

    async fn execute_query(
        &self,
        token: &DatabaseSnapshotToken,
        query: &str,
    ) -> BridgeResult<QueryResponse>;
}
