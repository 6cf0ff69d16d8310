//! CLI command implementations.

mod browse;
mod config;
mod table;

pub use browse::{databases, devices, packages, tables};
pub use config::show_config;
pub use table::{query, read};

use anyhow::Result;
use bridge_client::HttpBridge;
use session_orchestrator::{Region, SessionManager, SessionSettings};
use std::sync::Arc;
use viewer_config::Config;

/// Session tunables taken from the configuration.
pub fn session_settings(config: &Config) -> SessionSettings {
    SessionSettings {
        page_size: config.page_size,
        monitor_interval: config.monitor_interval(),
        history_capacity: config.history_capacity,
        package_render_limit: config.package_render_limit,
    }
}

/// Build a session over the configured bridge.
pub fn connect(config: &Config) -> Result<SessionManager> {
    let bridge = HttpBridge::new(config.bridge_url()?, config.request_timeout())?;
    Ok(SessionManager::new(
        Arc::new(bridge),
        session_settings(config),
    ))
}

/// Fail with the inline error a region is showing, if any.
pub fn ensure_ok(manager: &SessionManager, region: Region) -> Result<()> {
    match manager.inline_error(&region) {
        Some(message) => anyhow::bail!("{}", message),
        None => Ok(()),
    }
}

/// The (device, package, database) a one-shot command works on.
pub struct DatabaseArgs {
    pub device: String,
    pub package: String,
    pub db: String,
}

impl DatabaseArgs {
    pub fn new(device: String, package: String, db: String) -> Self {
        Self {
            device,
            package,
            db,
        }
    }
}

/// Walk the selection cascade down to the device's package list.
async fn select_device(manager: &SessionManager, device: &str) -> Result<()> {
    manager.refresh_devices().await;
    ensure_ok(manager, Region::Devices)?;
    manager.select_device(device).await;
    ensure_ok(manager, Region::Packages)
}

/// Walk the selection cascade down to the package's database list.
async fn select_package(manager: &SessionManager, device: &str, package: &str) -> Result<()> {
    select_device(manager, device).await?;
    manager.select_package(package).await?;
    ensure_ok(manager, Region::Databases)
}

/// Pull the database and list its tables.
async fn open_database(manager: &SessionManager, target: &DatabaseArgs) -> Result<()> {
    select_package(manager, &target.device, &target.package).await?;
    manager.open_database(&target.db).await?;
    ensure_ok(manager, Region::Databases)?;
    ensure_ok(manager, Region::Tables)
}
