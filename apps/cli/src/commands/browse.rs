//! Device, package, database and table listings.

use super::{ensure_ok, open_database, select_device, select_package, DatabaseArgs};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use bridge_client::Debuggable;
use session_orchestrator::{Region, SessionManager};

/// List attached devices.
pub async fn devices(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    manager.refresh_devices().await;
    ensure_ok(manager, Region::Devices)?;
    let devices = manager.snapshot().devices;

    match format {
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices found");
            } else {
                println!("{:<24} {:<14} {}", "ID", "Status", "Root");
                println!("{}", "-".repeat(50));
                for device in &devices {
                    let root = if device.rooted { "yes" } else { "no" };
                    println!("{:<24} {:<14} {}", device.id, device.status, root);
                }
            }
        }
        OutputFormat::Json => output::print_json(&devices)?,
    }
    Ok(())
}

/// List packages of a device, filtered client-side.
pub async fn packages(
    manager: &SessionManager,
    device: &str,
    search: Option<&str>,
    debuggable_only: bool,
    format: &OutputFormat,
) -> Result<()> {
    select_device(manager, device).await?;
    if let Some(term) = search {
        manager.set_package_search(term);
    }
    manager.resolve_visible_debuggable().await;
    manager.set_only_debuggable(debuggable_only);

    let snapshot = manager.snapshot();
    match format {
        OutputFormat::Text => {
            if let Some(status) = &snapshot.root_status {
                output::print_row("Device", device);
                output::print_row("Root", status);
            }
            output::print_heading(&format!(
                "Packages ({} shown of {})",
                snapshot.packages.len(),
                snapshot.package_count
            ));
            for package in &snapshot.packages {
                let badge = match package.debuggable {
                    Debuggable::Yes => "  [debug]",
                    Debuggable::No | Debuggable::Unknown => "",
                };
                println!("{}{}", package.name, badge);
            }
        }
        OutputFormat::Json => output::print_json(&snapshot.packages)?,
    }
    Ok(())
}

/// List database files of a package.
pub async fn databases(
    manager: &SessionManager,
    device: &str,
    package: &str,
    format: &OutputFormat,
) -> Result<()> {
    select_package(manager, device, package).await?;
    let snapshot = manager.snapshot();
    let databases = snapshot.databases.unwrap_or_default();

    match format {
        OutputFormat::Text => match &snapshot.database_notice {
            Some(notice) => println!("{}", notice),
            None => {
                for db in &databases {
                    println!("{}", db);
                }
            }
        },
        OutputFormat::Json => output::print_json(&databases)?,
    }
    Ok(())
}

/// Pull a database and list its tables with their sampled columns.
pub async fn tables(
    manager: &SessionManager,
    device: &str,
    package: &str,
    db: &str,
    format: &OutputFormat,
) -> Result<()> {
    let target = DatabaseArgs::new(device.to_string(), package.to_string(), db.to_string());
    open_database(manager, &target).await?;
    let snapshot = manager.snapshot();

    match format {
        OutputFormat::Text => {
            if let Some(token) = &snapshot.token {
                output::print_row("Snapshot", token.as_str());
            }
            output::print_heading("Tables");
            for table in snapshot.tables.iter().flatten() {
                match snapshot.column_hints.get(table) {
                    Some(columns) => println!("{:<24} {}", table, columns.join(", ")),
                    None => println!("{}", table),
                }
            }
        }
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "token": snapshot.token,
            "tables": snapshot.tables,
            "columns": snapshot.column_hints,
        }))?,
    }
    Ok(())
}
