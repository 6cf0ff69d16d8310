//! Table reads and ad hoc queries.

use super::{open_database, DatabaseArgs};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use session_orchestrator::{QueryDispatch, SessionManager, TabView};

/// Print one page of a table.
pub async fn read(
    manager: &SessionManager,
    target: &DatabaseArgs,
    table: &str,
    page: u64,
    format: &OutputFormat,
) -> Result<()> {
    if page == 0 {
        anyhow::bail!("Pages are numbered from 1");
    }
    open_database(manager, target).await?;
    manager.open_table(table).await?;
    if page > 1 {
        manager.go_to_page(table, page).await?;
    }

    let tab = manager
        .tab(table)
        .with_context(|| format!("Table '{}' is not open", table))?;
    if let TabView::Error { message } = &tab.view {
        anyhow::bail!("{}", message);
    }

    match format {
        OutputFormat::Text => println!("{}", output::render_tab(&tab)),
        OutputFormat::Json => output::print_json(&tab)?,
    }
    Ok(())
}

/// Run one statement and print its recorded outcome.
pub async fn query(
    manager: &SessionManager,
    target: &DatabaseArgs,
    sql: &str,
    format: &OutputFormat,
) -> Result<()> {
    open_database(manager, target).await?;

    let sequence = match manager.execute_query(sql).await {
        QueryDispatch::Recorded(sequence) => sequence,
        QueryDispatch::Prompted => {
            anyhow::bail!("{}", manager.prompt().unwrap_or_default())
        }
    };
    let entry = manager
        .with_history(|history| history.get(sequence).cloned())
        .context("Query result was evicted from history")?;

    match format {
        OutputFormat::Text => println!("{}", output::render_outcome(&entry.outcome)),
        OutputFormat::Json => output::print_json(&entry)?,
    }
    Ok(())
}
