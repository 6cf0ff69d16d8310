//! Interactive shell over one long-lived session.
//!
//! Commands are read line by line from stdin. Background changes (monitor
//! ticks, inline errors, prompts) are printed as they arrive.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use bridge_client::Debuggable;
use session_orchestrator::{
    ActiveView, PageDirection, QueryDispatch, SessionManager, ViewEvent,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info};

const HELP: &str = "\
Selection:
  devices                     reload and list devices
  device <id>                 select a device
  packages                    list packages (resolves debuggable flags)
  search [term]               filter packages by name (empty clears)
  debuggable on|off           only show debuggable packages
  package <name>              select a package and list its databases
  db <name>                   pull a database and list its tables
  tables                      list tables of the current snapshot
Tabs (table defaults to the active tab):
  open <table>                open or focus a table tab
  close [table]               close a tab
  next [table] / prev [table] change page
  page [table] <n>            jump to page n
  refresh [table]             pull and reload
  monitor [table] on|off      periodic pull and reload
  show [table]                print a tab
  tabs                        list open tabs
Query console:
  sql <statement>             run a statement
  history [n]                 list history, or show entry n
Other:
  status                      session overview
  ok                          dismiss a prompt
  help                        this text
  quit                        leave";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Quit,
    Devices,
    Device(String),
    Packages,
    Search(String),
    OnlyDebuggable(bool),
    Package(String),
    Database(String),
    Tables,
    Open(String),
    Close(Option<String>),
    Page(Option<String>, PageDirection),
    GoTo(Option<String>, u64),
    Refresh(Option<String>),
    Monitor(Option<String>, bool),
    Show(Option<String>),
    Tabs,
    Sql(String),
    History(Option<u64>),
    Status,
    Dismiss,
}

fn parse_switch(word: &str) -> Result<bool, String> {
    match word {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(format!("Expected on or off, got '{}'", other)),
    }
}

fn parse(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let optional = |index: usize| args.get(index).map(|arg| arg.to_string());
    let required = |what: &str| {
        args.first()
            .map(|arg| arg.to_string())
            .ok_or_else(|| format!("Usage: {} <{}>", word, what))
    };

    let command = match word.to_lowercase().as_str() {
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        "devices" => ShellCommand::Devices,
        "device" => ShellCommand::Device(required("id")?),
        "packages" => ShellCommand::Packages,
        "search" => ShellCommand::Search(rest.to_string()),
        "debuggable" => ShellCommand::OnlyDebuggable(parse_switch(
            args.first().copied().unwrap_or("on"),
        )?),
        "package" => ShellCommand::Package(required("name")?),
        "db" => ShellCommand::Database(required("name")?),
        "tables" => ShellCommand::Tables,
        "open" => ShellCommand::Open(required("table")?),
        "close" => ShellCommand::Close(optional(0)),
        "next" => ShellCommand::Page(optional(0), PageDirection::Next),
        "prev" | "previous" => ShellCommand::Page(optional(0), PageDirection::Previous),
        "page" => {
            let (table, number) = match args.as_slice() {
                [number] => (None, number),
                [table, number] => (Some(table.to_string()), number),
                _ => return Err("Usage: page [table] <n>".to_string()),
            };
            let number = number
                .parse()
                .map_err(|_| format!("Not a page number: {}", number))?;
            ShellCommand::GoTo(table, number)
        }
        "refresh" => ShellCommand::Refresh(optional(0)),
        "monitor" => match args.as_slice() {
            [switch] => ShellCommand::Monitor(None, parse_switch(switch)?),
            [table, switch] => ShellCommand::Monitor(Some(table.to_string()), parse_switch(switch)?),
            _ => return Err("Usage: monitor [table] on|off".to_string()),
        },
        "show" => ShellCommand::Show(optional(0)),
        "tabs" => ShellCommand::Tabs,
        "sql" if rest.is_empty() => return Err("Usage: sql <statement>".to_string()),
        "sql" => ShellCommand::Sql(rest.to_string()),
        "history" => match args.first() {
            Some(n) => ShellCommand::History(Some(
                n.trim_start_matches('#')
                    .parse()
                    .map_err(|_| format!("Not a history number: {}", n))?,
            )),
            None => ShellCommand::History(None),
        },
        "status" => ShellCommand::Status,
        "ok" | "dismiss" => ShellCommand::Dismiss,
        other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
    };
    Ok(command)
}

/// Run the shell until `quit` or end of input.
pub async fn run(manager: SessionManager, format: OutputFormat) -> Result<()> {
    let printer = tokio::spawn(print_events(
        manager.clone(),
        manager.subscribe(),
        format,
    ));
    info!("Shell started");

    if let OutputFormat::Text = format {
        println!("dbtap shell. Type 'help' for commands.");
    }
    manager.refresh_devices().await;
    print_devices(&manager, &format)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if let OutputFormat::Text = format {
            print!("dbtap> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => {
                debug!(?command, "Shell command");
                if let Err(e) = execute(&manager, command, &format).await {
                    output::print_error(&format!("{:#}", e), &format);
                }
            }
            Err(message) => output::print_error(&message, &format),
        }
    }

    printer.abort();
    info!("Shell finished");
    Ok(())
}

/// Resolve an optional table argument against the active tab.
fn table_or_active(manager: &SessionManager, table: Option<String>) -> Result<String> {
    match (table, manager.active_view()) {
        (Some(table), _) => Ok(table),
        (None, ActiveView::Table(table)) => Ok(table),
        (None, ActiveView::QueryConsole) => anyhow::bail!("No table tab is active"),
    }
}

async fn execute(manager: &SessionManager, command: ShellCommand, format: &OutputFormat) -> Result<()> {
    match command {
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => {}
        ShellCommand::Devices => {
            manager.refresh_devices().await;
            print_devices(manager, format)?;
        }
        ShellCommand::Device(id) => {
            manager.select_device(&id).await;
            manager.resolve_visible_debuggable().await;
            print_packages(manager, format)?;
        }
        ShellCommand::Packages => {
            manager.resolve_visible_debuggable().await;
            print_packages(manager, format)?;
        }
        ShellCommand::Search(term) => {
            manager.set_package_search(&term);
            manager.resolve_visible_debuggable().await;
            print_packages(manager, format)?;
        }
        ShellCommand::OnlyDebuggable(flag) => {
            manager.set_only_debuggable(flag);
            print_packages(manager, format)?;
        }
        ShellCommand::Package(name) => {
            manager.select_package(&name).await?;
            let snapshot = manager.snapshot();
            match format {
                OutputFormat::Text => match (&snapshot.database_notice, &snapshot.databases) {
                    (Some(notice), _) => println!("{}", notice),
                    (None, Some(databases)) => databases.iter().for_each(|db| println!("  {}", db)),
                    (None, None) => {}
                },
                OutputFormat::Json => output::print_json(&snapshot.databases)?,
            }
        }
        ShellCommand::Database(name) => {
            manager.open_database(&name).await?;
            print_tables(manager, format)?;
        }
        ShellCommand::Tables => {
            manager.list_tables().await?;
            print_tables(manager, format)?;
        }
        ShellCommand::Open(table) => {
            manager.open_table(&table).await?;
            print_tab(manager, &table, format)?;
        }
        ShellCommand::Close(table) => {
            let table = table_or_active(manager, table)?;
            manager.close_table(&table)?;
        }
        ShellCommand::Page(table, direction) => {
            let table = table_or_active(manager, table)?;
            manager.change_page(&table, direction).await?;
            print_tab(manager, &table, format)?;
        }
        ShellCommand::GoTo(table, number) => {
            let table = table_or_active(manager, table)?;
            manager.go_to_page(&table, number).await?;
            print_tab(manager, &table, format)?;
        }
        ShellCommand::Refresh(table) => {
            let table = table_or_active(manager, table)?;
            manager.refresh_table(&table).await?;
            print_tab(manager, &table, format)?;
        }
        ShellCommand::Monitor(table, enabled) => {
            let table = table_or_active(manager, table)?;
            manager.set_monitor(&table, enabled).await?;
            if let OutputFormat::Text = format {
                let state = if enabled { "on" } else { "off" };
                println!("Monitor {} for {}", state, table);
            }
        }
        ShellCommand::Show(table) => {
            let table = table_or_active(manager, table)?;
            print_tab(manager, &table, format)?;
        }
        ShellCommand::Tabs => {
            let tabs = manager.snapshot().tabs;
            match format {
                OutputFormat::Text => {
                    if tabs.is_empty() {
                        println!("No open tabs");
                    }
                    for tab in &tabs {
                        println!("{}", output::tab_status_line(tab));
                    }
                }
                OutputFormat::Json => output::print_json(&tabs)?,
            }
        }
        ShellCommand::Sql(statement) => {
            manager.activate_console();
            if let QueryDispatch::Recorded(sequence) = manager.execute_query(&statement).await {
                let entry = manager.with_history(|history| history.get(sequence).cloned());
                if let Some(entry) = entry {
                    match format {
                        OutputFormat::Text => {
                            println!("{}", output::history_line(&entry));
                            println!("{}", output::render_outcome(&entry.outcome));
                        }
                        OutputFormat::Json => output::print_json(&entry)?,
                    }
                }
            }
        }
        ShellCommand::History(None) => {
            let entries = manager.history();
            match format {
                OutputFormat::Text => {
                    if entries.is_empty() {
                        println!("No queries yet");
                    }
                    for entry in &entries {
                        println!("{}", output::history_line(entry));
                    }
                }
                OutputFormat::Json => output::print_json(&entries)?,
            }
        }
        ShellCommand::History(Some(sequence)) => {
            let entry = manager
                .with_history(|history| history.get(sequence).cloned())
                .ok_or_else(|| anyhow::anyhow!("No history entry #{}", sequence))?;
            match format {
                OutputFormat::Text => {
                    println!("{}", output::history_line(&entry));
                    println!("{}", entry.query);
                    output::print_divider();
                    println!("{}", output::render_outcome(&entry.outcome));
                }
                OutputFormat::Json => output::print_json(&entry)?,
            }
        }
        ShellCommand::Status => print_status(manager, format)?,
        ShellCommand::Dismiss => manager.dismiss_prompt(),
    }
    Ok(())
}

fn print_devices(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let devices = manager.snapshot().devices;
    match format {
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices found");
            }
            for device in &devices {
                let root = if device.rooted { "  [root]" } else { "" };
                println!("  {:<24} {}{}", device.id, device.status, root);
            }
        }
        OutputFormat::Json => output::print_json(&devices)?,
    }
    Ok(())
}

fn print_packages(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let snapshot = manager.snapshot();
    match format {
        OutputFormat::Text => {
            if let Some(status) = &snapshot.root_status {
                println!("{}", status);
            }
            for package in &snapshot.packages {
                let badge = match package.debuggable {
                    Debuggable::Yes => "  [debug]",
                    Debuggable::No | Debuggable::Unknown => "",
                };
                println!("  {}{}", package.name, badge);
            }
            println!(
                "({} shown of {})",
                snapshot.packages.len(),
                snapshot.package_count
            );
        }
        OutputFormat::Json => output::print_json(&snapshot.packages)?,
    }
    Ok(())
}

fn print_tables(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let snapshot = manager.snapshot();
    match format {
        OutputFormat::Text => {
            for table in snapshot.tables.iter().flatten() {
                match snapshot.column_hints.get(table) {
                    Some(columns) => println!("  {:<24} {}", table, columns.join(", ")),
                    None => println!("  {}", table),
                }
            }
        }
        OutputFormat::Json => output::print_json(&snapshot.tables)?,
    }
    Ok(())
}

fn print_tab(manager: &SessionManager, table: &str, format: &OutputFormat) -> Result<()> {
    let tab = manager
        .tab(table)
        .ok_or_else(|| anyhow::anyhow!("No open tab for table '{}'", table))?;
    match format {
        OutputFormat::Text => println!("{}", output::render_tab(&tab)),
        OutputFormat::Json => output::print_json(&tab)?,
    }
    Ok(())
}

fn print_status(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let snapshot = manager.snapshot();
    if let OutputFormat::Json = format {
        return output::print_json(&snapshot);
    }

    output::print_heading("Session");
    output::print_row("Device", snapshot.selected_device.as_deref().unwrap_or("-"));
    if let Some(status) = &snapshot.root_status {
        output::print_row("Root", status);
    }
    output::print_row(
        "Package",
        snapshot.selected_package.as_deref().unwrap_or("-"),
    );
    let database = snapshot
        .pull_target
        .as_ref()
        .map(|target| target.to_string())
        .unwrap_or_else(|| "-".to_string());
    output::print_row("Database", &database);
    let token = snapshot
        .token
        .as_ref()
        .map(|token| token.to_string())
        .unwrap_or_else(|| "-".to_string());
    output::print_row("Snapshot", &token);
    let active = match &snapshot.active_view {
        ActiveView::QueryConsole => "query console".to_string(),
        ActiveView::Table(table) => table.clone(),
    };
    output::print_row("Active", &active);
    output::print_row("Tabs", &snapshot.tabs.len().to_string());
    output::print_row("History", &manager.history().len().to_string());
    if let Some(prompt) = &snapshot.prompt {
        output::print_row("Prompt", prompt);
    }
    for error in &snapshot.inline_errors {
        output::print_row(&error.region.to_string(), &error.message);
    }
    Ok(())
}

/// Print background changes: monitor refreshes, inline errors and prompts.
async fn print_events(
    manager: SessionManager,
    mut events: broadcast::Receiver<ViewEvent>,
    format: OutputFormat,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event printer lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match (&event, format) {
            (ViewEvent::TabUpdated { table }, _) => {
                let Some(tab) = manager.tab(table) else { continue };
                if !tab.monitor_enabled {
                    continue;
                }
                match format {
                    OutputFormat::Text => println!("\n{}", output::tab_status_line(&tab)),
                    OutputFormat::Json => {
                        println!("{}", serde_json::json!({ "event": "monitor", "tab": tab }))
                    }
                }
            }
            (ViewEvent::InlineError { region, message }, OutputFormat::Text) => {
                eprintln!("\n[{}] {}", region, message);
            }
            (ViewEvent::Prompt { message }, OutputFormat::Text) => {
                eprintln!("\n! {} (type 'ok' to dismiss)", message);
            }
            (ViewEvent::InlineError { .. } | ViewEvent::Prompt { .. }, OutputFormat::Json) => {
                if let Ok(line) = serde_json::to_string(&event) {
                    eprintln!("{}", line);
                }
            }
            _ => {}
        }
    }
}
