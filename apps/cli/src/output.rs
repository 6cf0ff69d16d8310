//! Output formatting for the CLI.

use bridge_client::Row;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use session_orchestrator::{QueryHistoryEntry, QueryOutcome, TabSummary, TabView};

/// Widest a grid cell is printed before it is cut.
const MAX_CELL_WIDTH: usize = 40;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Text form of one cell. SQL NULL prints as `NULL`.
pub fn cell(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    let text = text.replace(['\n', '\r'], " ");
    if text.chars().count() > MAX_CELL_WIDTH {
        let head: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        text
    }
}

/// Render rows as an aligned text grid in column order.
pub fn render_grid(columns: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|col| cell(row.get(col))).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(col.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(line(columns));
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(cells.iter().map(|row| line(row)));
    out.join("\n")
}

/// Render a tab's last view with its pager line.
pub fn render_tab(tab: &TabSummary) -> String {
    let body = match &tab.view {
        TabView::Loading => "Loading data...".to_string(),
        TabView::Empty => "No data found.".to_string(),
        TabView::Error { message } => format!("Error: {}", message),
        TabView::Rows { columns, rows } => render_grid(columns, rows),
    };
    let monitor = if tab.monitor_enabled { " [monitor]" } else { "" };
    let mut out = format!("== {}{} ==\n{}", tab.table_name, monitor, body);
    if tab.pagination.visible {
        let prev = if tab.pagination.has_previous { "<prev" } else { "     " };
        let next = if tab.pagination.has_next { "next>" } else { "" };
        out.push_str(&format!("\n{}  {}  {}", prev, tab.pagination.label(), next));
    }
    out
}

/// One-line status of a tab, used when a background refresh lands.
pub fn tab_status_line(tab: &TabSummary) -> String {
    let state = match &tab.view {
        TabView::Loading => "loading".to_string(),
        TabView::Empty => "no rows".to_string(),
        TabView::Error { message } => format!("error: {}", message),
        TabView::Rows { rows, .. } => format!("{} rows", rows.len()),
    };
    match tab.last_total {
        Some(total) => format!(
            "[{}] {} (page {}, total {})",
            tab.table_name, state, tab.pagination.page_number, total
        ),
        None => format!("[{}] {}", tab.table_name, state),
    }
}

/// Render a query outcome.
pub fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rows { columns, rows } if rows.is_empty() => {
            format!("{}\n(0 rows)", columns.join("  "))
        }
        QueryOutcome::Rows { columns, rows } => {
            format!("{}\n({} rows)", render_grid(columns, rows), rows.len())
        }
        QueryOutcome::Message { message } => message.clone(),
        QueryOutcome::Error { error } => format!("Error: {}", error),
    }
}

/// Collapsed history line: `#3 [14:02:11] SELECT ... Success`.
pub fn history_line(entry: &QueryHistoryEntry) -> String {
    let time = entry
        .submitted_at
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S");
    format!(
        "#{} [{}] {}  {}",
        entry.sequence,
        time,
        entry.summary(),
        entry.status
    )
}
