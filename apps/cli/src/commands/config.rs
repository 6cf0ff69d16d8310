//! Configuration display.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use viewer_config::{Config, Paths};

/// Show the effective configuration, optionally writing it to disk.
pub fn show_config(config: &Config, paths: &Paths, init: bool, format: &OutputFormat) -> Result<()> {
    if init {
        config.save(paths)?;
    }

    match format {
        OutputFormat::Text => {
            output::print_heading("Configuration");
            output::print_row("File", &paths.config_file().display().to_string());
            output::print_row("Log file", &paths.log_file().display().to_string());
            output::print_row("Bridge URL", &config.bridge_url);
            output::print_row("Log level", &config.log_level);
            output::print_row("Timeout", &format!("{}s", config.request_timeout_secs));
            output::print_row("Page size", &config.page_size.to_string());
            output::print_row("Monitor", &format!("{}ms", config.monitor_interval_ms));
            output::print_row("History", &config.history_capacity.to_string());
            output::print_row("Package limit", &config.package_render_limit.to_string());
            if init {
                println!("\nWrote {}", paths.config_file().display());
            }
        }
        OutputFormat::Json => output::print_json(config)?,
    }
    Ok(())
}
