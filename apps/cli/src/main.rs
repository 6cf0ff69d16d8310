//! dbtap CLI - browse Android app databases through the bridge service.

mod commands;
mod output;
mod shell;

use clap::{Parser, Subcommand};
use tracing::debug;
use viewer_config::{Config, Paths};

/// dbtap - inspect SQLite databases of apps on attached Android devices.
#[derive(Parser)]
#[command(name = "dbtap")]
#[command(about = "Browse device databases through a dbtap bridge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Bridge service base URL
    #[arg(long, env = "DBTAP_BRIDGE_URL", global = true)]
    bridge_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DBTAP_LOG_LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached devices
    Devices,

    /// List packages of a device
    Packages {
        /// Device serial
        device: String,
        /// Case-insensitive substring filter
        #[arg(short, long)]
        search: Option<String>,
        /// Only show packages known to be debuggable
        #[arg(short, long)]
        debuggable_only: bool,
    },

    /// List database files of a package
    Databases {
        device: String,
        package: String,
    },

    /// Pull a database and list its tables
    Tables {
        device: String,
        package: String,
        db: String,
    },

    /// Read one page of a table
    Read {
        device: String,
        package: String,
        db: String,
        table: String,
        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: u64,
    },

    /// Run a SQL statement against a pulled database
    Query {
        device: String,
        package: String,
        db: String,
        sql: String,
    },

    /// Interactive session (default)
    Shell,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let mut config = Config::load(&paths)?;
    if let Some(url) = cli.bridge_url {
        config.bridge_url = url;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    if let Err(e) = paths.ensure_dirs() {
        eprintln!("Warning: could not create {}: {}", paths.base_dir().display(), e);
    }
    let level = viewer_config::parse_level(&config.log_level)
        .to_string()
        .to_lowercase();
    viewer_config::init_logging("dbtap", &level, &paths, false);
    debug!(bridge_url = %config.bridge_url, "Starting dbtap");

    let format = cli.format;
    let command = cli.command.unwrap_or(Commands::Shell);

    if let Commands::Config { init } = command {
        return commands::show_config(&config, &paths, init, &format);
    }

    let manager = commands::connect(&config)?;
    match command {
        Commands::Devices => commands::devices(&manager, &format).await,
        Commands::Packages {
            device,
            search,
            debuggable_only,
        } => {
            commands::packages(
                &manager,
                &device,
                search.as_deref(),
                debuggable_only,
                &format,
            )
            .await
        }
        Commands::Databases { device, package } => {
            commands::databases(&manager, &device, &package, &format).await
        }
        Commands::Tables {
            device,
            package,
            db,
        } => commands::tables(&manager, &device, &package, &db, &format).await,
        Commands::Read {
            device,
            package,
            db,
            table,
            page,
        } => {
            let target = commands::DatabaseArgs::new(device, package, db);
            commands::read(&manager, &target, &table, page, &format).await
        }
        Commands::Query {
            device,
            package,
            db,
            sql,
        } => {
            let target = commands::DatabaseArgs::new(device, package, db);
            commands::query(&manager, &target, &sql, &format).await
        }
        Commands::Shell => shell::run(manager, format).await,
        Commands::Config { .. } => Ok(()),
    }
}
