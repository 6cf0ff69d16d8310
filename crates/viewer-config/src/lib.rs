//! Configuration, file system paths and logging bootstrap for dbtap.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_BRIDGE_URL, DEFAULT_HISTORY_CAPACITY, DEFAULT_LOG_LEVEL,
    DEFAULT_MONITOR_INTERVAL_MS, DEFAULT_PACKAGE_RENDER_LIMIT, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::{ConfigError, ConfigResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
