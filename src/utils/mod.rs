pub mod build_info;

use std::{path::PathBuf, sync::Once};

use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DUEBOOK_DATA_DIR";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "duebook=info".parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
        // Another subscriber may already be installed by an embedding application.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Base directory for configuration and, unless configured otherwise, data.
///
/// `DUEBOOK_DATA_DIR` wins over the platform config directory.
pub fn default_base_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duebook")
}

/// Explicit data directory from the environment, if any.
pub fn data_dir_override() -> Option<PathBuf> {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
