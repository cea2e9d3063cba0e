/// File logging via tracing.
///
/// The terminal belongs to the game, so nothing is ever logged to stdout or
/// stderr. Without a `[log] file` no subscriber is installed and every
/// tracing macro is a no-op. `RUST_LOG` overrides the configured level.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

pub fn init(cfg: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &cfg.file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())?;

    tracing::info!(path = %path.display(), "logging started");
    Ok(())
}
