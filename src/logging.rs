use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Error, Result};

/// Sends tracing output to `path`; the terminal belongs to the UI. `RUST_LOG`
/// wins over `level`.
pub fn init(level: &str, format: &str, path: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let writer = Mutex::new(file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match format {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init(),
        _ => fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init(),
    };

    result.map_err(|err| Error::Logging(err.to_string()))
}
