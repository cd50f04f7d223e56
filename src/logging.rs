//! Tracing setup
//!
//! Everything goes to stderr, filtered by `RUST_LOG` (default `info`). Events
//! under the `pgos::rdt` target are also written to a separate diagnostic
//! file, truncated at startup, so RDT problems can be inspected after a run.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::error::{Error, Result};

/// Target of the RDT diagnostic events
pub const RDT_TARGET: &str = "pgos::rdt";

/// Install the global subscriber. Fails if one is already installed or the
/// diagnostic file cannot be opened.
pub fn init(rdt_log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(rdt_log_path)
        .map_err(|e| Error::logging(format!("{}: {e}", rdt_log_path.display())))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_filter(env_filter);

    let rdt_file = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(Targets::new().with_target(RDT_TARGET, Level::TRACE));

    tracing_subscriber::registry()
        .with(stderr)
        .with(rdt_file)
        .try_init()
        .map_err(|e| Error::logging(e.to_string()))
}
