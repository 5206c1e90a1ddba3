//! Custos CLI library.
//!
//! Configuration loading, store setup, command execution and output
//! formatting for the `custos` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod indexer;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use indexer::SessionIndexer;
pub use output::Formatter;

use custos_store::{Audited, SqliteStore};
use tracing_subscriber::EnvFilter;

/// Store used by every command: SQLite behind the audit decorator
pub type Store = Audited<SqliteStore>;

/// Open (creating if needed) the database at `path`
pub fn open_store(path: &str) -> Result<Store> {
    let store = SqliteStore::new(path)?;
    tracing::debug!(path, "Opened store");
    Ok(Audited::new(store))
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the configured filter.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
