//! Field extraction, validation and accuracy scoring against document taxonomies.
//!
//! Extraction produces field values per document, post-processing normalizes
//! them, validation checks them against the taxonomy, and scoring compares
//! them with human labels. Every database-touching function takes an explicit
//! `rusqlite::Connection`.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default filter.
/// Returns false when a subscriber was already installed.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} logging initialized", config::APP_NAME, config::APP_VERSION);
    }
    installed
}
