//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claim audit test suite.
//!
//! # Modules
//!
//! - `mocks`: Scripted language model and in-memory retrievers
//! - `fixtures`: Claim documents, catalog excerpts and model replies
//! - `builders`: Builder patterns for result sets
//! - `assertions`: Custom assertion helpers for results and reports
//! - `generators`: Property-based test data generators

pub mod mocks;
pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use mocks::*;
pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;

use once_cell::sync::OnceCell;

static TRACING: OnceCell<()> = OnceCell::new();

/// Installs a fmt subscriber filtered by `RUST_LOG`, once per test binary
pub fn init_test_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
