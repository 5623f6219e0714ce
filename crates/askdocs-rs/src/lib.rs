//! Public surface for askdocs.
//!
//! This crate re-exports the building blocks and provides the startup
//! helpers shared by the `askdocs` binary: config loading, secrets lookup,
//! retrieval client construction, and the one-shot `ask` flow.

mod bootstrap;
mod oneshot;

/// Re-export for convenience.
pub use askdocs_rs_config as config;
pub use askdocs_rs_core as core;
/// Re-export for convenience.
pub use askdocs_rs_protocol as protocol;
pub use askdocs_rs_tui as tui;

pub use bootstrap::{build_retrieval_client, fetch_secrets, load_config};
pub use oneshot::{AskReport, ask_once};

/// Environment variable consulted for the access password in one-shot mode.
pub const PASSWORD_ENV: &str = "ASKDOCS_PASSWORD";

/// Initialize `env_logger` with millisecond timestamps, honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
