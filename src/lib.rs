//! ACI Interface Policy Group Tool - Rust Library
//!
//! Declaratively manages Cisco ACI leaf interface policy groups
//! (`infraAccPortGrp` / `infraAccBndlGrp`) through the APIC REST API.

pub mod aci;
pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod policy_group;

pub use error::{AppError, Result};

/// Initialize logging
///
/// `verbose` raises the default level from WARN to DEBUG; `RUST_LOG` still
/// takes precedence for individual targets.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
