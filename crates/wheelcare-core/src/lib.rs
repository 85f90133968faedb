//! wheelcare-core library: the wheelchair inventory and beneficiary registry.

pub mod api;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod i18n;
pub mod id;
pub mod lock;
pub mod model;
pub mod page;
pub mod service;
pub mod store;
pub mod validate;

/// # Conventions
///
/// - **Errors**: Domain code returns [`error::Result`]; configuration and
///   wiring return `anyhow::Result` with context.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
/// - **State**: No globals. A [`service::Database`] is built from a store and
///   a clock and passed by value to [`api::Api`].
pub use api::{Api, Envelope};
pub use error::{Error, ErrorCode, Result};
pub use i18n::Locale;
pub use service::Database;
