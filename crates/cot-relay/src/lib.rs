/// Position report relay library.
///
/// Incoming [`model::PositionReport`]s are *encoded* into Cursor-on-Target XML events by
/// [`protocol::cot`] and *transmitted* as UDP datagrams by a [`transport::CotSink`].
/// [`relay::Relay`] ties the two together for a batch of reports, and [`server`] exposes the
/// whole thing over HTTP.
use std::sync::Once;

use thiserror::Error;

pub mod config;
pub mod coord;
pub mod model;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod transport;

/// Result type for this library
pub type RelayResult<T> = std::result::Result<T, Error>;

/// Error type for this library
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid coordinate: {0}")]
    InvalidCoord(String),
    #[error("Invalid report: {0}")]
    InvalidReport(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Stale time out of range: {stale_minutes} minutes after {time}")]
    StaleOutOfRange { time: String, stale_minutes: u32 },
    #[error("Send error: {0}")]
    Send(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// Test binary helper to init tracing. This is usually the responsibility of the consumer of the
/// library crate.
pub fn lazy_init_tracing() {
    {
        static INIT: Once = Once::new();
        &INIT
    }
    .call_once(|| {
        tracing_subscriber::fmt::init();
    });
}
