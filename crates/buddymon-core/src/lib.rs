//! buddymon-core — buddyinfo to InfluxDB pipeline.
//!
//! Provides:
//! - `collector` — `/proc/buddyinfo` reading and parsing behind a mockable filesystem
//! - `point` — point encoding, per-cycle batch assembly, line-protocol rendering
//! - `writer` — batch destinations (InfluxDB over HTTP, in-memory)
//! - `config` — settings resolution from config file and overrides
//! - `dispatch` — the polling loop tying the above together

pub mod collector;
pub mod config;
pub mod dispatch;
pub mod point;
pub mod writer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
