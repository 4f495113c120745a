//! Telemetry pipeline — frame decode, derived metrics, freshness.
//!
//! The remote sensor node transmits a fixed-format ASCII frame over the
//! 433 MHz link. [`codec`] turns the raw bytes into a typed frame,
//! [`fill`] derives the tank level metrics, and [`freshness`] owns the
//! latest accepted reading and the "no data yet" contract.

pub mod codec;
pub mod fill;
pub mod freshness;

pub use codec::TelemetryFrame;
pub use freshness::{FreshnessTracker, SensorReading};
