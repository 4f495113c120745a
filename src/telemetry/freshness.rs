//! Latest-reading ownership and the "no data yet" contract.
//!
//! The tracker is the sole owner of the most recent [`SensorReading`].
//! Readings are replaced wholesale by the next accepted frame — there is
//! no merging of partial fields. Until the first frame arrives, every
//! sensor-derived display field renders a placeholder instead of a number;
//! that substitution is part of the product behaviour, not a UI nicety.

use super::codec::TelemetryFrame;

/// Placeholder shown on the status page before the first reading arrives.
/// The literal matches the shipped web assets.
pub const DEFAULT_NO_DATA_TEXT: &str = "cekam na data...";

/// A validated sensor reading with its arrival stamp.
///
/// Immutable once constructed; the tracker replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    pub humidity: f32,
    pub temperature_c: f32,
    pub distance_cm: u32,
    pub battery_percent: i32,
    pub battery_voltage: f32,
    /// Monotonic uptime at arrival, milliseconds.
    pub received_at_ms: u64,
}

/// Tracks the most recent reading and whether any reading ever arrived.
#[derive(Debug, Default)]
pub struct FreshnessTracker {
    latest: Option<SensorReading>,
    /// Set exactly once, never cleared.
    ever_received: bool,
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a decoded frame, stamping it with the arrival time.
    pub fn record(&mut self, frame: TelemetryFrame, now_ms: u64) {
        self.latest = Some(SensorReading {
            humidity: frame.humidity,
            temperature_c: frame.temperature_c,
            distance_cm: frame.distance_cm,
            battery_percent: frame.battery_percent,
            battery_voltage: frame.battery_voltage,
            received_at_ms: now_ms,
        });
        self.ever_received = true;
    }

    /// Whether any reading has ever been accepted.
    pub fn has_data(&self) -> bool {
        self.ever_received
    }

    /// The most recent reading, if any.
    pub fn latest(&self) -> Option<&SensorReading> {
        self.latest.as_ref()
    }

    /// Elapsed time since the last reading. `None` before the first one.
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.latest
            .as_ref()
            .map(|r| now_ms.saturating_sub(r.received_at_ms))
    }

    /// Whole minutes since the last reading. `None` before the first one.
    pub fn minutes_since_last(&self, now_ms: u64) -> Option<u64> {
        self.age_ms(now_ms).map(|ms| ms / 60_000)
    }

    /// Freshness gate for display values.
    ///
    /// With data present, returns `value`. Without data, returns the
    /// supplied fallback verbatim, or [`DEFAULT_NO_DATA_TEXT`] when no
    /// fallback is given.
    pub fn gate(&self, value: String, fallback: Option<&str>) -> String {
        if self.ever_received {
            value
        } else {
            fallback.unwrap_or(DEFAULT_NO_DATA_TEXT).to_owned()
        }
    }
}
