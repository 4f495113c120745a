//! Radio frame decoder.
//!
//! Frames are plain ASCII, five comma-separated fields in transmit order:
//! humidity (float), temperature (float), distance (int, cm), battery
//! percent (int), battery voltage (float). The transmitter caps frames at
//! the RadioHead ASK message bound, so anything longer is line noise.
//!
//! Decoding is deliberately lenient: a frame with fewer than five fields
//! zero-fills the missing ones, and a field that fails numeric parsing
//! decodes to zero. The remote node is battery powered and the link is
//! lossy; a partially garbled sample is better surfaced as zeros than as
//! a dropped tick. Only over-long, empty, or non-text frames are rejected.

use crate::error::TelemetryError;

/// Maximum decodable frame length in bytes.
///
/// RadioHead ASK framing: 67-byte max payload minus 4 header bytes and
/// 3 trailer bytes leaves 60 bytes of message.
pub const ASK_MAX_MESSAGE_LEN: usize = 60;

/// Field separator within a frame.
pub const FIELD_SEPARATOR: char = ',';

/// Number of fields in a complete frame.
pub const FIELD_COUNT: usize = 5;

/// One decoded telemetry frame, before arrival stamping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryFrame {
    /// Relative humidity at the sensor, percent.
    pub humidity: f32,
    /// Air temperature at the sensor, degrees Celsius.
    pub temperature_c: f32,
    /// Ultrasonic distance from sensor to water surface, centimetres.
    pub distance_cm: u32,
    /// Remote battery charge estimate, percent.
    pub battery_percent: i32,
    /// Remote battery voltage, volts.
    pub battery_voltage: f32,
}

/// Decode a raw frame into a [`TelemetryFrame`].
///
/// Pure and stateless; the caller stamps the arrival time.
pub fn decode(buf: &[u8]) -> Result<TelemetryFrame, TelemetryError> {
    if buf.len() > ASK_MAX_MESSAGE_LEN {
        return Err(TelemetryError::FrameTooLong);
    }
    if buf.is_empty() {
        return Err(TelemetryError::EmptyFrame);
    }
    let text = core::str::from_utf8(buf).map_err(|_| TelemetryError::NotText)?;

    // The final span runs to end-of-buffer; a trailing separator simply
    // yields an extra empty span that is never reached.
    let mut spans = text.split(FIELD_SEPARATOR);

    Ok(TelemetryFrame {
        humidity: parse_f32(spans.next()),
        temperature_c: parse_f32(spans.next()),
        distance_cm: parse_u32(spans.next()),
        battery_percent: parse_i32(spans.next()),
        battery_voltage: parse_f32(spans.next()),
    })
}

fn parse_f32(span: Option<&str>) -> f32 {
    span.map(str::trim)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn parse_u32(span: Option<&str>) -> u32 {
    span.map(str::trim)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn parse_i32(span: Option<&str>) -> i32 {
    span.map(str::trim)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}
