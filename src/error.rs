//! Unified error types for the TankSentry base station.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform. Variants are `Copy` so they can be
//! passed through the provisioning machine and ingest path without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A radio telemetry frame could not be decoded.
    Telemetry(TelemetryError),
    /// A derived-metric computation failed.
    Metric(MetricError),
    /// A network operation failed or timed out.
    Comms(CommsError),
    /// Persistent storage failed.
    Storage(StorageError),
    /// Configuration is invalid or could not be applied.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Telemetry(e) => write!(f, "telemetry: {e}"),
            Self::Metric(e) => write!(f, "metric: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry decode errors
// ---------------------------------------------------------------------------

/// Non-fatal by design: a bad frame is logged and the tick is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// Frame exceeds the ASK protocol's maximum message length.
    FrameTooLong,
    /// Frame is empty.
    EmptyFrame,
    /// Frame bytes are not valid UTF-8 text.
    NotText,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooLong => write!(f, "frame exceeds max message length"),
            Self::EmptyFrame => write!(f, "empty frame"),
            Self::NotText => write!(f, "frame is not valid UTF-8"),
        }
    }
}

impl From<TelemetryError> for Error {
    fn from(e: TelemetryError) -> Self {
        Self::Telemetry(e)
    }
}

// ---------------------------------------------------------------------------
// Derived-metric errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricError {
    /// Fill percent requested with a zero tank depth. The configuration
    /// boundary rejects a zero depth, so this only surfaces if the stored
    /// settings predate that check.
    DivideByZero,
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivideByZero => write!(f, "tank depth is zero"),
        }
    }
}

impl From<MetricError> for Error {
    fn from(e: MetricError) -> Self {
        Self::Metric(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

/// Recoverable: every comms failure drives a retry loop, never a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The bounded WiFi connect attempt expired.
    ConnectTimeout,
    /// The driver refused the connect attempt outright.
    ConnectFailed,
    /// The station scan returned an error (not the zero-results case).
    ScanFailed,
    /// Cloud metrics upload failed.
    UploadFailed,
    /// Dynamic-DNS refresh failed.
    DdnsFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout => write!(f, "WiFi connect timed out"),
            Self::ConnectFailed => write!(f, "WiFi connect refused"),
            Self::ScanFailed => write!(f, "WiFi scan failed"),
            Self::UploadFailed => write!(f, "cloud upload failed"),
            Self::DdnsFailed => write!(f, "DDNS refresh failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The persisted store could not be mounted. Fatal at boot: nothing
    /// downstream can function without it.
    Unavailable,
    /// Requested key does not exist.
    NotFound,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "store unavailable"),
            Self::NotFound => write!(f, "key not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
