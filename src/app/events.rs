//! Outbound application events.
//!
//! The core emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them — log to
//! serial, mirror to the provisioning console, etc.

use core::net::Ipv4Addr;

use crate::error::TelemetryError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A telemetry frame was decoded and accepted.
    ReadingAccepted {
        distance_cm: u32,
        fill_depth_cm: i64,
        battery_percent: i32,
    },

    /// A telemetry frame was dropped at decode.
    ReadingRejected(TelemetryError),

    /// A settings update was applied and persisted.
    SettingsApplied,

    /// A candidate network credential was written to the store.
    CredentialPersisted { ssid: heapless::String<32> },

    /// The station associated and obtained an address.
    NetworkConnected { ip: Ipv4Addr },

    /// A factory reset was requested; both namespaces will be wiped.
    FactoryResetRequested,
}
