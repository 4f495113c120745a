//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). This is the
//! diagnostic mirror: it must never depend on the console link being up.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ReadingAccepted {
                distance_cm,
                fill_depth_cm,
                battery_percent,
            } => {
                info!(
                    "READING | dist={distance_cm}cm fill={fill_depth_cm}cm batt={battery_percent}%"
                );
            }
            AppEvent::ReadingRejected(e) => {
                warn!("READING | rejected: {e}");
            }
            AppEvent::SettingsApplied => {
                info!("CONFIG | settings applied");
            }
            AppEvent::CredentialPersisted { ssid } => {
                info!("WIFI | credential stored for '{ssid}'");
            }
            AppEvent::NetworkConnected { ip } => {
                info!("WIFI | connected, ip={ip}");
            }
            AppEvent::FactoryResetRequested => {
                warn!("RESET | factory reset requested");
            }
        }
    }
}
