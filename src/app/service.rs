//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the live [`TankConfig`] and the
//! [`FreshnessTracker`], and orchestrates the per-tick ingest path and the
//! settings-apply path. All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  RadioPort ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                │         AppService          │
//!  StoragePort ◀─│  codec · fill · freshness   │
//!                └────────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::{self, SettingsUpdate, TankConfig};
use crate::error::Result;
use crate::telemetry::{codec, fill, FreshnessTracker};

use super::events::AppEvent;
use super::ports::{keys, CloudSample, EventSink, RadioPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// Settings persistence
// ───────────────────────────────────────────────────────────────

/// Load the persisted settings, falling back to defaults per field.
pub fn load_settings(storage: &impl StoragePort) -> TankConfig {
    let defaults = TankConfig::default();
    let ns = keys::SETTINGS_NAMESPACE;

    TankConfig {
        tank_depth_cm: storage
            .get_u32(ns, keys::TANK_DEPTH)
            .ok()
            .flatten()
            .unwrap_or(defaults.tank_depth_cm),
        offset_cm: storage
            .get_u32(ns, keys::TANK_OFFSET)
            .ok()
            .flatten()
            .unwrap_or(defaults.offset_cm),
        cloud_api_key: storage
            .get_string(ns, keys::CLOUD_API_KEY)
            .ok()
            .flatten()
            .unwrap_or_default(),
        cloud_channel_id: storage
            .get_u32(ns, keys::CLOUD_CHANNEL)
            .ok()
            .flatten()
            .unwrap_or(0),
        ddns_domain: storage
            .get_string(ns, keys::DDNS_DOMAIN)
            .ok()
            .flatten()
            .unwrap_or_default(),
        ddns_token: storage
            .get_string(ns, keys::DDNS_TOKEN)
            .ok()
            .flatten()
            .unwrap_or_default(),
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates ingest and configuration.
pub struct AppService {
    config: TankConfig,
    tracker: FreshnessTracker,
}

impl AppService {
    /// Construct the service from an already-loaded configuration.
    pub fn new(config: TankConfig) -> Self {
        Self {
            config,
            tracker: FreshnessTracker::new(),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    pub fn tracker(&self) -> &FreshnessTracker {
        &self.tracker
    }

    // ── Ingest tick ───────────────────────────────────────────

    /// One scheduler tick of the telemetry ingest loop.
    ///
    /// Polls the radio without blocking, decodes a complete frame if one
    /// is ready, and records it. Returns `true` only when a new reading
    /// was accepted this tick — the caller uses that to gate cloud
    /// forwarding. Decode errors are logged and never propagate further.
    pub fn ingest_tick(
        &mut self,
        radio: &mut impl RadioPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> bool {
        let Some(frame_bytes) = radio.receive() else {
            return false;
        };

        match codec::decode(&frame_bytes) {
            Ok(frame) => {
                self.tracker.record(frame, now_ms);
                let fill_depth = fill::fill_depth_cm(&self.config, frame.distance_cm);
                info!(
                    "Reading: hum={:.1}% temp={:.1}C dist={}cm batt={}%/{:.2}V fill={}cm",
                    frame.humidity,
                    frame.temperature_c,
                    frame.distance_cm,
                    frame.battery_percent,
                    frame.battery_voltage,
                    fill_depth,
                );
                sink.emit(&AppEvent::ReadingAccepted {
                    distance_cm: frame.distance_cm,
                    fill_depth_cm: fill_depth,
                    battery_percent: frame.battery_percent,
                });
                true
            }
            Err(e) => {
                warn!("Telemetry: dropping frame ({e})");
                sink.emit(&AppEvent::ReadingRejected(e));
                false
            }
        }
    }

    /// Build the cloud sample for the most recent reading, when one exists.
    pub fn cloud_sample(&self) -> Option<CloudSample> {
        self.tracker.latest().map(|r| CloudSample {
            humidity: r.humidity,
            temperature_c: r.temperature_c,
            fill_depth_cm: fill::fill_depth_cm(&self.config, r.distance_cm),
            battery_voltage: r.battery_voltage,
        })
    }

    // ── Settings apply ────────────────────────────────────────

    /// Apply a partial settings update.
    ///
    /// Each present field is validated, applied to the live config, and
    /// persisted to the settings namespace independently; absent fields
    /// are left untouched. A zero tank depth rejects the whole update
    /// before anything is written.
    pub fn apply_settings(
        &mut self,
        update: &SettingsUpdate,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let mut candidate = self.config.clone();
        if let Some(depth) = update.tank_depth_cm {
            candidate.tank_depth_cm = depth;
        }
        if let Some(offset) = update.offset_cm {
            candidate.offset_cm = offset;
        }
        if let Some(ref key) = update.cloud_api_key {
            candidate.cloud_api_key = key.clone();
        }
        if let Some(channel) = update.cloud_channel_id {
            candidate.cloud_channel_id = channel;
        }
        if let Some(ref domain) = update.ddns_domain {
            candidate.ddns_domain = domain.clone();
        }
        if let Some(ref token) = update.ddns_token {
            candidate.ddns_token = token.clone();
        }
        config::validate(&candidate)?;

        let ns = keys::SETTINGS_NAMESPACE;
        if let Some(depth) = update.tank_depth_cm {
            storage.put_u32(ns, keys::TANK_DEPTH, depth)?;
        }
        if let Some(offset) = update.offset_cm {
            storage.put_u32(ns, keys::TANK_OFFSET, offset)?;
        }
        if let Some(ref key) = update.cloud_api_key {
            storage.put_string(ns, keys::CLOUD_API_KEY, key)?;
        }
        if let Some(channel) = update.cloud_channel_id {
            storage.put_u32(ns, keys::CLOUD_CHANNEL, channel)?;
        }
        if let Some(ref domain) = update.ddns_domain {
            storage.put_string(ns, keys::DDNS_DOMAIN, domain)?;
        }
        if let Some(ref token) = update.ddns_token {
            storage.put_string(ns, keys::DDNS_TOKEN, token)?;
        }

        self.config = candidate;
        info!("Settings applied");
        sink.emit(&AppEvent::SettingsApplied);
        Ok(())
    }
}
