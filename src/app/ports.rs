//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / ProvisioningMachine (domain)
//! ```
//!
//! Driven adapters (NVS, radio, console, WiFi, cloud, DDNS) implement these
//! traits. The domain core consumes them via generics and never touches
//! hardware directly.

use core::net::Ipv4Addr;

use crate::error::{CommsError, StorageError};

// ───────────────────────────────────────────────────────────────
// Persisted layout
// ───────────────────────────────────────────────────────────────

/// NVS namespaces and keys. The names are the on-flash compatibility
/// contract with earlier firmware revisions — do not rename.
pub mod keys {
    /// Network credential namespace.
    pub const WIFI_NAMESPACE: &str = "wifi_access";
    pub const WIFI_SSID: &str = "pref_ssid";
    pub const WIFI_PASSWORD: &str = "pref_pass";

    /// Application settings namespace.
    pub const SETTINGS_NAMESPACE: &str = "jimka";
    pub const TANK_DEPTH: &str = "hloubka";
    pub const TANK_OFFSET: &str = "napust";
    pub const CLOUD_API_KEY: &str = "thingspeakApi";
    /// Truncated to the 15-byte NVS key limit.
    pub const CLOUD_CHANNEL: &str = "thingspeakChann";
    pub const DDNS_DOMAIN: &str = "duckdnsDomain";
    pub const DDNS_TOKEN: &str = "duckdnsToken";
}

/// Largest value the typed storage helpers will read.
const MAX_VALUE_LEN: usize = 128;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent namespaced key-value storage.
///
/// Every operation is a scoped acquisition: the adapter opens the
/// namespace, performs the op, and closes the handle again even on the
/// error path. Two namespaces may be touched within one loop tick.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Erase every key in a namespace (factory reset path).
    fn wipe(&mut self, namespace: &str) -> Result<(), StorageError>;

    // ── Typed helpers over the byte-level API ─────────────────

    /// Read a UTF-8 string value. `Ok(None)` when the key is absent.
    fn get_string(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        match self.read(namespace, key, &mut buf) {
            Ok(len) => Ok(Some(String::from_utf8_lossy(&buf[..len]).into_owned())),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_string(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(namespace, key, value.as_bytes())
    }

    /// Read a little-endian u32 value. `Ok(None)` when the key is absent
    /// or the stored blob has the wrong width.
    fn get_u32(&self, namespace: &str, key: &str) -> Result<Option<u32>, StorageError> {
        let mut buf = [0u8; 4];
        match self.read(namespace, key, &mut buf) {
            Ok(4) => Ok(Some(u32::from_le_bytes(buf))),
            Ok(_) => Ok(None),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_u32(&mut self, namespace: &str, key: &str, value: u32) -> Result<(), StorageError> {
        self.write(namespace, key, &value.to_le_bytes())
    }
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: 433 MHz receiver → domain)
// ───────────────────────────────────────────────────────────────

/// Byte-level receive primitive for the telemetry radio.
pub trait RadioPort {
    /// Non-blocking poll. `Some(frame)` when a complete frame is ready,
    /// `None` immediately otherwise.
    fn receive(&mut self) -> Option<Vec<u8>>;
}

// ───────────────────────────────────────────────────────────────
// Console port (driven adapter: out-of-band serial link ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Line-oriented session channel for the provisioning console.
pub trait ConsolePort {
    /// True while a remote peer holds the link open.
    fn link_open(&self) -> bool;

    /// Non-blocking: the next complete inbound line, if any.
    fn read_line(&mut self) -> Option<String>;

    /// Write one outbound line. Send failures are swallowed by the
    /// adapter — the session channel must never block the log mirror.
    fn write_line(&mut self, line: &str);

    /// Flush pending output and tear the link down.
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: WiFi STA ↔ domain)
// ───────────────────────────────────────────────────────────────

/// One entry from a station scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    pub rssi_dbm: i8,
}

/// Station-mode connectivity primitive.
pub trait NetworkPort {
    /// Scan for access points. An empty list is not an error.
    fn scan(&mut self) -> Result<Vec<ScanNetwork>, CommsError>;

    /// Bounded connect attempt: polls the association state at 500 ms
    /// granularity until success or `timeout_ms` expires. Blocks the
    /// caller for at most the timeout — acceptable only during bring-up.
    fn connect(&mut self, ssid: &str, password: &str, timeout_ms: u32)
    -> Result<Ipv4Addr, CommsError>;

    /// The station's current address, when associated with a DHCP lease.
    fn ip(&self) -> Option<Ipv4Addr>;

    /// Drop the current association, if any.
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Cloud metrics port (driven adapter: domain → time-series service)
// ───────────────────────────────────────────────────────────────

/// One forwarded sample. Field order mirrors the cloud channel layout.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CloudSample {
    pub humidity: f32,
    pub temperature_c: f32,
    pub fill_depth_cm: i64,
    pub battery_voltage: f32,
}

/// Best-effort, at-most-once upload. A failed push is logged and the
/// sample is gone; there is no queue.
pub trait CloudPort {
    fn push(&mut self, api_key: &str, channel_id: u32, sample: &CloudSample)
    -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Dynamic-DNS port (driven adapter: domain → DDNS provider)
// ───────────────────────────────────────────────────────────────

pub trait DdnsPort {
    /// Point the client at a domain/token pair. Replaces any previous pair.
    fn configure(&mut self, domain: &str, token: &str);

    /// Refresh the record with the current address. No-op when unconfigured.
    fn refresh(&mut self, ip: Ipv4Addr) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
