//! Live state of an in-progress provisioning dialogue.
//!
//! A session holds the transient candidate credential and the index→SSID
//! list captured at scan time. Indices are 1-based and valid only for the
//! scan that produced them; a new scan rebuilds the list wholesale. The
//! session is destroyed when the dialogue ends (success, disconnect, or
//! link teardown).

use crate::app::ports::{keys, ScanNetwork, StoragePort};
use crate::error::StorageError;

/// Maximum SSID length per 802.11.
pub const MAX_SSID_LEN: usize = 32;
/// Maximum WPA2 passphrase length.
pub const MAX_PASSWORD_LEN: usize = 64;

// ───────────────────────────────────────────────────────────────
// NetworkCredential
// ───────────────────────────────────────────────────────────────

/// A validated SSID/password pair.
///
/// Created transiently during provisioning; persisted only from within
/// the `Connecting` transition, never earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCredential {
    pub ssid: heapless::String<MAX_SSID_LEN>,
    pub password: heapless::String<MAX_PASSWORD_LEN>,
}

impl NetworkCredential {
    /// Build a credential, rejecting over-length fields.
    pub fn new(ssid: &str, password: &str) -> Option<Self> {
        let mut s = heapless::String::new();
        s.push_str(ssid).ok()?;
        let mut p = heapless::String::new();
        p.push_str(password).ok()?;
        Some(Self { ssid: s, password: p })
    }

    /// Load the stored credential, if a non-empty SSID is persisted.
    pub fn load(storage: &impl StoragePort) -> Option<Self> {
        let ssid = storage
            .get_string(keys::WIFI_NAMESPACE, keys::WIFI_SSID)
            .ok()
            .flatten()?;
        if ssid.is_empty() {
            return None;
        }
        let password = storage
            .get_string(keys::WIFI_NAMESPACE, keys::WIFI_PASSWORD)
            .ok()
            .flatten()
            .unwrap_or_default();
        Self::new(&ssid, &password)
    }

    /// Persist both fields to the credential namespace.
    pub fn persist(&self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        storage.put_string(keys::WIFI_NAMESPACE, keys::WIFI_SSID, &self.ssid)?;
        storage.put_string(keys::WIFI_NAMESPACE, keys::WIFI_PASSWORD, &self.password)
    }
}

// ───────────────────────────────────────────────────────────────
// ProvisioningSession
// ───────────────────────────────────────────────────────────────

/// Transient dialogue state owned by the provisioning machine.
#[derive(Debug, Default)]
pub struct ProvisioningSession {
    /// Networks from the most recent scan. Slot `i` answers user index `i+1`.
    networks: Vec<ScanNetwork>,
    candidate_ssid: Option<String>,
    candidate_password: Option<String>,
}

impl ProvisioningSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all dialogue state (link teardown or session end).
    pub fn reset(&mut self) {
        self.networks.clear();
        self.candidate_ssid = None;
        self.candidate_password = None;
    }

    /// Replace the scan list, invalidating all indices from prior scans.
    pub fn set_scan_results(&mut self, networks: Vec<ScanNetwork>) {
        self.networks = networks;
        self.candidate_ssid = None;
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    pub fn networks(&self) -> &[ScanNetwork] {
        &self.networks
    }

    /// Resolve a 1-based user index against the current scan.
    /// Out-of-range indices (including 0) return `None`.
    pub fn network_at(&self, index: usize) -> Option<&ScanNetwork> {
        index.checked_sub(1).and_then(|i| self.networks.get(i))
    }

    /// Record the chosen SSID by 1-based index. `false` if out of range.
    pub fn choose_ssid(&mut self, index: usize) -> bool {
        match self.network_at(index) {
            Some(n) => {
                self.candidate_ssid = Some(n.ssid.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_candidate_password(&mut self, password: &str) {
        self.candidate_password = Some(password.to_owned());
    }

    pub fn candidate_ssid(&self) -> Option<&str> {
        self.candidate_ssid.as_deref()
    }

    /// The completed candidate pair, once both halves are present.
    pub fn candidate(&self) -> Option<NetworkCredential> {
        let ssid = self.candidate_ssid.as_deref()?;
        let password = self.candidate_password.as_deref()?;
        NetworkCredential::new(ssid, password)
    }
}
