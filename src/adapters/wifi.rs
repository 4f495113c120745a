//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`] — scan, bounded connect, and address query.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: a scriptable simulation backend for host-side
//!   tests.
//!
//! The connect attempt polls association state at [`CONNECT_POLL_MS`]
//! granularity until the caller's timeout expires. This is the one
//! deliberately blocking call in the system, confined to the bring-up
//! phases (provisioning and bootstrap).

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::{NetworkPort, ScanNetwork};
use crate::error::CommsError;

/// Poll granularity of the bounded connect loop.
pub const CONNECT_POLL_MS: u32 = 500;

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimState {
    networks: Vec<ScanNetwork>,
    /// Credential pair that connects successfully; anything else times out.
    valid: Option<(String, String)>,
    ip: Option<Ipv4Addr>,
    scan_count: u32,
}

// ── Construction ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Wrap an already-built driver (peripheral ownership is established
    /// in `main`).
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self { wifi }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            sim: SimState::default(),
        }
    }

    /// Script the networks the next scans will report.
    pub fn sim_set_networks(&mut self, networks: Vec<ScanNetwork>) {
        self.sim.networks = networks;
    }

    /// Script the one credential pair that connects successfully.
    pub fn sim_set_valid_credential(&mut self, ssid: &str, password: &str) {
        self.sim.valid = Some((ssid.to_owned(), password.to_owned()));
    }

    /// How many scans have been requested so far.
    pub fn sim_scan_count(&self) -> u32 {
        self.sim.scan_count
    }
}

// ── NetworkPort ───────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn scan(&mut self) -> Result<Vec<ScanNetwork>, CommsError> {
        #[cfg(target_os = "espidf")]
        {
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(|_| CommsError::ScanFailed)?;
            }
            let aps = self.wifi.scan().map_err(|_| CommsError::ScanFailed)?;
            let networks = aps
                .iter()
                .filter(|ap| !ap.ssid.is_empty())
                .map(|ap| ScanNetwork {
                    ssid: ap.ssid.as_str().to_owned(),
                    rssi_dbm: ap.signal_strength,
                })
                .collect::<Vec<_>>();
            info!("WiFi: scan found {} networks", networks.len());
            Ok(networks)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.scan_count += 1;
            info!("WiFi(sim): scan #{}", self.sim.scan_count);
            Ok(self.sim.networks.clone())
        }
    }

    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<Ipv4Addr, CommsError> {
        info!("WiFi: connecting to '{}' (timeout {}ms)", ssid, timeout_ms);

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
            use std::time::{Duration, Instant};

            let client = ClientConfiguration {
                // Lengths are bounded upstream by NetworkCredential.
                ssid: ssid.try_into().unwrap_or_default(),
                password: password.try_into().unwrap_or_default(),
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Client(client))
                .map_err(|_| CommsError::ConnectFailed)?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(|_| CommsError::ConnectFailed)?;
            }
            self.wifi.connect().map_err(|_| CommsError::ConnectFailed)?;

            let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
            loop {
                if self.wifi.is_connected().unwrap_or(false) {
                    if let Ok(ip_info) = self.wifi.sta_netif().get_ip_info() {
                        if !ip_info.ip.is_unspecified() {
                            info!("WiFi: connected, ip={}", ip_info.ip);
                            return Ok(ip_info.ip);
                        }
                    }
                }
                if Instant::now() >= deadline {
                    warn!("WiFi: connect to '{}' timed out", ssid);
                    self.wifi.disconnect().ok();
                    return Err(CommsError::ConnectTimeout);
                }
                std::thread::sleep(Duration::from_millis(u64::from(CONNECT_POLL_MS)));
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let ok = self
                .sim
                .valid
                .as_ref()
                .is_some_and(|(s, p)| s == ssid && p == password);
            if ok {
                let ip = Ipv4Addr::new(192, 168, 0, 50);
                self.sim.ip = Some(ip);
                info!("WiFi(sim): connected to '{}', ip={}", ssid, ip);
                Ok(ip)
            } else {
                warn!("WiFi(sim): connect to '{}' timed out", ssid);
                Err(CommsError::ConnectTimeout)
            }
        }
    }

    fn ip(&self) -> Option<Ipv4Addr> {
        #[cfg(target_os = "espidf")]
        {
            if !self.wifi.is_up().unwrap_or(false) {
                return None;
            }
            self.wifi
                .sta_netif()
                .get_ip_info()
                .ok()
                .map(|info| info.ip)
                .filter(|ip| !ip.is_unspecified())
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.ip
        }
    }

    fn disconnect(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            self.wifi.disconnect().ok();
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.ip = None;
        }
        info!("WiFi: disconnected");
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn nets() -> Vec<ScanNetwork> {
        vec![
            ScanNetwork {
                ssid: "HomeNet".into(),
                rssi_dbm: -48,
            },
            ScanNetwork {
                ssid: "Neighbour".into(),
                rssi_dbm: -80,
            },
        ]
    }

    #[test]
    fn scan_reports_scripted_networks() {
        let mut w = WifiAdapter::new();
        w.sim_set_networks(nets());
        let found = w.scan().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].ssid, "HomeNet");
        assert_eq!(w.sim_scan_count(), 1);
    }

    #[test]
    fn connect_with_right_credential() {
        let mut w = WifiAdapter::new();
        w.sim_set_valid_credential("HomeNet", "password1");
        assert!(w.ip().is_none());
        let ip = w.connect("HomeNet", "password1", 10_000).unwrap();
        assert_eq!(w.ip(), Some(ip));
        w.disconnect();
        assert!(w.ip().is_none());
    }

    #[test]
    fn connect_with_wrong_credential_times_out() {
        let mut w = WifiAdapter::new();
        w.sim_set_valid_credential("HomeNet", "password1");
        assert_eq!(
            w.connect("HomeNet", "wrong", 10_000),
            Err(CommsError::ConnectTimeout)
        );
        assert!(w.ip().is_none());
    }
}
