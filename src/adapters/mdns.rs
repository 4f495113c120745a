//! mDNS service advertisement adapter.
//!
//! Advertises the status web server as `_http._tcp` on port 80 so the
//! station is reachable as `tanksentry.local`. Uses the ESP-IDF mDNS
//! component on target and is a logged no-op on simulation targets.
//!
//! Lifecycle is tied to WiFi: start after an address is held.

use log::info;

const MDNS_SERVICE_TYPE: &str = "_http";
#[allow(dead_code)]
const MDNS_SERVICE_PROTO: &str = "_tcp";
const MDNS_SERVICE_PORT: u16 = 80;
#[allow(dead_code)]
const MDNS_INSTANCE_NAME: &str = "TankSentry water level monitor";

/// mDNS advertisement adapter.
pub struct MdnsAdapter {
    hostname: heapless::String<24>,
    active: bool,
}

impl MdnsAdapter {
    pub fn new(hostname: heapless::String<24>) -> Self {
        Self {
            hostname,
            active: false,
        }
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start hostname + service advertisement. Call once an IP is held.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.platform_start();
        self.active = true;
        info!(
            "mDNS: advertising {}.local → {}:{}",
            self.hostname, MDNS_SERVICE_TYPE, MDNS_SERVICE_PORT
        );
    }

    /// Stop advertisement (before WiFi teardown).
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&self) {
        use esp_idf_svc::sys::*;
        unsafe {
            let ret = mdns_init();
            if ret != ESP_OK {
                log::error!("mDNS: mdns_init failed ({})", ret);
                return;
            }

            let mut hostname_buf = [0u8; 32];
            let hb = self.hostname.as_bytes();
            let hl = hb.len().min(31);
            hostname_buf[..hl].copy_from_slice(&hb[..hl]);
            mdns_hostname_set(hostname_buf.as_ptr() as *const _);
            mdns_instance_name_set(b"TankSentry water level monitor\0".as_ptr() as *const _);

            mdns_service_add(
                core::ptr::null(),
                b"_http\0".as_ptr() as *const _,
                b"_tcp\0".as_ptr() as *const _,
                MDNS_SERVICE_PORT,
                core::ptr::null_mut(),
                0,
            );
            mdns_service_instance_name_set(
                b"_http\0".as_ptr() as *const _,
                b"_tcp\0".as_ptr() as *const _,
                b"TankSentry water level monitor\0".as_ptr() as *const _,
            );
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&self) {
        info!(
            "mDNS(sim): registered {}.local {}:{} ('{}')",
            self.hostname, MDNS_SERVICE_TYPE, MDNS_SERVICE_PORT, MDNS_INSTANCE_NAME
        );
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&self) {
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }
}
