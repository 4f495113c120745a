//! DuckDNS dynamic-DNS refresh adapter.
//!
//! Implements [`DdnsPort`]. The main loop calls `refresh` on a 10-second
//! cadence while an address is held; an unconfigured client is a no-op.

use core::net::Ipv4Addr;

use log::info;

use crate::app::ports::DdnsPort;
use crate::error::CommsError;

pub struct DuckDnsAdapter {
    domain: String,
    token: String,

    #[cfg(not(target_os = "espidf"))]
    sim_refreshes: Vec<(String, Ipv4Addr)>,
}

impl DuckDnsAdapter {
    pub fn new() -> Self {
        Self {
            domain: String::new(),
            token: String::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_refreshes: Vec::new(),
        }
    }

    fn configured(&self) -> bool {
        !self.domain.is_empty() && !self.token.is_empty()
    }
}

#[cfg(not(target_os = "espidf"))]
impl DuckDnsAdapter {
    /// `(domain, ip)` pairs recorded by the simulation backend.
    pub fn sim_refreshes(&self) -> &[(String, Ipv4Addr)] {
        &self.sim_refreshes
    }
}

impl Default for DuckDnsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DdnsPort for DuckDnsAdapter {
    fn configure(&mut self, domain: &str, token: &str) {
        self.domain = domain.to_owned();
        self.token = token.to_owned();
        if self.configured() {
            info!("DDNS: client pointed at '{}'", self.domain);
        }
    }

    fn refresh(&mut self, ip: Ipv4Addr) -> Result<(), CommsError> {
        if !self.configured() {
            return Ok(());
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
            use esp_idf_svc::http::Method;

            let mut conn = EspHttpConnection::new(&Configuration::default())
                .map_err(|_| CommsError::DdnsFailed)?;
            let url = format!(
                "https://www.duckdns.org/update?domains={}&token={}&ip={}",
                self.domain, self.token, ip
            );
            conn.initiate_request(Method::Get, &url, &[])
                .map_err(|_| CommsError::DdnsFailed)?;
            conn.initiate_response().map_err(|_| CommsError::DdnsFailed)?;

            let status = conn.status();
            if (200..300).contains(&status) {
                Ok(())
            } else {
                log::warn!("DDNS: refresh rejected with status {status}");
                Err(CommsError::DdnsFailed)
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_refreshes.push((self.domain.clone(), ip));
            Ok(())
        }
    }
}
