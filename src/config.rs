//! Tank and forwarding configuration.
//!
//! All user-tunable parameters for the base station. Values are persisted
//! to NVS individually (see `adapters::nvs`) and mutated only through the
//! settings-apply path in `AppService`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    /// Total tank depth in centimetres (sensor mount to tank floor).
    pub tank_depth_cm: u32,
    /// Distance from the sensor to the full-mark in centimetres.
    pub offset_cm: u32,
    /// Cloud time-series write API key. Empty = forwarding disabled.
    pub cloud_api_key: String,
    /// Cloud channel id. Zero = forwarding disabled.
    pub cloud_channel_id: u32,
    /// Dynamic-DNS domain. Empty = DDNS disabled.
    pub ddns_domain: String,
    /// Dynamic-DNS token.
    pub ddns_token: String,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            tank_depth_cm: 200,
            offset_cm: 0,
            cloud_api_key: String::new(),
            cloud_channel_id: 0,
            ddns_domain: String::new(),
            ddns_token: String::new(),
        }
    }
}

impl TankConfig {
    /// Whether cloud forwarding is fully configured.
    pub fn cloud_enabled(&self) -> bool {
        !self.cloud_api_key.is_empty() && self.cloud_channel_id != 0
    }

    /// Whether dynamic-DNS refresh is fully configured.
    pub fn ddns_enabled(&self) -> bool {
        !self.ddns_domain.is_empty() && !self.ddns_token.is_empty()
    }
}

/// A partial settings update, one `Some` per form field present in the
/// request. Absent fields leave the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub tank_depth_cm: Option<u32>,
    pub offset_cm: Option<u32>,
    pub cloud_api_key: Option<String>,
    pub cloud_channel_id: Option<u32>,
    pub ddns_domain: Option<String>,
    pub ddns_token: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.tank_depth_cm.is_none()
            && self.offset_cm.is_none()
            && self.cloud_api_key.is_none()
            && self.cloud_channel_id.is_none()
            && self.ddns_domain.is_none()
            && self.ddns_token.is_none()
    }
}

/// Validate a config before it is applied or persisted.
///
/// A zero tank depth would make the fill-percent division undefined, so it
/// is rejected here at the boundary rather than surfaced at read time.
pub fn validate(config: &TankConfig) -> Result<()> {
    if config.tank_depth_cm == 0 {
        return Err(Error::Config("tank_depth_cm must be non-zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = TankConfig::default();
        assert_eq!(c.tank_depth_cm, 200);
        assert_eq!(c.offset_cm, 0);
        assert!(c.cloud_api_key.is_empty());
        assert_eq!(c.cloud_channel_id, 0);
        assert!(validate(&c).is_ok());
    }

    #[test]
    fn zero_depth_rejected() {
        let c = TankConfig {
            tank_depth_cm: 0,
            ..Default::default()
        };
        assert!(matches!(validate(&c), Err(Error::Config(_))));
    }

    #[test]
    fn forwarding_gates() {
        let mut c = TankConfig::default();
        assert!(!c.cloud_enabled());
        assert!(!c.ddns_enabled());

        c.cloud_api_key = "KEY".into();
        assert!(!c.cloud_enabled(), "key alone is not enough");
        c.cloud_channel_id = 1234;
        assert!(c.cloud_enabled());

        c.ddns_domain = "tank.example".into();
        assert!(!c.ddns_enabled(), "domain alone is not enough");
        c.ddns_token = "tok".into();
        assert!(c.ddns_enabled());
    }

    #[test]
    fn serde_roundtrip() {
        let c = TankConfig {
            tank_depth_cm: 250,
            offset_cm: 10,
            cloud_api_key: "ABCD".into(),
            cloud_channel_id: 42,
            ddns_domain: "tank.example".into(),
            ddns_token: "secret".into(),
        };
        let json = serde_json::to_string(&c).unwrap();
        let c2: TankConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn empty_update_is_empty() {
        assert!(SettingsUpdate::default().is_empty());
        let u = SettingsUpdate {
            offset_cm: Some(5),
            ..Default::default()
        };
        assert!(!u.is_empty());
    }
}
