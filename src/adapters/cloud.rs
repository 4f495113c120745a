//! ThingSpeak metrics upload adapter.
//!
//! Implements [`CloudPort`] against the bulk-update endpoint. Delivery is
//! best-effort and at-most-once: a failed push is logged and the sample is
//! simply not uploaded — there is no queue and no retry.

use log::info;
use serde::Serialize;

use crate::app::ports::{CloudPort, CloudSample};
use crate::error::CommsError;

#[derive(Serialize)]
struct BulkUpdateBody<'a> {
    write_api_key: &'a str,
    updates: [BulkEntry; 1],
}

/// Field order mirrors the channel layout: humidity, temperature,
/// fill depth, battery voltage.
#[derive(Serialize)]
struct BulkEntry {
    delta_t: u32,
    field1: f32,
    field2: f32,
    field3: i64,
    field4: f32,
}

pub struct ThingSpeakAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim_pushes: Vec<(u32, String)>,
}

impl ThingSpeakAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_pushes: Vec::new(),
        }
    }

    fn body(api_key: &str, sample: &CloudSample) -> Result<String, CommsError> {
        let body = BulkUpdateBody {
            write_api_key: api_key,
            updates: [BulkEntry {
                delta_t: 0,
                field1: sample.humidity,
                field2: sample.temperature_c,
                field3: sample.fill_depth_cm,
                field4: sample.battery_voltage,
            }],
        };
        serde_json::to_string(&body).map_err(|_| CommsError::UploadFailed)
    }
}

#[cfg(not(target_os = "espidf"))]
impl ThingSpeakAdapter {
    /// `(channel, body)` pairs recorded by the simulation backend.
    pub fn sim_pushes(&self) -> &[(u32, String)] {
        &self.sim_pushes
    }
}

impl Default for ThingSpeakAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudPort for ThingSpeakAdapter {
    fn push(
        &mut self,
        api_key: &str,
        channel_id: u32,
        sample: &CloudSample,
    ) -> Result<(), CommsError> {
        let body = Self::body(api_key, sample)?;

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
            use esp_idf_svc::http::Method;
            use esp_idf_svc::io::Write;

            let mut conn = EspHttpConnection::new(&Configuration::default())
                .map_err(|_| CommsError::UploadFailed)?;
            let url = format!("http://api.thingspeak.com/channels/{channel_id}/bulk_update.json");
            let len = body.len().to_string();
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", len.as_str()),
            ];
            conn.initiate_request(Method::Post, &url, &headers)
                .map_err(|_| CommsError::UploadFailed)?;
            conn.write_all(body.as_bytes())
                .map_err(|_| CommsError::UploadFailed)?;
            conn.initiate_response()
                .map_err(|_| CommsError::UploadFailed)?;

            let status = conn.status();
            if (200..300).contains(&status) {
                info!("Cloud: sample uploaded to channel {channel_id}");
                Ok(())
            } else {
                log::warn!("Cloud: upload rejected with status {status}");
                Err(CommsError::UploadFailed)
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Cloud(sim): push to channel {channel_id}: {body}");
            self.sim_pushes.push((channel_id, body));
            Ok(())
        }
    }
}
