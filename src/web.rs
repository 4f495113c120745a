//! Web configuration surface — form decode and template rendering.
//!
//! The HTTP server itself is a boundary adapter (`adapters::http` on the
//! ESP-IDF target); this module holds the pure pieces: turning a posted
//! settings form into a [`SettingsUpdate`], and resolving the `%TOKEN%`
//! substitution variables the status pages use.
//!
//! Form field names and token names are the compatibility contract with
//! the shipped page assets — do not rename them.

use crate::config::SettingsUpdate;
use crate::telemetry::{fill, FreshnessTracker};
use crate::TankConfig;

// ───────────────────────────────────────────────────────────────
// Form body decoding
// ───────────────────────────────────────────────────────────────

/// Decode one `application/x-www-form-urlencoded` component.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).and_then(|h| {
                    core::str::from_utf8(h)
                        .ok()
                        .and_then(|h| u8::from_str_radix(h, 16).ok())
                });
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a posted form body into decoded `(name, value)` pairs.
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (url_decode(name), url_decode(value))
        })
        .collect()
}

// ───────────────────────────────────────────────────────────────
// Settings form
// ───────────────────────────────────────────────────────────────

/// Build a [`SettingsUpdate`] from decoded form pairs.
///
/// Each present field is parsed independently; absent fields stay `None`
/// and leave the stored value unchanged. Unparseable numeric fields are
/// treated as absent rather than failing the whole post.
pub fn parse_settings_form<'a, I>(pairs: I) -> SettingsUpdate
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut update = SettingsUpdate::default();
    for (name, value) in pairs {
        match name {
            "hloubka" => update.tank_depth_cm = value.trim().parse().ok(),
            "napust" => update.offset_cm = value.trim().parse().ok(),
            "thingspeakApi" => update.cloud_api_key = Some(value.to_owned()),
            "thingspeakChannel" => update.cloud_channel_id = value.trim().parse().ok(),
            "duckdnsDomain" => update.ddns_domain = Some(value.to_owned()),
            "duckdnsToken" => update.ddns_token = Some(value.to_owned()),
            _ => {}
        }
    }
    update
}

// ───────────────────────────────────────────────────────────────
// Template variables
// ───────────────────────────────────────────────────────────────

/// Everything the token resolver needs for one render pass.
pub struct PageView<'a> {
    pub config: &'a TankConfig,
    pub tracker: &'a FreshnessTracker,
    /// Monotonic uptime at render time, milliseconds.
    pub now_ms: u64,
}

/// Resolve one `%TOKEN%` substitution variable.
///
/// Sensor-derived tokens are freshness-gated: before the first reading
/// they render a placeholder instead of numbers. Unknown tokens resolve
/// to the empty string, matching the original page processor.
pub fn render_token(token: &str, view: &PageView<'_>) -> String {
    let config = view.config;
    let tracker = view.tracker;
    let reading = tracker.latest().copied().unwrap_or_default();

    match token {
        "NAPUST" => config.offset_cm.to_string(),
        "HLOUBKA" => config.tank_depth_cm.to_string(),
        "VOLT" => tracker.gate(format!("{:.2}", reading.battery_voltage), None),
        "BATTPERCENT" => tracker.gate(reading.battery_percent.to_string(), Some("0")),
        "HLADINA" => {
            let depth = fill::fill_depth_cm(config, reading.distance_cm);
            tracker.gate(depth.to_string(), None)
        }
        "PLNOSTPERC" => {
            // A legacy store may still hold a zero depth; render it as
            // empty rather than erroring out of the page.
            let percent = fill::fill_percent(config, reading.distance_cm).unwrap_or(0);
            tracker.gate(percent.to_string(), Some("0"))
        }
        "TEPLOTA" => tracker.gate(format!("{:.2}", reading.temperature_c), None),
        "VLHKOST" => tracker.gate(format!("{:.2}", reading.humidity), None),
        "THINGSPEAKAPI" => config.cloud_api_key.clone(),
        "THINGSPEAKCHANNEL" => config.cloud_channel_id.to_string(),
        "LASTMEASUREMENT" => {
            let minutes = tracker
                .minutes_since_last(view.now_ms)
                .map(|m| m.to_string())
                .unwrap_or_default();
            tracker.gate(minutes, Some("-"))
        }
        "UPTIME" => crate::adapters::time::format_uptime(view.now_ms),
        "DUCKDNSDOMAIN" => config.ddns_domain.clone(),
        "DUCKDNSTOKEN" => config.ddns_token.clone(),
        _ => String::new(),
    }
}

/// Substitute every `%TOKEN%` occurrence in a page template.
///
/// A literal `%%` renders a single `%`; an unterminated `%…` run is
/// passed through unchanged.
pub fn substitute_template(template: &str, view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let Some(start) = rest.find('%') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(0) => {
                out.push('%');
                rest = &after[1..];
            }
            Some(end) => {
                out.push_str(&render_token(&after[..end], view));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                break;
            }
        }
    }
    out
}

// ───────────────────────────────────────────────────────────────
// Built-in status page
// ───────────────────────────────────────────────────────────────

/// Minimal status/configuration page baked into the firmware image.
/// Substitution tokens match the full web asset set, so a LittleFS-hosted
/// page set can replace this without firmware changes.
pub const STATUS_PAGE_TEMPLATE: &str = "<!DOCTYPE html>\n\
<html><head><meta charset=\"utf-8\"><title>TankSentry</title></head><body>\n\
<h1>TankSentry</h1>\n\
<table>\n\
<tr><td>Fill depth</td><td>%HLADINA% cm (%PLNOSTPERC% %%)</td></tr>\n\
<tr><td>Temperature</td><td>%TEPLOTA% &deg;C</td></tr>\n\
<tr><td>Humidity</td><td>%VLHKOST% %%</td></tr>\n\
<tr><td>Battery</td><td>%BATTPERCENT% %% (%VOLT% V)</td></tr>\n\
<tr><td>Last reading</td><td>%LASTMEASUREMENT% min ago</td></tr>\n\
<tr><td>Uptime</td><td>%UPTIME%</td></tr>\n\
</table>\n\
<form method=\"post\" action=\"/configuration.html\">\n\
<input name=\"hloubka\" value=\"%HLOUBKA%\"> tank depth (cm)<br>\n\
<input name=\"napust\" value=\"%NAPUST%\"> offset (cm)<br>\n\
<input name=\"thingspeakApi\" value=\"%THINGSPEAKAPI%\"> ThingSpeak API key<br>\n\
<input name=\"thingspeakChannel\" value=\"%THINGSPEAKCHANNEL%\"> ThingSpeak channel<br>\n\
<input name=\"duckdnsDomain\" value=\"%DUCKDNSDOMAIN%\"> DuckDNS domain<br>\n\
<input name=\"duckdnsToken\" value=\"%DUCKDNSTOKEN%\"> DuckDNS token<br>\n\
<button type=\"submit\">Save</button>\n\
</form></body></html>\n";
