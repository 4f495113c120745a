//! Status/configuration web server (ESP-IDF only).
//!
//! Thin boundary over `esp_idf_svc`'s HTTP server: every handler locks
//! the shared core state, renders or applies, and unlocks. Settings
//! apply is therefore serialized with the main loop, and the server only
//! starts once provisioning has finished — the two never overlap.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use esp_idf_svc::http::server::{Configuration, EspHttpServer};
use esp_idf_svc::http::{Headers, Method};
use esp_idf_svc::io::{Read, Write};
use log::{info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::nvs::NvsAdapter;
use crate::adapters::time::MonotonicClock;
use crate::app::service::AppService;
use crate::web;

/// Core state shared between the main loop and the request handlers.
pub struct CoreState {
    pub app: AppService,
    pub storage: NvsAdapter,
    pub clock: MonotonicClock,
}

pub type SharedCore = Arc<Mutex<CoreState>>;

/// Owns the running server; dropping it stops serving.
pub struct HttpServerAdapter {
    _server: EspHttpServer<'static>,
}

/// Bring the web surface up on port 80.
pub fn start(core: SharedCore) -> anyhow::Result<HttpServerAdapter> {
    let mut server = EspHttpServer::new(&Configuration::default())?;

    for path in ["/", "/index.html", "/configuration.html", "/graphs.html"] {
        let core = core.clone();
        server.fn_handler(path, Method::Get, move |req| -> anyhow::Result<()> {
            let html = {
                let state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;
                let view = web::PageView {
                    config: state.app.config(),
                    tracker: state.app.tracker(),
                    now_ms: state.clock.now_ms(),
                };
                web::substitute_template(web::STATUS_PAGE_TEMPLATE, &view)
            };
            let mut resp = req.into_response(200, None, &[("Content-Type", "text/html")])?;
            resp.write_all(html.as_bytes())?;
            Ok(())
        })?;
    }

    {
        let core = core.clone();
        server.fn_handler(
            "/configuration.html",
            Method::Post,
            move |mut req| -> anyhow::Result<()> {
                let len = req.content_len().unwrap_or(0) as usize;
                let mut body = vec![0u8; len.min(1024)];
                req.read_exact(&mut body)
                    .map_err(|e| anyhow!("form body read failed: {e:?}"))?;
                let body = String::from_utf8_lossy(&body);

                let pairs = web::parse_form_body(&body);
                let update =
                    web::parse_settings_form(pairs.iter().map(|(n, v)| (n.as_str(), v.as_str())));

                let mut state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;
                let CoreState {
                    ref mut app,
                    ref mut storage,
                    ..
                } = *state;
                match app.apply_settings(&update, storage, &mut LogEventSink::new()) {
                    Ok(()) => {
                        req.into_ok_response()?.write_all("Ulozeno".as_bytes())?;
                    }
                    Err(e) => {
                        warn!("Web: settings rejected ({e})");
                        req.into_status_response(400)?
                            .write_all(format!("{e}").as_bytes())?;
                    }
                }
                Ok(())
            },
        )?;
    }

    server.fn_handler("/favicon.ico", Method::Get, |req| -> anyhow::Result<()> {
        req.into_status_response(404)?.write_all(b"Not found")?;
        Ok(())
    })?;

    info!("Web: server listening on :80");
    Ok(HttpServerAdapter { _server: server })
}
