//! Bluetooth serial (SPP) console adapter.
//!
//! Implements [`ConsolePort`] — the line-oriented out-of-band channel the
//! provisioning machine talks through.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: classic Bluetooth SPP via the Bluedroid
//!   C API. The SPP callback runs in the BT task; it only appends inbound
//!   bytes into a mutex-guarded line buffer that the main loop drains.
//! - **all other targets**: a scriptable in-memory backend. Integration
//!   tests drive the full provisioning dialogue through it.
//!
//! Outbound write failures are swallowed here by contract: the session
//! channel and the diagnostic log are independent sinks, and a dead BT
//! link must never suppress log output.

use log::info;

use crate::app::ports::ConsolePort;

pub struct BtConsoleAdapter {
    device_name: heapless::String<24>,
    started: bool,

    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimState {
    link_open: bool,
    inbound: std::collections::VecDeque<String>,
    outbound: Vec<String>,
}

impl BtConsoleAdapter {
    pub fn new(device_name: heapless::String<24>) -> Self {
        Self {
            device_name,
            started: false,
            #[cfg(not(target_os = "espidf"))]
            sim: SimState::default(),
        }
    }

    /// Bring the SPP service up and start advertising `device_name`.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        #[cfg(target_os = "espidf")]
        platform::start(&self.device_name);
        self.started = true;
        info!("Console: '{}' discoverable", self.device_name);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

// ── Simulation helpers (host targets) ─────────────────────────

#[cfg(not(target_os = "espidf"))]
impl BtConsoleAdapter {
    pub fn sim_open_link(&mut self) {
        self.sim.link_open = true;
    }

    pub fn sim_close_link(&mut self) {
        self.sim.link_open = false;
    }

    /// Queue an inbound line as if the peer had sent it.
    pub fn sim_push_line(&mut self, line: &str) {
        self.sim.inbound.push_back(line.to_owned());
    }

    /// Everything written to the peer so far.
    pub fn sim_outbound(&self) -> &[String] {
        &self.sim.outbound
    }
}

// ── ConsolePort ───────────────────────────────────────────────

impl ConsolePort for BtConsoleAdapter {
    fn link_open(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.started && platform::link_open()
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.started && self.sim.link_open
        }
    }

    fn read_line(&mut self) -> Option<String> {
        #[cfg(target_os = "espidf")]
        {
            platform::pop_line()
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if !self.link_open() {
                return None;
            }
            self.sim.inbound.pop_front()
        }
    }

    fn write_line(&mut self, line: &str) {
        #[cfg(target_os = "espidf")]
        platform::write_line(line);

        #[cfg(not(target_os = "espidf"))]
        if self.link_open() {
            self.sim.outbound.push(line.to_owned());
        }
    }

    fn shutdown(&mut self) {
        if !self.started {
            return;
        }
        #[cfg(target_os = "espidf")]
        platform::stop();

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim.link_open = false;
        }
        self.started = false;
        info!("Console: stopped");
    }
}

// ── ESP-IDF Bluedroid SPP bridge ──────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use esp_idf_svc::sys::*;
    use log::{info, warn};

    struct SppShared {
        link_open: bool,
        client_handle: Option<u32>,
        rx: Vec<u8>,
        lines: VecDeque<String>,
    }

    /// Bridge between the Bluedroid callback task and the main loop.
    static SPP_STATE: Mutex<SppShared> = Mutex::new(SppShared {
        link_open: false,
        client_handle: None,
        rx: Vec::new(),
        lines: VecDeque::new(),
    });

    unsafe extern "C" fn spp_callback(event: esp_spp_cb_event_t, param: *mut esp_spp_cb_param_t) {
        let Ok(mut state) = SPP_STATE.lock() else {
            return;
        };
        match event {
            e if e == esp_spp_cb_event_t_ESP_SPP_SRV_OPEN_EVT => {
                let handle = unsafe { (*param).srv_open.handle };
                state.link_open = true;
                state.client_handle = Some(handle);
                info!("Console: peer connected");
            }
            e if e == esp_spp_cb_event_t_ESP_SPP_CLOSE_EVT => {
                state.link_open = false;
                state.client_handle = None;
                state.rx.clear();
                info!("Console: peer disconnected");
            }
            e if e == esp_spp_cb_event_t_ESP_SPP_DATA_IND_EVT => {
                let data = unsafe {
                    core::slice::from_raw_parts(
                        (*param).data_ind.data,
                        (*param).data_ind.len as usize,
                    )
                };
                state.rx.extend_from_slice(data);
                // Lift complete lines out of the byte buffer.
                while let Some(pos) = state.rx.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = state.rx.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&raw).trim_end().to_owned();
                    state.lines.push_back(line);
                }
            }
            _ => {}
        }
    }

    pub fn start(device_name: &str) {
        // The BT controller and Bluedroid stack are brought up by the
        // BtDriver owned in main; this layers the SPP profile on top.
        unsafe {
            if esp_spp_register_callback(Some(spp_callback)) != ESP_OK {
                warn!("Console: SPP callback registration failed");
                return;
            }
            let cfg = esp_spp_cfg_t {
                mode: esp_spp_mode_t_ESP_SPP_MODE_CB,
                enable_l2cap_ertm: false,
                tx_buffer_size: 0,
            };
            if esp_spp_enhanced_init(&cfg) != ESP_OK {
                warn!("Console: SPP init failed");
                return;
            }

            let mut name_buf = [0u8; 32];
            let nb = device_name.as_bytes();
            let nl = nb.len().min(31);
            name_buf[..nl].copy_from_slice(&nb[..nl]);
            esp_bt_gap_set_device_name(name_buf.as_ptr() as *const _);
            esp_bt_gap_set_scan_mode(
                esp_bt_connection_mode_t_ESP_BT_CONNECTABLE,
                esp_bt_discovery_mode_t_ESP_BT_GENERAL_DISCOVERABLE,
            );
            esp_spp_start_srv(
                esp_spp_sec_t_ESP_SPP_SEC_AUTHENTICATE,
                esp_spp_role_t_ESP_SPP_ROLE_SLAVE,
                0,
                b"TankSentry\0".as_ptr() as *const _,
            );
        }
    }

    pub fn stop() {
        unsafe {
            esp_spp_deinit();
        }
        if let Ok(mut state) = SPP_STATE.lock() {
            state.link_open = false;
            state.client_handle = None;
            state.rx.clear();
            state.lines.clear();
        }
    }

    pub fn link_open() -> bool {
        SPP_STATE.lock().map(|s| s.link_open).unwrap_or(false)
    }

    pub fn pop_line() -> Option<String> {
        SPP_STATE.lock().ok()?.lines.pop_front()
    }

    pub fn write_line(line: &str) {
        let handle = match SPP_STATE.lock() {
            Ok(state) => state.client_handle,
            Err(_) => None,
        };
        let Some(handle) = handle else { return };
        let mut out = Vec::with_capacity(line.len() + 2);
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
        let ret = unsafe { esp_spp_write(handle, out.len() as i32, out.as_mut_ptr()) };
        if ret != ESP_OK {
            // Swallowed by contract; the log mirror already has the text.
            warn!("Console: SPP write failed ({ret})");
        }
    }
}
