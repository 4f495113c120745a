//! TankSentry Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single cooperative loop:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  NvsAdapter      AskRadioAdapter   BtConsoleAdapter            │
//! │  (StoragePort)   (RadioPort)       (ConsolePort)               │
//! │  WifiAdapter     ThingSpeakAdapter DuckDnsAdapter  MdnsAdapter │
//! │  (NetworkPort)   (CloudPort)       (DdnsPort)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  AppService · ProvisioningMachine · Scheduler          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order: mount storage (fatal on failure), load settings, then
//! either bootstrap-connect with the stored credential (retrying forever)
//! or run the interactive provisioning machine over the Bluetooth
//! console. Only after one of those completes does telemetry ingest and
//! web serving begin — the two phases never overlap.
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use tanksentry::adapters::cloud::ThingSpeakAdapter;
use tanksentry::adapters::console::BtConsoleAdapter;
use tanksentry::adapters::ddns::DuckDnsAdapter;
use tanksentry::adapters::http::{self, CoreState, HttpServerAdapter, SharedCore};
use tanksentry::adapters::log_sink::LogEventSink;
use tanksentry::adapters::mdns::MdnsAdapter;
use tanksentry::adapters::nvs::NvsAdapter;
use tanksentry::adapters::radio::AskRadioAdapter;
use tanksentry::adapters::time::MonotonicClock;
use tanksentry::adapters::wifi::WifiAdapter;
use tanksentry::app::events::AppEvent;
use tanksentry::app::ports::{keys, CloudPort, ConsolePort, DdnsPort, EventSink, NetworkPort, StoragePort};
use tanksentry::app::service::{self, AppService};
use tanksentry::drivers::button::{self, ResetButton};
use tanksentry::pins;
use tanksentry::provisioning::{
    NetworkCredential, ProvisioningMachine, ProvisioningStep, SessionEvent, BOOTSTRAP_RETRY_MS,
    CONNECT_TIMEOUT_MS, TEARDOWN_GRACE_MS,
};
use tanksentry::scheduler::{Schedule, ScheduleFiredKind, ScheduleKind, Scheduler, SchedulerDelegate};

/// Cooperative loop period.
const TICK_MS: u64 = 50;
/// DDNS refresh cadence while online.
const DDNS_REFRESH_MS: u64 = 10_000;
/// Delay between the reset request and the actual wipe.
const RESET_WIPE_DELAY_MS: u64 = 1_000;
/// Notice period before the post-wipe restart.
const RESTART_NOTICE_MS: u64 = 3_000;

/// Which activity owns the loop right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Provisioning,
    Online,
}

/// Collects fired schedule labels; the loop acts on them afterwards so
/// the scheduler itself stays free of storage/network knowledge.
#[derive(Default)]
struct FiredLabels(Vec<String>);

impl SchedulerDelegate for FiredLabels {
    fn on_schedule_fired(&mut self, label: &str, _kind: ScheduleFiredKind) {
        self.0.push(label.to_owned());
    }
}

fn one_shot(label: &'static str, delay_ms: u64) -> Schedule {
    Schedule {
        label,
        kind: ScheduleKind::OneShot { delay_ms },
        enabled: true,
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TankSentry v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals =
        esp_idf_hal::peripherals::Peripherals::take().context("peripheral init failed")?;
    let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let nvs_partition = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    // ── 2. Mount storage — fatal when unavailable ─────────────
    let storage = NvsAdapter::new()
        .map_err(|e| anyhow!("persistent store mount failed ({e}); cannot continue"))?;

    // ── 3. Reset button ───────────────────────────────────────
    button::install(pins::RESET_BUTTON_GPIO)?;
    let mut reset_button = ResetButton::new(pins::RESET_BUTTON_GPIO);

    // ── 4. Load settings and build the core ───────────────────
    let settings = service::load_settings(&storage);
    info!(
        "Settings: depth={}cm offset={}cm cloud={} ddns={}",
        settings.tank_depth_cm,
        settings.offset_cm,
        settings.cloud_enabled(),
        settings.ddns_enabled(),
    );
    let core: SharedCore = Arc::new(Mutex::new(CoreState {
        app: AppService::new(settings),
        storage,
        clock: MonotonicClock::new(),
    }));

    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut sched = Scheduler::new();
    let mut fired = FiredLabels::default();

    // ── 5. Construct adapters ─────────────────────────────────
    let (wifi_modem, bt_modem) = peripherals.modem.split();
    let mut wifi = WifiAdapter::new(esp_idf_svc::wifi::EspWifi::new(
        wifi_modem,
        sysloop.clone(),
        Some(nvs_partition.clone()),
    )?);

    // 433 MHz receiver module streams decoded frames over UART1.
    let uart = esp_idf_hal::uart::UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio14, // TX — unused, the receiver never listens
        peripherals.pins.gpio13, // RX — pins::RADIO_RX_GPIO
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        &esp_idf_hal::uart::config::Config::default().baudrate(esp_idf_hal::units::Hertz(9600)),
    )?;
    let mut radio = AskRadioAdapter::new(uart);

    let mut hostname = heapless::String::<24>::new();
    hostname.push_str("tanksentry").ok();
    let mut console = BtConsoleAdapter::new(hostname.clone());
    let mut mdns = MdnsAdapter::new(hostname);
    let mut cloud = ThingSpeakAdapter::new();
    let mut ddns = DuckDnsAdapter::new();

    // Held for its lifetime; serving stops when it drops.
    let mut _http_server: Option<HttpServerAdapter> = None;
    let mut machine = ProvisioningMachine::new();
    let mut link_was_open = false;

    // ── 6. Bootstrap or interactive provisioning ──────────────
    let stored = {
        let state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;
        NetworkCredential::load(&state.storage)
    };

    let _bt_driver;
    let mut phase = match stored {
        Some(credential) => {
            // Accepted blocking phase: nothing else can run without the
            // network, so retry the stored credential forever.
            info!("Bootstrap: stored credential for '{}'", credential.ssid);
            loop {
                match wifi.connect(&credential.ssid, &credential.password, CONNECT_TIMEOUT_MS) {
                    Ok(ip) => {
                        sink.emit(&AppEvent::NetworkConnected { ip });
                        break;
                    }
                    Err(e) => {
                        warn!("Bootstrap: connect failed ({e}), waiting 10 seconds");
                        std::thread::sleep(Duration::from_millis(u64::from(BOOTSTRAP_RETRY_MS)));
                        info!("Bootstrap: retrying");
                    }
                }
            }
            _bt_driver = None;
            mdns.start();
            _http_server = Some(http::start(core.clone())?);
            sched.add(Schedule {
                label: "ddns-refresh",
                kind: ScheduleKind::Periodic {
                    interval_ms: DDNS_REFRESH_MS,
                },
                enabled: true,
            });
            Phase::Online
        }
        None => {
            info!("No stored credential — Bluetooth configuration enabled");
            let bt: esp_idf_svc::bt::BtDriver<'_, esp_idf_svc::bt::Classic> =
                esp_idf_svc::bt::BtDriver::new(bt_modem, Some(nvs_partition.clone()))?;
            _bt_driver = Some(bt);
            console.start();
            Phase::Provisioning
        }
    };

    info!("System ready. Entering main loop.");

    // ── 7. Cooperative loop ───────────────────────────────────
    loop {
        let now_ms = clock.now_ms();

        // Reset trigger: edge-triggered request arms the deferred wipe.
        if reset_button.tick() && !sched.is_armed("factory-reset") {
            sink.emit(&AppEvent::FactoryResetRequested);
            sched.add(one_shot("factory-reset", RESET_WIPE_DELAY_MS));
        }

        // Evaluate deadlines, then act on what fired.
        sched.tick(now_ms, &mut fired);
        for label in fired.0.drain(..) {
            match label.as_str() {
                "factory-reset" => {
                    let mut state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;
                    state.storage.wipe(keys::WIFI_NAMESPACE).ok();
                    state.storage.wipe(keys::SETTINGS_NAMESPACE).ok();
                    drop(state);
                    warn!("Factory reset: preferences deleted, rebooting in 3 seconds");
                    std::thread::sleep(Duration::from_millis(RESTART_NOTICE_MS));
                    unsafe { esp_idf_svc::sys::esp_restart() };
                }
                "console-teardown" => {
                    console.shutdown();
                    mdns.start();
                    match http::start(core.clone()) {
                        Ok(server) => _http_server = Some(server),
                        Err(e) => warn!("Web: server start failed ({e})"),
                    }
                }
                "ddns-refresh" => {
                    if let Some(ip) = wifi.ip() {
                        if let Err(e) = ddns.refresh(ip) {
                            warn!("DDNS: refresh failed ({e})");
                        }
                    }
                }
                other => warn!("Scheduler: unknown label '{other}'"),
            }
        }

        match phase {
            Phase::Provisioning => {
                let link_open = console.link_open();
                if link_open && !link_was_open {
                    machine.handle_event(SessionEvent::LinkOpened, &mut console);
                }
                if !link_open && link_was_open {
                    machine.handle_event(SessionEvent::LinkClosed, &mut console);
                }
                link_was_open = link_open;

                while let Some(line) = console.read_line() {
                    machine.handle_event(SessionEvent::Line(&line), &mut console);
                }

                let step = {
                    let mut state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;
                    machine.tick(now_ms, &mut console, &mut wifi, &mut state.storage, &mut sink)
                };
                if let ProvisioningStep::Connected(_) = step {
                    // Give the final confirmation lines time to flush.
                    sched.add(one_shot("console-teardown", u64::from(TEARDOWN_GRACE_MS)));
                    sched.add(Schedule {
                        label: "ddns-refresh",
                        kind: ScheduleKind::Periodic {
                            interval_ms: DDNS_REFRESH_MS,
                        },
                        enabled: true,
                    });
                    phase = Phase::Online;
                }
            }

            Phase::Online => {
                let mut state = core.lock().map_err(|_| anyhow!("core state poisoned"))?;

                // Keep the DDNS client pointed at the live settings.
                let config = state.app.config();
                ddns.configure(&config.ddns_domain, &config.ddns_token);

                let new_reading = state.app.ingest_tick(&mut radio, &mut sink, now_ms);

                // Forwarding is at-most-once and gated on holding an
                // address; offline samples are simply not uploaded.
                if new_reading && wifi.ip().is_some() && state.app.config().cloud_enabled() {
                    if let Some(sample) = state.app.cloud_sample() {
                        let api_key = state.app.config().cloud_api_key.clone();
                        let channel = state.app.config().cloud_channel_id;
                        if let Err(e) = cloud.push(&api_key, channel, &sample) {
                            warn!("Cloud: sample dropped ({e})");
                        }
                    }
                }
            }
        }

        std::thread::sleep(Duration::from_millis(TICK_MS));
    }
}
