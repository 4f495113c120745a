//! Interactive network provisioning over the out-of-band console.
//!
//! ```text
//!  Idle ──[link open]──▶ ScanRequested ──[N>0]──▶ ScanComplete
//!                              ▲                       │
//!                              │                 [index line]
//!                        [2 s deadline]                ▼
//!                              │                  SsidChosen
//!                        ConnectFailed                 │
//!                              ▲                  [prompt sent]
//!                              │                       ▼
//!                          [timeout]            AwaitingPassword
//!                              │                       │
//!                              │                [password line]
//!                              │                       ▼
//!                         Connecting ◀──────── PasswordChosen
//!                              │
//!                         [associated]
//!                              ▼
//!                          Connected   (terminal — link torn down)
//! ```
//!
//! The machine is a tagged state consumed by two dispatch points:
//! [`ProvisioningMachine::handle_event`] for inbound link events and
//! lines, and [`ProvisioningMachine::tick`] for the outbound work of the
//! current stage. Every user-visible step is written to the session
//! channel and mirrored to the diagnostic log; the two sinks are
//! independent and neither failing blocks the other.
//!
//! The retry edge is unbounded: connect failures loop back to a fresh
//! scan forever. The 2 s failure pause is a monotonic deadline checked
//! from the cooperative loop, not a blocking sleep.

pub mod session;

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ConsolePort, EventSink, NetworkPort, StoragePort};

pub use session::{NetworkCredential, ProvisioningSession};

/// Bounded connect attempt during provisioning, milliseconds.
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;
/// Pause after a failed attempt before rescanning, milliseconds.
pub const RETRY_DELAY_MS: u64 = 2_000;
/// Bootstrap reconnect interval for a stored credential, milliseconds.
pub const BOOTSTRAP_RETRY_MS: u32 = 10_000;
/// Grace before the console link is torn down after success, so the final
/// confirmation lines flush to the peer.
pub const TEARDOWN_GRACE_MS: u32 = 2_000;

// ───────────────────────────────────────────────────────────────
// Stages and events
// ───────────────────────────────────────────────────────────────

/// Dialogue stage. `Connected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ScanRequested,
    ScanComplete,
    SsidChosen,
    AwaitingPassword,
    PasswordChosen,
    Connecting,
    Connected,
    ConnectFailed {
        /// Monotonic deadline after which the machine rescans.
        retry_at_ms: u64,
    },
}

/// Inbound events from the console link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent<'a> {
    /// The peer opened the link.
    LinkOpened,
    /// The peer dropped the link; the session resets implicitly.
    LinkClosed,
    /// One complete inbound line.
    Line(&'a str),
}

/// Outcome of one [`ProvisioningMachine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    /// Still in progress.
    Pending,
    /// Terminal success: the environment should flush and tear down the
    /// console link, then start normal network service.
    Connected(Ipv4Addr),
}

// ───────────────────────────────────────────────────────────────
// Machine
// ───────────────────────────────────────────────────────────────

/// The interactive provisioning state machine.
///
/// Engaged only when no usable stored credential exists; a stored
/// credential takes the bootstrap path instead and this machine never
/// runs.
pub struct ProvisioningMachine {
    stage: Stage,
    session: ProvisioningSession,
}

impl ProvisioningMachine {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            session: ProvisioningSession::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_connected(&self) -> bool {
        self.stage == Stage::Connected
    }

    /// Dispatch an inbound link event.
    pub fn handle_event(&mut self, event: SessionEvent<'_>, console: &mut impl ConsolePort) {
        match event {
            SessionEvent::LinkOpened => {
                if self.stage == Stage::Idle {
                    info!("Provisioning: link open, starting scan");
                    self.stage = Stage::ScanRequested;
                }
            }
            SessionEvent::LinkClosed => {
                if self.stage != Stage::Connected {
                    info!("Provisioning: link closed, session reset");
                    self.session.reset();
                    self.stage = Stage::Idle;
                }
            }
            SessionEvent::Line(line) => self.handle_line(line, console),
        }
    }

    fn handle_line(&mut self, line: &str, console: &mut impl ConsolePort) {
        match self.stage {
            Stage::ScanComplete => {
                // 1-based index into the current scan. Non-numeric or
                // out-of-range input re-prompts rather than panicking on
                // an unchecked access.
                let selected = line
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .is_some_and(|index| self.session.choose_ssid(index));
                if selected {
                    info!(
                        "Provisioning: network '{}' selected",
                        self.session.candidate_ssid().unwrap_or_default()
                    );
                    self.stage = Stage::SsidChosen;
                } else {
                    announce(console, "Invalid selection, enter a number from the list");
                }
            }
            Stage::AwaitingPassword => {
                let password = line.trim();
                if password.len() > session::MAX_PASSWORD_LEN {
                    announce(console, "Password too long, try again");
                    return;
                }
                self.session.set_candidate_password(password);
                self.stage = Stage::PasswordChosen;
            }
            // Lines outside an input stage are ignored.
            _ => {}
        }
    }

    /// Drive the outbound work of the current stage.
    ///
    /// The only call that blocks for a non-trivial bounded duration is the
    /// connect attempt (at most [`CONNECT_TIMEOUT_MS`]); everything else
    /// returns immediately or arms a deadline for a later tick.
    pub fn tick(
        &mut self,
        now_ms: u64,
        console: &mut impl ConsolePort,
        network: &mut impl NetworkPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> ProvisioningStep {
        match self.stage {
            Stage::Idle | Stage::ScanComplete | Stage::AwaitingPassword | Stage::Connected => {
                ProvisioningStep::Pending
            }

            Stage::ScanRequested => {
                self.run_scan(console, network);
                ProvisioningStep::Pending
            }

            Stage::SsidChosen => {
                announce(console, "Please enter your Wi-Fi password");
                self.stage = Stage::AwaitingPassword;
                ProvisioningStep::Pending
            }

            Stage::PasswordChosen => {
                announce(console, "Please wait for Wi-Fi connection...");
                self.stage = Stage::Connecting;
                ProvisioningStep::Pending
            }

            Stage::Connecting => self.run_connect(now_ms, console, network, storage, sink),

            Stage::ConnectFailed { retry_at_ms } => {
                if now_ms >= retry_at_ms {
                    self.stage = Stage::ScanRequested;
                }
                ProvisioningStep::Pending
            }
        }
    }

    // ── Stage bodies ──────────────────────────────────────────

    fn run_scan(&mut self, console: &mut impl ConsolePort, network: &mut impl NetworkPort) {
        announce(console, "Scanning Wi-Fi networks");
        let results = match network.scan() {
            Ok(r) => r,
            Err(e) => {
                warn!("Provisioning: scan failed ({e})");
                announce(console, "Scan failed, retrying");
                return;
            }
        };

        if results.is_empty() {
            announce(console, "no networks found");
            return;
        }

        announce(console, &format!("{} networks found", results.len()));
        for (i, net) in results.iter().enumerate() {
            announce(
                console,
                &format!("{}: {} (Strength:{})", i + 1, net.ssid, net.rssi_dbm),
            );
        }
        self.session.set_scan_results(results);
        announce(console, "Please enter the number for your Wi-Fi");
        self.stage = Stage::ScanComplete;
    }

    fn run_connect(
        &mut self,
        now_ms: u64,
        console: &mut impl ConsolePort,
        network: &mut impl NetworkPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> ProvisioningStep {
        let Some(credential) = self.session.candidate() else {
            // Candidate lost (link bounce mid-dialogue) — start over.
            warn!("Provisioning: no candidate credential, rescanning");
            self.stage = Stage::ScanRequested;
            return ProvisioningStep::Pending;
        };

        // Persist before the attempt completes so a later boot can reuse
        // the pair even if this session dies mid-connect.
        if let Err(e) = credential.persist(storage) {
            warn!("Provisioning: credential persist failed ({e})");
        } else {
            sink.emit(&AppEvent::CredentialPersisted {
                ssid: credential.ssid.clone(),
            });
        }

        match network.connect(&credential.ssid, &credential.password, CONNECT_TIMEOUT_MS) {
            Ok(ip) => {
                announce(console, &format!("Connected, IP: {ip}"));
                sink.emit(&AppEvent::NetworkConnected { ip });
                self.stage = Stage::Connected;
                ProvisioningStep::Connected(ip)
            }
            Err(e) => {
                warn!("Provisioning: connect failed ({e})");
                announce(console, "Wi-Fi connection failed");
                self.stage = Stage::ConnectFailed {
                    retry_at_ms: now_ms + RETRY_DELAY_MS,
                };
                ProvisioningStep::Pending
            }
        }
    }
}

impl Default for ProvisioningMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a line to the session channel and mirror it to the diagnostic
/// log. The sinks are independent: console send failures are swallowed by
/// the adapter and never suppress the log entry.
fn announce(console: &mut impl ConsolePort, text: &str) {
    console.write_line(text);
    info!("Provisioning: {text}");
}
