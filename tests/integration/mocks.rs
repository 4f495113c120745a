//! Mock adapters for integration tests.
//!
//! `MockStorage` and `MockNetwork` share an ordered event log so tests
//! can assert cross-adapter sequencing (e.g. credential persisted before
//! the connect attempt is issued).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use core::net::Ipv4Addr;

use tanksentry::app::events::AppEvent;
use tanksentry::app::ports::{EventSink, NetworkPort, ScanNetwork, StoragePort};
use tanksentry::error::{CommsError, StorageError};

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

// ── MockStorage ───────────────────────────────────────────────

pub struct MockStorage {
    map: HashMap<String, Vec<u8>>,
    log: EventLog,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new(log: EventLog) -> Self {
        Self {
            map: HashMap::new(),
            log,
        }
    }

    fn composite(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }
}

impl StoragePort for MockStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.map.get(&Self::composite(namespace, key)) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.log.borrow_mut().push(format!("persist:{namespace}/{key}"));
        self.map.insert(Self::composite(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.map.remove(&Self::composite(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.map.contains_key(&Self::composite(namespace, key))
    }

    fn wipe(&mut self, namespace: &str) -> Result<(), StorageError> {
        self.log.borrow_mut().push(format!("wipe:{namespace}"));
        let prefix = format!("{namespace}::");
        self.map.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    log: EventLog,
    /// Scan results served in order; the last entry repeats.
    scans: VecDeque<Vec<ScanNetwork>>,
    /// The one credential pair that connects successfully.
    valid: Option<(String, String)>,
    ip: Option<Ipv4Addr>,
    pub scan_count: u32,
    pub connect_attempts: u32,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            scans: VecDeque::new(),
            valid: None,
            ip: None,
            scan_count: 0,
            connect_attempts: 0,
        }
    }

    pub fn queue_scan(&mut self, ssids: &[(&str, i8)]) {
        self.scans.push_back(
            ssids
                .iter()
                .map(|(ssid, rssi)| ScanNetwork {
                    ssid: (*ssid).to_owned(),
                    rssi_dbm: *rssi,
                })
                .collect(),
        );
    }

    pub fn set_valid_credential(&mut self, ssid: &str, password: &str) {
        self.valid = Some((ssid.to_owned(), password.to_owned()));
    }
}

impl NetworkPort for MockNetwork {
    fn scan(&mut self) -> Result<Vec<ScanNetwork>, CommsError> {
        self.scan_count += 1;
        self.log.borrow_mut().push("scan".to_owned());
        let next = if self.scans.len() > 1 {
            self.scans.pop_front()
        } else {
            self.scans.front().cloned()
        };
        Ok(next.unwrap_or_default())
    }

    fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        _timeout_ms: u32,
    ) -> Result<Ipv4Addr, CommsError> {
        self.connect_attempts += 1;
        self.log.borrow_mut().push(format!("connect:{ssid}"));
        let ok = self
            .valid
            .as_ref()
            .is_some_and(|(s, p)| s == ssid && p == password);
        if ok {
            let ip = Ipv4Addr::new(192, 168, 1, 77);
            self.ip = Some(ip);
            Ok(ip)
        } else {
            Err(CommsError::ConnectTimeout)
        }
    }

    fn ip(&self) -> Option<Ipv4Addr> {
        self.ip
    }

    fn disconnect(&mut self) {
        self.ip = None;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
