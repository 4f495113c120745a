//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                      |
//! |------------|---------------|----------------------------------|
//! | `nvs`      | StoragePort   | NVS flash / in-memory store      |
//! | `radio`    | RadioPort     | 433 MHz ASK receiver (UART)      |
//! | `console`  | ConsolePort   | Bluetooth serial (SPP) link      |
//! | `wifi`     | NetworkPort   | ESP-IDF WiFi STA                 |
//! | `cloud`    | CloudPort     | ThingSpeak bulk-update endpoint  |
//! | `ddns`     | DdnsPort      | DuckDNS refresh endpoint         |
//! | `log_sink` | EventSink     | Serial log output                |
//! | `mdns`     | —             | mDNS `_http._tcp` advertisement  |
//! | `http`     | —             | Status/configuration web server  |
//! | `time`     | —             | Monotonic system timer           |

pub mod cloud;
pub mod console;
pub mod ddns;
pub mod log_sink;
pub mod mdns;
pub mod nvs;
pub mod radio;
pub mod time;
pub mod wifi;

#[cfg(target_os = "espidf")]
pub mod http;
