//! 433 MHz ASK receiver adapter.
//!
//! Implements [`RadioPort`]. The receiver module carries its own ASK
//! demodulator and streams each recovered message over UART, terminated
//! with a newline; this adapter reassembles those bytes into complete
//! frames without ever blocking the loop.
//!
//! On host targets a scripted queue stands in for the UART so ingest
//! paths are testable end to end.

use crate::app::ports::RadioPort;
use crate::telemetry::codec::ASK_MAX_MESSAGE_LEN;

/// Discard buffered bytes beyond this and resynchronise on the next
/// frame boundary.
const RESYNC_LIMIT: usize = ASK_MAX_MESSAGE_LEN * 2;

pub struct AskRadioAdapter {
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
    #[cfg(target_os = "espidf")]
    pending: Vec<u8>,

    #[cfg(not(target_os = "espidf"))]
    sim_frames: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(target_os = "espidf")]
impl AskRadioAdapter {
    /// Wrap the UART the receiver module is attached to.
    pub fn new(uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self {
            uart,
            pending: Vec::new(),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl AskRadioAdapter {
    pub fn new() -> Self {
        Self {
            sim_frames: std::collections::VecDeque::new(),
        }
    }

    /// Queue a frame for the next `receive()` call.
    pub fn sim_push_frame(&mut self, frame: &[u8]) {
        self.sim_frames.push_back(frame.to_vec());
    }
}

impl RadioPort for AskRadioAdapter {
    fn receive(&mut self) -> Option<Vec<u8>> {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_hal::delay::NON_BLOCK;

            let mut chunk = [0u8; 64];
            loop {
                match self.uart.read(&mut chunk, NON_BLOCK) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                }
            }

            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let mut frame: Vec<u8> = self.pending.drain(..=pos).collect();
                frame.pop(); // the newline itself
                if frame.last() == Some(&b'\r') {
                    frame.pop();
                }
                if frame.is_empty() {
                    return None;
                }
                return Some(frame);
            }

            if self.pending.len() > RESYNC_LIMIT {
                log::warn!(
                    "Radio: no frame boundary in {} bytes, resyncing",
                    self.pending.len()
                );
                self.pending.clear();
            }
            None
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_frames.pop_front()
        }
    }
}
