//! GPIO pin assignments for the TankSentry base-station board.
//!
//! Single source of truth — drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// 433 MHz ASK receiver (superheterodyne module, data pin)
// ---------------------------------------------------------------------------

/// Receiver data output, sampled by the ASK demodulator.
pub const RADIO_RX_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Factory-reset button (active-high, rising-edge interrupt)
// ---------------------------------------------------------------------------

/// Momentary push-button that wipes both NVS namespaces and restarts.
pub const RESET_BUTTON_GPIO: i32 = 4;
