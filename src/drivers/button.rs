//! Factory-reset button driver.
//!
//! The ISR does the minimum possible — it records a raw timestamp into an
//! atomic and returns. The `tick()` method, called from the main loop at
//! tick rate, debounces that into an edge-triggered reset request. The
//! request itself only *arms* the deferred wipe; the wipe runs when the
//! one-shot scheduler entry fires, never inside the handler.

use core::sync::atomic::{AtomicU32, Ordering};

use log::info;

const DEBOUNCE_MS: u32 = 50;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the main loop. Zero = never pressed.
static RESET_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// Record a press from interrupt context. Lock-free and non-blocking.
pub fn note_press_from_isr(now_ms: u32) {
    RESET_ISR_TIMESTAMP.store(now_ms.max(1), Ordering::Release);
}

/// Debounced edge detector over the ISR timestamp.
pub struct ResetButton {
    gpio: i32,
    last_seen_ms: u32,
}

impl ResetButton {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            last_seen_ms: 0,
        }
    }

    /// GPIO pin this button is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the main loop each tick. Returns `true` exactly once per
    /// debounced press — an edge, not a level.
    pub fn tick(&mut self) -> bool {
        let isr_ms = RESET_ISR_TIMESTAMP.load(Ordering::Acquire);
        if isr_ms == 0 || isr_ms == self.last_seen_ms {
            return false;
        }
        let is_bounce =
            self.last_seen_ms != 0 && isr_ms.wrapping_sub(self.last_seen_ms) < DEBOUNCE_MS;
        self.last_seen_ms = isr_ms;
        if is_bounce {
            return false;
        }
        info!("Button: reset press registered");
        true
    }

    #[cfg(test)]
    pub(crate) fn test_reset_static() {
        RESET_ISR_TIMESTAMP.store(0, Ordering::Release);
    }
}

// ── ESP-IDF ISR wiring ────────────────────────────────────────

/// Configure the pin and attach the rising-edge ISR.
#[cfg(target_os = "espidf")]
pub fn install(gpio: i32) -> anyhow::Result<()> {
    use esp_idf_svc::sys::*;

    unsafe extern "C" fn reset_button_isr(_arg: *mut core::ffi::c_void) {
        // SAFETY: esp_timer_get_time is ISR-safe per ESP-IDF docs.
        let now_ms = (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32;
        note_press_from_isr(now_ms);
    }

    unsafe {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
        };
        esp!(gpio_config(&cfg))?;
        // Ignore "already installed" from a prior subsystem.
        let _ = gpio_install_isr_service(0);
        esp!(gpio_isr_handler_add(
            gpio,
            Some(reset_button_isr),
            core::ptr::null_mut(),
        ))?;
    }
    Ok(())
}
