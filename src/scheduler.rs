//! Deferred-action scheduler.
//!
//! Drives the periodic and one-shot housekeeping work of the main loop:
//! the DDNS refresh cadence, the deferred factory wipe after a reset
//! request, and the console teardown grace after provisioning succeeds.
//!
//! Deadlines are monotonic-clock checks evaluated once per loop tick —
//! nothing here sleeps or blocks. When a schedule fires, the scheduler
//! notifies a [`SchedulerDelegate`]; the caller decides what the fire
//! means. This keeps the engine independently testable and free of any
//! knowledge about storage, network, or the console.

use log::info;

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Stable label the delegate dispatches on (e.g. `"ddns-refresh"`).
    pub label: &'static str,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum ScheduleKind {
    /// Fire every `interval_ms` milliseconds.
    Periodic { interval_ms: u64 },
    /// Fire once after `delay_ms`, then auto-disable.
    OneShot { delay_ms: u64 },
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    Periodic,
    OneShot,
}

/// Callback trait the scheduler invokes when a schedule fires.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Deadline base: arm time for one-shots, last fire for periodics.
    /// Seeded from `now_ms` on the first tick after insertion.
    base_ms: Option<u64>,
}

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule. Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    base_ms: None,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if slot < MAX_SCHEDULES {
            if let Some(entry) = &self.schedules[slot] {
                info!(
                    "Scheduler: removed '{}' from slot {}",
                    entry.schedule.label, slot
                );
            }
            self.schedules[slot] = None;
        }
    }

    /// Whether any schedule with this label is currently armed.
    pub fn is_armed(&self, label: &str) -> bool {
        self.schedules
            .iter()
            .flatten()
            .any(|e| e.schedule.enabled && e.schedule.label == label)
    }

    /// Evaluate deadlines. Call once per loop tick with the monotonic time.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for slot in &mut self.schedules {
            let Some(entry) = slot else { continue };
            if !entry.schedule.enabled {
                continue;
            }

            let base = *entry.base_ms.get_or_insert(now_ms);

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_ms } => {
                    if now_ms.saturating_sub(base) >= interval_ms {
                        delegate
                            .on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Periodic);
                        entry.base_ms = Some(now_ms);
                    }
                }
                ScheduleKind::OneShot { delay_ms } => {
                    if now_ms.saturating_sub(base) >= delay_ms {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {}ms)",
                            entry.schedule.label, delay_ms
                        );
                        delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::OneShot);
                        entry.schedule.enabled = false; // Auto-disable.
                    }
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingDelegate {
        fires: Vec<(String, ScheduleFiredKind)>,
    }

    impl RecordingDelegate {
        fn new() -> Self {
            Self { fires: Vec::new() }
        }
    }

    impl SchedulerDelegate for RecordingDelegate {
        fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
            self.fires.push((label.to_owned(), kind));
        }
    }

    fn periodic(label: &'static str, interval_ms: u64) -> Schedule {
        Schedule {
            label,
            kind: ScheduleKind::Periodic { interval_ms },
            enabled: true,
        }
    }

    fn one_shot(label: &'static str, delay_ms: u64) -> Schedule {
        Schedule {
            label,
            kind: ScheduleKind::OneShot { delay_ms },
            enabled: true,
        }
    }

    #[test]
    fn periodic_fires_on_interval() {
        let mut sched = Scheduler::new();
        let mut del = RecordingDelegate::new();
        sched.add(periodic("p", 10_000));

        sched.tick(0, &mut del); // arms
        sched.tick(9_999, &mut del);
        assert!(del.fires.is_empty());
        sched.tick(10_000, &mut del);
        assert_eq!(del.fires.len(), 1);
        sched.tick(19_999, &mut del);
        assert_eq!(del.fires.len(), 1);
        sched.tick(20_000, &mut del);
        assert_eq!(del.fires.len(), 2);
    }

    #[test]
    fn one_shot_fires_once_then_disables() {
        let mut sched = Scheduler::new();
        let mut del = RecordingDelegate::new();
        sched.add(one_shot("reset", 1_000));

        sched.tick(5_000, &mut del); // arms at 5000
        assert!(del.fires.is_empty());
        sched.tick(6_000, &mut del);
        assert_eq!(del.fires, vec![("reset".to_owned(), ScheduleFiredKind::OneShot)]);
        assert!(!sched.is_armed("reset"));

        sched.tick(60_000, &mut del);
        assert_eq!(del.fires.len(), 1, "one-shot must not re-fire");
    }

    #[test]
    fn is_armed_tracks_pending_one_shot() {
        let mut sched = Scheduler::new();
        let mut del = RecordingDelegate::new();
        let slot = sched.add(one_shot("teardown", 2_000)).unwrap();
        assert!(sched.is_armed("teardown"));
        sched.tick(0, &mut del);
        assert!(sched.is_armed("teardown"));
        sched.remove(slot);
        assert!(!sched.is_armed("teardown"));
    }

    #[test]
    fn slots_are_bounded() {
        let mut sched = Scheduler::new();
        for i in 0..MAX_SCHEDULES {
            assert_eq!(sched.add(periodic("x", 1_000)), Some(i));
        }
        assert_eq!(sched.add(periodic("overflow", 1_000)), None);
    }
}
