//! Integration tests for the factory-reset path.
//!
//! The trigger flow mirrors the main loop: a button ISR records a
//! timestamp, the loop's debounced edge arms a one-shot schedule, and
//! only that schedule's firing wipes the two namespaces.

use tanksentry::app::ports::{keys, StoragePort};
use tanksentry::app::service::load_settings;
use tanksentry::config::TankConfig;
use tanksentry::drivers::button::{note_press_from_isr, ResetButton};
use tanksentry::provisioning::NetworkCredential;
use tanksentry::scheduler::{Schedule, ScheduleFiredKind, ScheduleKind, Scheduler, SchedulerDelegate};

use crate::mocks::{new_log, MockStorage};

fn populated_storage() -> MockStorage {
    let mut storage = MockStorage::new(new_log());
    NetworkCredential::new("HomeNet", "password1")
        .unwrap()
        .persist(&mut storage)
        .unwrap();
    storage
        .put_u32(keys::SETTINGS_NAMESPACE, keys::TANK_DEPTH, 250)
        .unwrap();
    storage
        .put_string(keys::SETTINGS_NAMESPACE, keys::CLOUD_API_KEY, "KEY")
        .unwrap();
    storage
}

fn wipe_both(storage: &mut MockStorage) {
    storage.wipe(keys::WIFI_NAMESPACE).unwrap();
    storage.wipe(keys::SETTINGS_NAMESPACE).unwrap();
}

#[derive(Default)]
struct Fired(Vec<String>);

impl SchedulerDelegate for Fired {
    fn on_schedule_fired(&mut self, label: &str, _kind: ScheduleFiredKind) {
        self.0.push(label.to_owned());
    }
}

#[test]
fn wipe_clears_credential_and_settings_to_defaults() {
    let mut storage = populated_storage();
    assert!(NetworkCredential::load(&storage).is_some());
    assert_ne!(load_settings(&storage), TankConfig::default());

    wipe_both(&mut storage);

    // What the next boot sees: no credential, all settings at default.
    assert!(NetworkCredential::load(&storage).is_none());
    assert_eq!(load_settings(&storage), TankConfig::default());
}

#[test]
fn reset_request_is_deferred_until_the_one_shot_fires() {
    let mut storage = populated_storage();
    let mut button = ResetButton::new(4);
    let mut sched = Scheduler::new();
    let mut fired = Fired::default();

    // ISR records the press; the loop's edge arms the deferred wipe.
    note_press_from_isr(10_000);
    assert!(button.tick());
    sched.add(Schedule {
        label: "factory-reset",
        kind: ScheduleKind::OneShot { delay_ms: 1_000 },
        enabled: true,
    });

    // Before the deadline nothing is wiped.
    sched.tick(10_000, &mut fired);
    sched.tick(10_500, &mut fired);
    assert!(fired.0.is_empty());
    assert!(NetworkCredential::load(&storage).is_some());

    // The one-shot fires once; the loop wipes both namespaces.
    sched.tick(11_000, &mut fired);
    assert_eq!(fired.0, ["factory-reset".to_owned()]);
    wipe_both(&mut storage);

    assert!(NetworkCredential::load(&storage).is_none());
    assert_eq!(load_settings(&storage), TankConfig::default());

    // Holding the button produces no second request without a new edge.
    assert!(!button.tick());
    sched.tick(20_000, &mut fired);
    assert_eq!(fired.0.len(), 1, "one-shot does not re-fire");
}
