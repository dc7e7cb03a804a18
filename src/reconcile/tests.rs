use super::*;
use crate::device::{DeviceField, DeviceReading, FieldSet, Snapshot};
use std::time::Duration;
use tokio::time::Instant;

fn device(name: &str, is_on: bool, value: f64) -> DeviceReading {
    DeviceReading {
        name: name.to_string(),
        is_on,
        mode: Some("auto".to_string()),
        fan_speed: Some(1),
        air_quality: Some(1),
        air_quality_value: Some(value),
        filter_life: Some(90),
        ..Default::default()
    }
}

fn fields(list: &[DeviceField]) -> FieldSet {
    list.iter().copied().collect()
}

fn never_animating(_: crate::device::EntityKey) -> bool {
    false
}

#[test]
fn test_first_snapshot_initializes_without_records() {
    let mut diff = DiffEngine::new();
    assert!(!diff.is_initialized());

    let result = diff.reconcile(
        Snapshot::new(vec![device("a", true, 5.0), device("b", false, 9.0)]),
        never_animating,
    );

    assert_eq!(result.kind, MergeKind::Initial);
    assert!(result.is_quiet());
    assert!(diff.is_initialized());
    assert_eq!(diff.retained().len(), 2);
    assert_ne!(diff.retained()[0].key, diff.retained()[1].key);
}

#[test]
fn test_identical_snapshot_is_quiet() {
    let mut diff = DiffEngine::new();
    let snapshot = Snapshot::new(vec![device("a", true, 5.0), device("b", false, 9.0)]);
    diff.reconcile(snapshot.clone(), never_animating);
    let keys: Vec<_> = diff.retained().iter().map(|d| d.key).collect();

    let result = diff.reconcile(snapshot, never_animating);

    assert_eq!(result.kind, MergeKind::Positional);
    assert!(result.is_quiet());
    let after: Vec<_> = diff.retained().iter().map(|d| d.key).collect();
    assert_eq!(keys, after);
}

#[test]
fn test_power_toggle_produces_power_record() {
    let mut diff = DiffEngine::new();
    diff.reconcile(Snapshot::new(vec![device("a", false, 10.0)]), never_animating);

    let result = diff.reconcile(Snapshot::new(vec![device("a", true, 10.0)]), never_animating);

    assert_eq!(result.records.len(), 1);
    let record = &result.records[0];
    assert_eq!(record.index, 0);
    assert_eq!(record.fields, fields(&[DeviceField::Power]));
    assert!(record.newly_changed);
    assert!(diff.retained()[0].reading.is_on);
}

#[test]
fn test_identity_survives_when_every_field_changes() {
    let mut diff = DiffEngine::new();
    diff.reconcile(
        Snapshot::new(vec![device("a", false, 10.0), device("b", false, 3.0)]),
        never_animating,
    );
    let keys: Vec<_> = diff.retained().iter().map(|d| d.key).collect();

    let mut changed = device("a", true, 80.0);
    changed.mode = Some("sleep".to_string());
    changed.fan_speed = Some(4);
    changed.air_quality = Some(4);
    changed.filter_life = Some(10);
    let result = diff.reconcile(
        Snapshot::new(vec![changed, device("b", false, 3.0)]),
        never_animating,
    );

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].fields.len(), DeviceField::ALL.len());
    let after: Vec<_> = diff.retained().iter().map(|d| d.key).collect();
    assert_eq!(keys, after);
}

#[test]
fn test_count_change_takes_replace_path() {
    let mut diff = DiffEngine::new();
    diff.reconcile(
        Snapshot::new(vec![device("a", false, 10.0), device("b", false, 3.0)]),
        never_animating,
    );
    let key_a = diff.retained()[0].key;

    let result = diff.reconcile(
        Snapshot::new(vec![
            device("a", true, 50.0),
            device("b", true, 3.0),
            device("c", false, 1.0),
        ]),
        never_animating,
    );

    assert_eq!(result.kind, MergeKind::Replaced);
    assert!(result.is_quiet());
    assert_eq!(diff.retained().len(), 3);
    assert_eq!(diff.retained()[0].key, key_a);
    assert!(diff.retained()[0].reading.is_on);
}

#[test]
fn test_count_change_after_reorder_keeps_displayed_keys() {
    let mut diff = DiffEngine::new();
    diff.reconcile(
        Snapshot::new(vec![device("a", false, 1.0), device("b", false, 1.0)]),
        never_animating,
    );
    let first = diff.retained()[0].key;
    let second = diff.retained()[1].key;

    // Reordered: positions keep their keys, names follow the positions
    diff.reconcile(
        Snapshot::new(vec![device("b", true, 1.0), device("a", false, 1.0)]),
        never_animating,
    );
    assert_eq!(diff.retained()[0].key, first);
    assert_eq!(diff.retained()[1].key, second);

    let result = diff.reconcile(
        Snapshot::new(vec![
            device("b", true, 1.0),
            device("a", false, 1.0),
            device("c", false, 1.0),
        ]),
        never_animating,
    );
    assert_eq!(result.kind, MergeKind::Replaced);
    let retained = diff.retained();
    assert_eq!(retained[0].reading.name, "b");
    assert_eq!(retained[0].key, first);
    assert_eq!(retained[1].reading.name, "a");
    assert_eq!(retained[1].key, second);
    assert_ne!(retained[2].key, first);
    assert_ne!(retained[2].key, second);
}

#[test]
fn test_animating_device_is_not_reflagged() {
    let mut diff = DiffEngine::new();
    diff.reconcile(Snapshot::new(vec![device("a", false, 10.0)]), never_animating);
    let key = diff.retained()[0].key;

    let result = diff.reconcile(Snapshot::new(vec![device("a", true, 10.0)]), |k| k == key);

    assert_eq!(result.records.len(), 1);
    assert!(!result.records[0].newly_changed);
    assert_eq!(result.newly_changed().count(), 0);
}

#[test]
fn test_scheduler_opens_and_clears_in_order() {
    let mut scheduler = HighlightScheduler::new(&HighlightConfig::default());
    let key = crate::device::EntityKey::new(1);
    let start = Instant::now();

    assert!(scheduler.on_change(key, &fields(&[DeviceField::Power]), start));
    assert!(scheduler.is_updating(key));
    assert_eq!(scheduler.pending_timers(key), 2);
    assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_millis(1500)));

    assert!(scheduler
        .fire_due(start + Duration::from_millis(1499))
        .is_empty());

    let cleared = scheduler.fire_due(start + Duration::from_millis(1500));
    assert_eq!(cleared, vec![Transition::FieldsCleared(key)]);
    assert_eq!(scheduler.phase(key), Some(HighlightPhase::FieldsCleared));
    assert!(scheduler.highlighted(key).is_none());
    assert!(scheduler.is_updating(key));
    assert_eq!(scheduler.pending_timers(key), 1);

    let released = scheduler.fire_due(start + Duration::from_millis(1600));
    assert_eq!(released, vec![Transition::Released(key)]);
    assert!(!scheduler.is_updating(key));
    assert_eq!(scheduler.pending_timers(key), 0);
    assert_eq!(scheduler.next_deadline(), None);
}

#[test]
fn test_rapid_changes_keep_original_deadlines() {
    let mut scheduler = HighlightScheduler::new(&HighlightConfig::default());
    let key = crate::device::EntityKey::new(7);
    let start = Instant::now();

    assert!(scheduler.on_change(key, &fields(&[DeviceField::Power]), start));
    assert!(!scheduler.on_change(
        key,
        &fields(&[DeviceField::Mode]),
        start + Duration::from_millis(700)
    ));

    assert_eq!(scheduler.pending_timers(key), 2);
    assert_eq!(scheduler.started_at(key), Some(start));
    assert_eq!(
        scheduler.highlighted(key),
        Some(&fields(&[DeviceField::Power, DeviceField::Mode]))
    );

    let all = scheduler.fire_due(start + Duration::from_millis(1600));
    assert_eq!(
        all,
        vec![Transition::FieldsCleared(key), Transition::Released(key)]
    );
    assert!(scheduler.fire_due(start + Duration::from_secs(10)).is_empty());
}

#[test]
fn test_change_after_fields_cleared_does_not_remark() {
    let mut scheduler = HighlightScheduler::new(&HighlightConfig::default());
    let key = crate::device::EntityKey::new(2);
    let start = Instant::now();

    scheduler.on_change(key, &fields(&[DeviceField::Power]), start);
    scheduler.fire_due(start + Duration::from_millis(1550));
    scheduler.on_change(
        key,
        &fields(&[DeviceField::FanSpeed]),
        start + Duration::from_millis(1560),
    );

    assert!(scheduler.highlighted(key).is_none());
    scheduler.fire_due(start + Duration::from_millis(1600));
    assert!(!scheduler.is_active(key));
}

#[test]
fn test_empty_field_set_does_not_open_window() {
    let mut scheduler = HighlightScheduler::new(&HighlightConfig::default());
    let key = crate::device::EntityKey::new(3);
    assert!(!scheduler.on_change(key, &FieldSet::new(), Instant::now()));
    assert!(!scheduler.is_active(key));
}

#[test]
fn test_teardown_and_retain_cancel_timers() {
    let mut scheduler = HighlightScheduler::new(&HighlightConfig::default());
    let now = Instant::now();
    let power = fields(&[DeviceField::Power]);
    for raw in 1..=3 {
        scheduler.on_change(crate::device::EntityKey::new(raw), &power, now);
    }

    let cancelled = scheduler.retain(|k| k.get() != 2);
    assert_eq!(cancelled, 1);
    assert_eq!(scheduler.active_count(), 2);

    assert_eq!(scheduler.teardown(), 2);
    assert_eq!(scheduler.next_deadline(), None);
    assert!(scheduler.fire_due(now + Duration::from_secs(5)).is_empty());
}
