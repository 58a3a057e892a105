//! Reminder poll cycles against a file-backed store.

use cadence_core::{
    DedupeContext, EntityStore, IntervalUnit, RecordingNotifier, Reminder, ReminderService,
    SqliteStore,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
}

#[test]
fn test_one_time_reminder_fires_once_and_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_at(&dir.path().join("cadence.db")).unwrap();
    let notifier = RecordingNotifier::new();
    let svc = ReminderService::new(&store, &notifier);

    svc.create_one_time("u1", "Dentist", "10am appointment", at(3, 4, 9))
        .unwrap();

    let mut ctx = DedupeContext::new();
    assert!(svc.poll("u1", at(3, 4, 8), &mut ctx).unwrap().fired.is_empty());

    let report = svc.poll("u1", at(3, 4, 9), &mut ctx).unwrap();
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].notification.body, "10am appointment");
    assert!(svc.list("u1").unwrap().is_empty());

    let later = svc.poll("u1", at(3, 5, 9), &mut ctx).unwrap();
    assert!(later.fired.is_empty());
    assert_eq!(notifier.delivered().len(), 1);
}

#[test]
fn test_late_ongoing_reminder_advances_from_schedule() {
    let store = SqliteStore::open_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let svc = ReminderService::new(&store, &notifier);
    let r = svc
        .create_ongoing("u1", "Take meds", "", at(3, 4, 8), IntervalUnit::Days, 1)
        .unwrap();

    // Observed three hours late.
    let mut ctx = DedupeContext::new();
    let report = svc.poll("u1", at(3, 4, 11), &mut ctx).unwrap();
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].scheduled_for, at(3, 4, 8));

    let stored: Reminder = store.require(&r.id).unwrap();
    assert_eq!(stored.remind_at, at(3, 5, 8));
}

#[test]
fn test_restart_does_not_refire_persisted_transition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cadence.db");
    let notifier = RecordingNotifier::new();

    let id = {
        let store = SqliteStore::open_at(&path).unwrap();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc
            .create_ongoing("u1", "Weekly review", "", at(3, 1, 17), IntervalUnit::Weeks, 1)
            .unwrap();
        let mut ctx = DedupeContext::new();
        svc.poll("u1", at(3, 1, 17), &mut ctx).unwrap();
        r.id
    };

    // A fresh process starts with an empty dedupe context.
    let store = SqliteStore::open_at(&path).unwrap();
    let svc = ReminderService::new(&store, &notifier);
    let mut ctx = DedupeContext::new();
    let report = svc.poll("u1", at(3, 1, 17) + Duration::minutes(1), &mut ctx).unwrap();
    assert!(report.fired.is_empty());

    let stored: Reminder = store.require(&id).unwrap();
    assert_eq!(stored.remind_at, at(3, 8, 17));
    assert_eq!(notifier.delivered().len(), 1);
}

#[test]
fn test_monthly_reminder_clamps_to_month_end() {
    let store = SqliteStore::open_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let svc = ReminderService::new(&store, &notifier);
    let r = svc
        .create_ongoing("u1", "Invoice", "", at(1, 31, 9), IntervalUnit::Months, 1)
        .unwrap();

    let mut ctx = DedupeContext::new();
    svc.poll("u1", at(1, 31, 9), &mut ctx).unwrap();
    let stored: Reminder = store.require(&r.id).unwrap();
    assert_eq!(stored.remind_at, at(2, 29, 9));
}

#[test]
fn test_owners_are_isolated() {
    let store = SqliteStore::open_memory().unwrap();
    let notifier = RecordingNotifier::new();
    let svc = ReminderService::new(&store, &notifier);
    svc.create_one_time("alice", "A", "", at(3, 1, 9)).unwrap();
    svc.create_one_time("bob", "B", "", at(3, 1, 9)).unwrap();

    let mut ctx = DedupeContext::new();
    let report = svc.poll("alice", at(3, 1, 9), &mut ctx).unwrap();
    assert_eq!(report.fired.len(), 1);
    assert_eq!(report.fired[0].owner_id, "alice");
    assert_eq!(svc.list("bob").unwrap().len(), 1);
}
