//! Reminder operations and the poll cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delivery::Notifier;
use crate::error::{Result, StorageError};
use crate::reminder::{
    DedupeContext, Firing, IntervalUnit, Reminder, ReminderScheduler, ReminderTransition,
};
use crate::storage::EntityStore;

/// A reminder the poll could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedReminder {
    pub reminder_id: String,
    pub error: String,
}

/// Result of one poll cycle.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PollReport {
    pub polled_at: Option<DateTime<Utc>>,
    pub fired: Vec<Firing>,
    pub failed: Vec<FailedReminder>,
    pub delivery_failures: usize,
}

pub struct ReminderService<'a, S, N> {
    store: &'a S,
    notifier: N,
    scheduler: ReminderScheduler,
    deliver: bool,
}

impl<'a, S: EntityStore, N: Notifier> ReminderService<'a, S, N> {
    pub fn new(store: &'a S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            scheduler: ReminderScheduler::new(),
            deliver: true,
        }
    }

    /// Turn delivery off while still advancing schedules.
    pub fn with_delivery(mut self, enabled: bool) -> Self {
        self.deliver = enabled;
        self
    }

    pub fn create_one_time(
        &self,
        owner_id: &str,
        title: &str,
        body: &str,
        remind_at: DateTime<Utc>,
    ) -> Result<Reminder> {
        let reminder = Reminder::one_time(owner_id, title, body, remind_at);
        self.store.put(&reminder)?;
        Ok(reminder)
    }

    pub fn create_ongoing(
        &self,
        owner_id: &str,
        title: &str,
        body: &str,
        remind_at: DateTime<Utc>,
        unit: IntervalUnit,
        value: u32,
    ) -> Result<Reminder> {
        let reminder = Reminder::ongoing(owner_id, title, body, remind_at, unit, value)?;
        self.store.put(&reminder)?;
        Ok(reminder)
    }

    pub fn list(&self, owner_id: &str) -> Result<Vec<Reminder>> {
        let mut reminders: Vec<Reminder> = self.store.list(owner_id)?;
        reminders.sort_by_key(|r| r.remind_at);
        Ok(reminders)
    }

    pub fn set_active(&self, reminder_id: &str, active: bool) -> Result<Reminder> {
        let mut reminder: Reminder = self.store.require(reminder_id)?;
        reminder.is_active = active;
        self.store.put(&reminder)?;
        Ok(reminder)
    }

    pub fn remove(&self, reminder_id: &str) -> Result<bool> {
        Ok(self.store.delete::<Reminder>(reminder_id)?)
    }

    /// Run one poll cycle for `owner_id` at `now`.
    ///
    /// Each firing's transition is persisted before its notification is
    /// delivered. Undecodable records, malformed schedules and failed writes
    /// are reported per reminder; the rest of the cycle carries on.
    pub fn poll(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
        ctx: &mut DedupeContext,
    ) -> Result<PollReport> {
        let (reminders, corrupt) = self.store.list_checked::<Reminder>(owner_id)?;

        let mut report = PollReport {
            polled_at: Some(now),
            ..PollReport::default()
        };
        for err in corrupt {
            let reminder_id = match &err {
                StorageError::Corrupt { id, .. } => id.clone(),
                _ => String::new(),
            };
            tracing::warn!(reminder_id = %reminder_id, error = %err, "skipping undecodable reminder");
            report.failed.push(FailedReminder {
                reminder_id,
                error: err.to_string(),
            });
        }

        let outcome = self.scheduler.poll(&reminders, now, ctx);
        for (reminder_id, err) in outcome.failures {
            report.failed.push(FailedReminder {
                reminder_id,
                error: err.to_string(),
            });
        }

        for firing in outcome.firings {
            if let Err(e) = self.apply(&firing, ctx) {
                // Not persisted, so not delivered either: let the next poll retry.
                ctx.unmark(&firing.reminder_id, firing.scheduled_for);
                tracing::warn!(reminder_id = %firing.reminder_id, error = %e, "failed to persist firing");
                report.failed.push(FailedReminder {
                    reminder_id: firing.reminder_id.clone(),
                    error: e.to_string(),
                });
                continue;
            }
            if self.deliver {
                if let Err(e) = self.notifier.deliver(&firing.owner_id, &firing.notification) {
                    tracing::warn!(reminder_id = %firing.reminder_id, error = %e, "delivery failed");
                    report.delivery_failures += 1;
                }
            }
            report.fired.push(firing);
        }

        Ok(report)
    }

    fn apply(&self, firing: &Firing, ctx: &mut DedupeContext) -> Result<()> {
        match &firing.transition {
            ReminderTransition::Deleted { reminder_id } => {
                self.store.delete::<Reminder>(reminder_id)?;
                ctx.forget(reminder_id);
            }
            ReminderTransition::Rescheduled { reminder } => {
                self.store.put(reminder)?;
                // The stored remind_at has moved on; the old key can never match again.
                ctx.unmark(&firing.reminder_id, firing.scheduled_for);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    fn t(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, d, h, 0, 0).unwrap()
    }

    #[test]
    fn one_time_reminder_is_gone_after_firing() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc.create_one_time("u1", "Pay rent", "", t(1, 9)).unwrap();

        let mut ctx = DedupeContext::new();
        let report = svc.poll("u1", t(1, 9), &mut ctx).unwrap();
        assert_eq!(report.fired.len(), 1);
        assert!(svc.list("u1").unwrap().is_empty());
        assert!(store.get::<Reminder>(&r.id).unwrap().is_none());
        assert_eq!(notifier.delivered().len(), 1);
    }

    #[test]
    fn ongoing_reminder_advances_once_per_instant() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc
            .create_ongoing("u1", "Water plants", "", t(1, 9), IntervalUnit::Days, 1)
            .unwrap();

        let mut ctx = DedupeContext::new();
        svc.poll("u1", t(1, 12), &mut ctx).unwrap();
        // A second tick in the same window changes nothing.
        let again = svc.poll("u1", t(1, 12) + Duration::seconds(30), &mut ctx).unwrap();
        assert!(again.fired.is_empty());

        let stored: Reminder = store.require(&r.id).unwrap();
        assert_eq!(stored.remind_at, t(2, 9));
        assert_eq!(notifier.delivered().len(), 1);
    }

    #[test]
    fn inactive_reminders_are_skipped() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc.create_one_time("u1", "Quiet", "", t(1, 9)).unwrap();
        svc.set_active(&r.id, false).unwrap();

        let mut ctx = DedupeContext::new();
        assert!(svc.poll("u1", t(2, 9), &mut ctx).unwrap().fired.is_empty());
        svc.set_active(&r.id, true).unwrap();
        assert_eq!(svc.poll("u1", t(2, 9), &mut ctx).unwrap().fired.len(), 1);
    }

    #[test]
    fn delivery_failure_does_not_undo_the_transition() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::failing();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc
            .create_ongoing("u1", "Stand up", "", t(1, 9), IntervalUnit::Hours, 1)
            .unwrap();

        let mut ctx = DedupeContext::new();
        let report = svc.poll("u1", t(1, 9), &mut ctx).unwrap();
        assert_eq!(report.fired.len(), 1);
        assert_eq!(report.delivery_failures, 1);
        assert_eq!(store.require::<Reminder>(&r.id).unwrap().remind_at, t(1, 10));
    }

    #[test]
    fn corrupt_and_malformed_reminders_do_not_block_others() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        let good = svc.create_one_time("u1", "Good", "", t(1, 9)).unwrap();
        store.put_raw("reminder", "garbled", "u1", "{\"title\": 4}").unwrap();
        store
            .put_raw(
                "reminder",
                "zero",
                "u1",
                &serde_json::json!({
                    "id": "zero",
                    "owner_id": "u1",
                    "title": "Zero",
                    "kind": "ongoing",
                    "interval_unit": "days",
                    "interval_value": 0,
                    "remind_at": "2024-08-01T09:00:00Z"
                })
                .to_string(),
            )
            .unwrap();

        let mut ctx = DedupeContext::new();
        let report = svc.poll("u1", t(1, 9), &mut ctx).unwrap();
        assert_eq!(report.fired.len(), 1);
        assert_eq!(report.fired[0].reminder_id, good.id);

        let mut failed: Vec<&str> = report.failed.iter().map(|f| f.reminder_id.as_str()).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec!["garbled", "zero"]);

        // The malformed reminder is left exactly as it was.
        let zero: Reminder = store.require("zero").unwrap();
        assert_eq!(zero.remind_at, t(1, 9));
    }

    /// Memory store whose next `n` writes fail as if the database were locked.
    struct LockedWrites {
        inner: MemoryStore,
        failures: Cell<u32>,
    }

    impl EntityStore for LockedWrites {
        fn get_raw(&self, kind: &str, id: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get_raw(kind, id)
        }

        fn list_raw(
            &self,
            kind: &str,
            owner_id: &str,
        ) -> std::result::Result<Vec<(String, String)>, StorageError> {
            self.inner.list_raw(kind, owner_id)
        }

        fn put_raw(
            &self,
            kind: &str,
            id: &str,
            owner_id: &str,
            body: &str,
        ) -> std::result::Result<(), StorageError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(StorageError::Locked);
            }
            self.inner.put_raw(kind, id, owner_id, body)
        }

        fn delete_raw(&self, kind: &str, id: &str) -> std::result::Result<bool, StorageError> {
            self.inner.delete_raw(kind, id)
        }
    }

    #[test]
    fn failed_persist_is_retried_on_next_poll() {
        let store = LockedWrites {
            inner: MemoryStore::new(),
            failures: Cell::new(0),
        };
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        let r = svc
            .create_ongoing("u1", "Check mail", "", t(1, 9), IntervalUnit::Days, 1)
            .unwrap();

        let mut ctx = DedupeContext::new();
        store.failures.set(1);
        let first = svc.poll("u1", t(1, 9), &mut ctx).unwrap();
        assert!(first.fired.is_empty());
        assert_eq!(first.failed.len(), 1);
        assert!(notifier.delivered().is_empty());
        assert_eq!(store.require::<Reminder>(&r.id).unwrap().remind_at, t(1, 9));

        let second = svc.poll("u1", t(1, 9) + Duration::seconds(30), &mut ctx).unwrap();
        assert_eq!(second.fired.len(), 1);
        assert_eq!(notifier.delivered().len(), 1);
        assert_eq!(store.require::<Reminder>(&r.id).unwrap().remind_at, t(2, 9));
    }

    #[test]
    fn rescheduled_firings_do_not_accumulate_keys() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier);
        svc.create_ongoing("u1", "Drink water", "", t(1, 9), IntervalUnit::Hours, 1)
            .unwrap();

        let mut ctx = DedupeContext::new();
        for h in 9..15 {
            let report = svc.poll("u1", t(1, h), &mut ctx).unwrap();
            assert_eq!(report.fired.len(), 1);
            assert!(ctx.is_empty());
        }
        assert_eq!(notifier.delivered().len(), 6);
    }

    #[test]
    fn delivery_can_be_disabled() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let svc = ReminderService::new(&store, &notifier).with_delivery(false);
        svc.create_one_time("u1", "Muted", "", t(1, 9)).unwrap();
        let mut ctx = DedupeContext::new();
        assert_eq!(svc.poll("u1", t(1, 9), &mut ctx).unwrap().fired.len(), 1);
        assert!(notifier.delivered().is_empty());
    }
}
