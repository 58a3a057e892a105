//! Firing decisions for reminders.
//!
//! The scheduler is stateless; the only mutable state is the caller-owned
//! [`DedupeContext`]. It never writes anything back itself: each firing
//! carries the [`ReminderTransition`] the host must persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dedupe::DedupeContext;
use super::{Notification, Reminder, ReminderKind};
use crate::error::EngineError;

/// What the host must do with a reminder after it fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReminderTransition {
    /// One-time reminder: remove the entity.
    Deleted { reminder_id: String },
    /// Ongoing reminder: store the advanced copy.
    Rescheduled { reminder: Reminder },
}

/// A single reminder firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    pub reminder_id: String,
    pub owner_id: String,
    /// The scheduled instant that fired (the dedupe key).
    pub scheduled_for: DateTime<Utc>,
    pub fired_at: DateTime<Utc>,
    pub notification: Notification,
    pub transition: ReminderTransition,
}

/// Result of one poll over many reminders.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub firings: Vec<Firing>,
    /// Reminders whose schedule is malformed; they were left unchanged.
    pub failures: Vec<(String, EngineError)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderScheduler;

impl ReminderScheduler {
    pub fn new() -> Self {
        Self
    }

    /// The state a reminder moves to when it fires.
    ///
    /// Ongoing reminders advance from their previous `remind_at`, not from
    /// the time the firing was observed.
    ///
    /// # Errors
    /// `InvalidScheduleSpec` for a malformed ongoing interval.
    pub fn transition(&self, reminder: &Reminder) -> Result<ReminderTransition, EngineError> {
        match reminder.kind {
            ReminderKind::OneTime => Ok(ReminderTransition::Deleted {
                reminder_id: reminder.id.clone(),
            }),
            ReminderKind::Ongoing {
                interval_unit,
                interval_value,
            } => {
                let next_at = interval_unit.advance(reminder.remind_at, interval_value)?;
                Ok(ReminderTransition::Rescheduled {
                    reminder: Reminder {
                        remind_at: next_at,
                        ..reminder.clone()
                    },
                })
            }
        }
    }

    /// Decide whether `reminder` fires at `now`.
    ///
    /// Returns `Ok(None)` when it is inactive, not yet due, or already fired
    /// for its current `remind_at` in this process.
    ///
    /// # Errors
    /// `InvalidScheduleSpec` if the reminder is due but its interval is
    /// malformed. The dedupe context is not updated in that case.
    pub fn check(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
        ctx: &mut DedupeContext,
    ) -> Result<Option<Firing>, EngineError> {
        if !reminder.is_due(now) || ctx.has_fired(&reminder.id, reminder.remind_at) {
            return Ok(None);
        }

        let transition = self.transition(reminder)?;
        ctx.mark_fired(&reminder.id, reminder.remind_at);

        tracing::info!(
            reminder_id = %reminder.id,
            scheduled_for = %reminder.remind_at,
            late_by_secs = (now - reminder.remind_at).num_seconds(),
            "reminder fired"
        );

        Ok(Some(Firing {
            reminder_id: reminder.id.clone(),
            owner_id: reminder.owner_id.clone(),
            scheduled_for: reminder.remind_at,
            fired_at: now,
            notification: reminder.notification(),
            transition,
        }))
    }

    /// Check every reminder, isolating failures per reminder.
    pub fn poll<'a, I>(&self, reminders: I, now: DateTime<Utc>, ctx: &mut DedupeContext) -> PollOutcome
    where
        I: IntoIterator<Item = &'a Reminder>,
    {
        let mut outcome = PollOutcome::default();
        for reminder in reminders {
            match self.check(reminder, now, ctx) {
                Ok(Some(firing)) => outcome.firings.push(firing),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(reminder_id = %reminder.id, error = %e, "reminder left scheduled");
                    outcome.failures.push((reminder.id.clone(), e));
                }
            }
        }
        ctx.record_poll(now);
        outcome
    }
}
