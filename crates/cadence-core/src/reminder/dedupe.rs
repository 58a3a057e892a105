//! Per-process fire-once tracking.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// Transient record of which `(reminder, remind_at)` pairs already fired.
///
/// Created once at host startup and passed into every poll. Never persisted:
/// a restart starts from an empty set, which is safe because an ongoing
/// reminder only advances on a firing transition, not on poll ticks.
#[derive(Debug, Default)]
pub struct DedupeContext {
    fired: HashSet<(String, DateTime<Utc>)>,
    last_poll: Option<DateTime<Utc>>,
    polls: u64,
}

impl DedupeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, reminder_id: &str, remind_at: DateTime<Utc>) -> bool {
        self.fired.contains(&(reminder_id.to_string(), remind_at))
    }

    /// Returns `false` if the pair was already recorded.
    pub fn mark_fired(&mut self, reminder_id: &str, remind_at: DateTime<Utc>) -> bool {
        self.fired.insert((reminder_id.to_string(), remind_at))
    }

    /// Release one key so the pair can fire again. Returns `true` if it
    /// was recorded.
    pub fn unmark(&mut self, reminder_id: &str, remind_at: DateTime<Utc>) -> bool {
        self.fired.remove(&(reminder_id.to_string(), remind_at))
    }

    /// Drop every key belonging to a reminder that no longer exists.
    pub fn forget(&mut self, reminder_id: &str) {
        self.fired.retain(|(id, _)| id != reminder_id);
    }

    pub fn record_poll(&mut self, now: DateTime<Utc>) {
        self.last_poll = Some(now);
        self.polls += 1;
    }

    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.last_poll
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    pub fn clear(&mut self) {
        self.fired.clear();
        self.last_poll = None;
        self.polls = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn marks_each_pair_once() {
        let mut ctx = DedupeContext::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert!(!ctx.has_fired("r1", t));
        assert!(ctx.mark_fired("r1", t));
        assert!(!ctx.mark_fired("r1", t));
        assert!(ctx.has_fired("r1", t));
        // Same reminder, different instant is a different key.
        assert!(!ctx.has_fired("r1", t + chrono::Duration::days(1)));
        assert!(!ctx.has_fired("r2", t));
    }

    #[test]
    fn forget_and_clear() {
        let mut ctx = DedupeContext::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        ctx.mark_fired("r1", t);
        ctx.mark_fired("r2", t);
        ctx.record_poll(t);
        ctx.forget("r1");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.polls(), 1);
        ctx.clear();
        assert!(ctx.is_empty());
        assert!(ctx.last_poll().is_none());
    }

    #[test]
    fn unmark_releases_a_single_key() {
        let mut ctx = DedupeContext::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let later = t + chrono::Duration::hours(1);
        ctx.mark_fired("r1", t);
        ctx.mark_fired("r1", later);

        assert!(ctx.unmark("r1", t));
        assert!(!ctx.unmark("r1", t));
        assert!(!ctx.has_fired("r1", t));
        assert!(ctx.has_fired("r1", later));
    }
}
