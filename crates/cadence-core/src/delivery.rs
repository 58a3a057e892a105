//! Delivery collaborator for reminder notifications.
//!
//! Delivery is best-effort. Failures are logged by the host and never fed
//! back into the scheduler.

use std::cell::RefCell;

use thiserror::Error;

use crate::reminder::Notification;

#[derive(Error, Debug)]
#[error("Delivery to '{owner_id}' failed: {message}")]
pub struct DeliveryError {
    pub owner_id: String,
    pub message: String,
}

/// Sends a notification to an owner.
pub trait Notifier {
    fn deliver(&self, owner_id: &str, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, owner_id: &str, notification: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            owner_id,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

/// Keeps every delivered notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: RefCell<Vec<(String, Notification)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            delivered: RefCell::default(),
            fail: true,
        }
    }

    pub fn delivered(&self) -> Vec<(String, Notification)> {
        self.delivered.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, owner_id: &str, notification: &Notification) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError {
                owner_id: owner_id.to_string(),
                message: "transport unavailable".into(),
            });
        }
        self.delivered
            .borrow_mut()
            .push((owner_id.to_string(), notification.clone()));
        Ok(())
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn deliver(&self, owner_id: &str, notification: &Notification) -> Result<(), DeliveryError> {
        (**self).deliver(owner_id, notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let n = RecordingNotifier::new();
        let first = Notification {
            title: "a".into(),
            body: String::new(),
        };
        let second = Notification {
            title: "b".into(),
            body: "x".into(),
        };
        n.deliver("u", &first).unwrap();
        n.deliver("u", &second).unwrap();
        let titles: Vec<String> = n.delivered().into_iter().map(|(_, n)| n.title).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn failing_notifier_reports_owner() {
        let n = RecordingNotifier::failing();
        let err = n
            .deliver(
                "u9",
                &Notification {
                    title: "t".into(),
                    body: String::new(),
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("u9"));
        assert!(n.delivered().is_empty());
    }

    #[test]
    fn log_notifier_always_succeeds() {
        let note = Notification {
            title: "Stand up".into(),
            body: "stretch for a minute".into(),
        };
        assert!(LogNotifier.deliver("u1", &note).is_ok());
        assert!((&LogNotifier).deliver("u1", &note).is_ok());
    }
}
