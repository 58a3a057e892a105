//! Host services: the glue between the pure engine and its collaborators.
//!
//! Each service reads entities from an [`EntityStore`](crate::storage::EntityStore),
//! runs the engine, and writes the derived result back. Every call touches a
//! single habit or reminder; failures on one entity never block another.

mod habits;
mod reminders;

pub use habits::{HabitService, ToggleReport};
pub use reminders::{FailedReminder, PollReport, ReminderService};
