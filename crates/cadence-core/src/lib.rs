//! # Cadence Core Library
//!
//! Temporal scheduling and progression engine for a personal productivity
//! app. Given a declarative frequency policy and a history of timestamped
//! events, it decides whether a habit is due, how its streak runs and
//! resets, how completions turn into XP and levels, and when a recurring
//! reminder fires next.
//!
//! ## Architecture
//!
//! - **Engine** (`frequency`, `habit`, `progression`, `reminder`): pure,
//!   synchronous functions of (policy, history, now). No I/O.
//! - **Host** (`storage`, `delivery`, `host`): persistence and delivery
//!   collaborators plus the services that run the engine between a read and
//!   a write. The CLI binary is a thin layer over these.
//!
//! ## Key Components
//!
//! - [`FrequencyPolicy`]: closed set of recurrence rules
//! - [`compute_streak`]: current/best streak and bonus XP fold
//! - [`HabitLedger`]: single-day toggle with atomic recomputation
//! - [`ProgressionRules`]: XP total to level mapping
//! - [`ReminderScheduler`]: firing decisions with per-process dedupe

pub mod calendar;
pub mod delivery;
pub mod error;
pub mod frequency;
pub mod habit;
pub mod host;
pub mod profile;
pub mod progression;
pub mod reminder;
pub mod storage;

pub use delivery::{DeliveryError, LogNotifier, Notifier, RecordingNotifier};
pub use error::{ConfigError, CoreError, EngineError, StorageError};
pub use frequency::FrequencyPolicy;
pub use habit::{compute_streak, CompletionRecord, Habit, HabitLedger, HabitSnapshot, StreakSummary, XpRules};
pub use host::{HabitService, PollReport, ReminderService, ToggleReport};
pub use profile::Profile;
pub use progression::{LevelInfo, ProgressionRules};
pub use reminder::{
    DedupeContext, Firing, IntervalUnit, Notification, Reminder, ReminderKind, ReminderScheduler,
    ReminderTransition,
};
pub use storage::{Config, EntityStore, MemoryStore, SqliteStore};
