use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use cadence_core::{
    DedupeContext, DeliveryError, EntityStore, IntervalUnit, Notification, Notifier,
    ReminderService,
};
use serde_json::json;

use super::{parse_instant, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Create a reminder
    Add {
        /// Notification title
        title: String,
        /// First firing time: RFC 3339, "YYYY-MM-DD HH:MM" (local) or "now"
        #[arg(long)]
        at: String,
        /// Notification body
        #[arg(long, default_value = "")]
        body: String,
        /// Repeat every N units; omit for a one-time reminder
        #[arg(long)]
        every: Option<u32>,
        /// hours, days, weeks or months
        #[arg(long, default_value = "days")]
        unit: String,
    },
    /// List reminders with their next firings
    List,
    /// Fire everything that is due right now
    Poll,
    /// Poll on an interval until interrupted
    Watch {
        /// Seconds between polls (default reminders.poll_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Stop a reminder from firing
    Pause {
        /// Reminder ID
        id: String,
    },
    /// Let a paused reminder fire again
    Resume {
        /// Reminder ID
        id: String,
    },
    /// Delete a reminder
    Remove {
        /// Reminder ID
        id: String,
    },
}

/// Prints notifications to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn deliver(&self, _owner_id: &str, notification: &Notification) -> Result<(), DeliveryError> {
        if notification.body.is_empty() {
            eprintln!("[reminder] {}", notification.title);
        } else {
            eprintln!("[reminder] {}: {}", notification.title, notification.body);
        }
        Ok(())
    }
}

pub fn run(action: ReminderAction, owner: Option<String>) -> CliResult {
    let session = Session::open(owner)?;
    let svc = ReminderService::new(&session.store, ConsoleNotifier)
        .with_delivery(session.config.notifications.enabled);
    let owner_id = session.owner_id.as_str();

    match action {
        ReminderAction::Add {
            title,
            at,
            body,
            every,
            unit,
        } => {
            let remind_at = parse_instant(&at)?;
            let reminder = match every {
                Some(value) => {
                    let unit: IntervalUnit = unit.parse()?;
                    svc.create_ongoing(owner_id, &title, &body, remind_at, unit, value)?
                }
                None => svc.create_one_time(owner_id, &title, &body, remind_at)?,
            };
            print_json(&reminder)?;
        }
        ReminderAction::List => {
            let preview = session.config.reminders.preview_count;
            let rows: Vec<_> = svc
                .list(owner_id)?
                .into_iter()
                .map(|r| {
                    let upcoming = r.upcoming(preview).unwrap_or_default();
                    json!({ "reminder": r, "upcoming": upcoming })
                })
                .collect();
            print_json(&rows)?;
        }
        ReminderAction::Poll => {
            let mut ctx = DedupeContext::new();
            let report = svc.poll(owner_id, Utc::now(), &mut ctx)?;
            print_json(&report)?;
        }
        ReminderAction::Watch { interval } => {
            let secs = interval.unwrap_or(session.config.reminders.poll_interval_secs);
            if secs == 0 {
                return Err("interval must be at least 1 second".into());
            }
            watch(&svc, owner_id, Duration::from_secs(secs))?;
        }
        ReminderAction::Pause { id } => {
            print_json(&svc.set_active(&id, false)?)?;
        }
        ReminderAction::Resume { id } => {
            print_json(&svc.set_active(&id, true)?)?;
        }
        ReminderAction::Remove { id } => {
            if !svc.remove(&id)? {
                return Err(format!("reminder not found: {id}").into());
            }
            println!("removed {id}");
        }
    }
    Ok(())
}

/// Poll every `period` until Ctrl-C, keeping one dedupe context for the
/// whole run.
fn watch<S: EntityStore>(
    svc: &ReminderService<'_, S, ConsoleNotifier>,
    owner_id: &str,
    period: Duration,
) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut ctx = DedupeContext::new();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        tracing::info!(owner_id, period_secs = period.as_secs(), "watching reminders");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match svc.poll(owner_id, Utc::now(), &mut ctx) {
                        Ok(report) => {
                            for firing in &report.fired {
                                println!("{}", serde_json::to_string(firing)?);
                            }
                            for failed in &report.failed {
                                tracing::warn!(reminder_id = %failed.reminder_id, error = %failed.error, "reminder skipped");
                            }
                        }
                        // Transient store errors are retried on the next tick.
                        Err(e) => tracing::error!(error = %e, "poll failed"),
                    }
                }
                _ = &mut shutdown => break,
            }
        }
        tracing::info!(polls = ctx.polls(), "stopped watching");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
