use clap::Subcommand;
use cadence_core::{FrequencyPolicy, HabitService};
use serde_json::json;

use super::{parse_day, print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Habit name
        name: String,
        /// daily, weekly, every_N_days or specific_days:0,2,4 (0 = Sunday)
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// First scheduled day for every_N_days (default today)
        #[arg(long)]
        anchor: Option<String>,
    },
    /// List habits with streaks evaluated as of a day
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark or unmark a day as completed
    Toggle {
        /// Habit ID
        id: String,
        /// Day to toggle (default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show one habit
    Show {
        /// Habit ID
        id: String,
    },
    /// Habits still due on a day
    Due {
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a habit
    Remove {
        /// Habit ID
        id: String,
    },
}

pub fn run(action: HabitAction, owner: Option<String>) -> CliResult {
    let session = Session::open(owner)?;
    let svc = HabitService::from_config(&session.store, &session.config);
    let owner_id = session.owner_id.as_str();

    match action {
        HabitAction::Add {
            name,
            frequency,
            anchor,
        } => {
            let policy: FrequencyPolicy = frequency.parse()?;
            let anchor = parse_day(anchor.as_deref())?;
            let habit = svc.create(owner_id, &name, policy, anchor)?;
            print_json(&habit.snapshot())?;
        }
        HabitAction::List { date } => {
            let today = parse_day(date.as_deref())?;
            print_json(&svc.refresh(owner_id, today)?)?;
        }
        HabitAction::Toggle { id, date } => {
            let day = parse_day(date.as_deref())?;
            let today = parse_day(None)?;
            let report = svc.toggle(&id, day, today)?;
            print_json(&report)?;
        }
        HabitAction::Show { id } => {
            let habit = svc.get(&id)?;
            let today = parse_day(None)?;
            print_json(&json!({
                "habit": habit.snapshot(),
                "schedule": habit.policy.describe(),
                "anchor": habit.anchor,
                "completed_days": habit.completion_days(),
                "due_today": habit.is_due(today)?,
            }))?;
        }
        HabitAction::Due { date } => {
            let day = parse_day(date.as_deref())?;
            let due: Vec<_> = svc
                .due_on(owner_id, day)?
                .iter()
                .map(|h| h.snapshot())
                .collect();
            print_json(&due)?;
        }
        HabitAction::Remove { id } => {
            if !svc.remove(&id)? {
                return Err(format!("habit not found: {id}").into());
            }
            println!("removed {id}");
        }
    }
    Ok(())
}
