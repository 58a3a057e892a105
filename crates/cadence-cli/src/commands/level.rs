use clap::Subcommand;
use cadence_core::HabitService;
use serde_json::json;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum LevelAction {
    /// Current level, XP total and progress
    Show,
    /// XP needed for each level
    Table {
        /// Last level to print
        #[arg(long, default_value_t = 25)]
        up_to: u32,
    },
}

pub fn run(action: LevelAction, owner: Option<String>) -> CliResult {
    let session = Session::open(owner)?;

    match action {
        LevelAction::Show => {
            let svc = HabitService::from_config(&session.store, &session.config);
            let profile = svc.profile(&session.owner_id)?;
            let level = profile.level(&session.config.progression)?;
            print_json(&json!({
                "owner_id": profile.owner_id,
                "total_xp": profile.total_xp,
                "level": level,
            }))?;
        }
        LevelAction::Table { up_to } => {
            let rules = session.config.progression;
            let rows: Vec<_> = (1..=up_to.max(1))
                .map(|level| {
                    json!({
                        "level": level,
                        "required_xp": rules.required_xp(level),
                        "total_to_reach": rules.xp_to_reach(level),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}
