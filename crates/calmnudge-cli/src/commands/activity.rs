use chrono::{DateTime, Utc};
use clap::Subcommand;

use calmnudge_core::{ActivityKind, ActivitySnapshot};

use super::{block_on, parse_instant, print_json, CliResult, Host};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Record a completed activity, then re-evaluate reminders
    Record {
        /// test, reflection or breathing
        kind: ActivityKind,
        /// Completion time (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// Last completion per activity
    Last,
    /// Recent activity history
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

pub fn run(action: ActivityAction) -> CliResult {
    match action {
        ActivityAction::Record { kind, at } => {
            let host = Host::open(None)?;
            let at = at.unwrap_or_else(Utc::now);
            let id = host.store.record_activity(kind, at)?;
            println!("recorded {kind} #{id} at {}", at.to_rfc3339());
            // Completing an activity is an evaluation trigger.
            let decision = block_on(host.engine.evaluate_and_schedule_if_needed(Utc::now()))??;
            tracing::debug!(?decision, "evaluation after activity");
        }
        ActivityAction::Last => {
            let host = Host::open(None)?;
            let snapshot = block_on(ActivitySnapshot::read(host.store.as_ref()))??;
            print_json(&snapshot)?;
        }
        ActivityAction::List { limit } => {
            let host = Host::open(None)?;
            print_json(&host.store.recent_activities(limit)?)?;
        }
    }
    Ok(())
}
