use chrono::{DateTime, Utc};
use clap::Subcommand;

use calmnudge_core::{DeliveryBackend, EvaluateOptions, ReminderId, SchedulingDecision, SkipReason};

use super::{block_on, parse_instant, print_json, CliResult, Host};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Evaluate and schedule a reminder if one is due
    Evaluate {
        /// Re-place the pending reminder even during cooldown
        #[arg(long)]
        force: bool,
        /// Evaluation instant (RFC 3339), defaults to now. The outbox
        /// treats it as the current time.
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show reminder phase and state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Turn reminders off and cancel the pending one
    Disable,
    /// Turn reminders back on and evaluate
    Enable,
    /// Report that a reminder was shown
    Delivered {
        /// Reminder identifier
        id: String,
    },
    /// List notifications waiting in the outbox
    Pending,
}

pub fn run(action: ReminderAction) -> CliResult {
    match action {
        ReminderAction::Evaluate { force, at, json } => {
            let host = Host::open_at(None, at)?;
            let now = at.unwrap_or_else(Utc::now);
            let decision = block_on(host.engine.evaluate_with(now, EvaluateOptions { force }))??;
            if json {
                print_json(&decision)?;
            } else {
                println!("{}", describe(&decision));
            }
        }
        ReminderAction::Status { json } => {
            let host = Host::open(None)?;
            let status = block_on(host.engine.status())?;
            if json {
                print_json(&status)?;
            } else {
                println!("phase: {}", status.phase);
                println!("permission: {}", status.permission);
                match (&status.state.pending_identifier, status.state.pending_fire_at) {
                    (Some(id), Some(fire_at)) => println!("pending: {id} at {}", fire_at.to_rfc3339()),
                    (Some(id), None) => println!("pending: {id}"),
                    _ => println!("pending: none"),
                }
                if let Some(at) = status.state.last_fired_or_evaluated_at {
                    println!("last decision: {}", at.to_rfc3339());
                }
            }
        }
        ReminderAction::Disable => {
            let mut host = Host::open(None)?;
            host.config.set("reminders.enabled", "false")?;
            match block_on(host.engine.disable_reminders())? {
                Some(id) => println!("reminders disabled; cancelled {id}"),
                None => println!("reminders disabled"),
            }
        }
        ReminderAction::Enable => {
            let mut config = calmnudge_core::Config::load()?;
            config.set("reminders.enabled", "true")?;
            // Reopen so the engine sees the new setting.
            let host = Host::open(None)?;
            let decision = block_on(host.engine.evaluate_and_schedule_if_needed(Utc::now()))??;
            println!("reminders enabled; {}", describe(&decision));
        }
        ReminderAction::Delivered { id } => {
            let host = Host::open(None)?;
            let id = ReminderId::from(id);
            if block_on(host.engine.on_reminder_delivered(&id))? {
                // Shown notifications leave the outbox.
                host.store.cancel(&id);
                println!("delivered: {id}");
            } else {
                println!("not pending: {id}");
            }
        }
        ReminderAction::Pending => {
            let host = Host::open(None)?;
            print_json(&host.store.pending_notifications()?)?;
        }
    }
    Ok(())
}

fn describe(decision: &SchedulingDecision) -> String {
    match decision {
        SchedulingDecision::Scheduled { fire_at, id, kind } => {
            format!("scheduled {kind} reminder {id} at {}", fire_at.to_rfc3339())
        }
        SchedulingDecision::Skipped { reason } => match reason {
            SkipReason::NoPermission => "skipped: notifications not permitted".to_string(),
            SkipReason::Disabled => "skipped: reminders disabled".to_string(),
            SkipReason::CooldownActive { eligible_at } => {
                format!("skipped: cooldown active until {}", eligible_at.to_rfc3339())
            }
        },
    }
}
