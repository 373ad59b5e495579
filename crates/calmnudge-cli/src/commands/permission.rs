use chrono::Utc;
use clap::{ArgGroup, Subcommand};

use calmnudge_core::{PermissionGate, PermissionStatus};

use super::{block_on, print_json, CliResult, Host};

#[derive(Subcommand)]
pub enum PermissionAction {
    /// Print the stored permission status
    Status,
    /// Simulate the authorization prompt, then schedule on grant
    #[command(group(ArgGroup::new("answer").required(true).args(["grant", "deny"])))]
    Request {
        /// The user accepts the prompt
        #[arg(long)]
        grant: bool,
        /// The user declines the prompt
        #[arg(long)]
        deny: bool,
    },
    /// Revoke permission (as if turned off in system settings)
    Revoke,
}

pub fn run(action: PermissionAction) -> CliResult {
    match action {
        PermissionAction::Status => {
            let host = Host::open(None)?;
            let status = block_on(host.gate.current_status())?;
            println!("{status}");
        }
        PermissionAction::Request { grant, deny: _ } => {
            let host = Host::open(Some(grant))?;
            let outcome = block_on(async {
                let outcome = host.engine.request_permission_then_schedule(Utc::now()).await;
                host.save_permission().await.map(|_| outcome)
            })??;
            print_json(&outcome)?;
        }
        PermissionAction::Revoke => {
            let host = Host::open(None)?;
            host.store.set_permission_status(PermissionStatus::Denied)?;
            host.gate.set_status(PermissionStatus::Denied);
            // Revocation is picked up by the next evaluation, which cancels.
            let decision = block_on(host.engine.evaluate_and_schedule_if_needed(Utc::now()))??;
            print_json(&decision)?;
        }
    }
    Ok(())
}
