//! Connect command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::connect::{self, Lookup};
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the connect command.
pub async fn run_connect(check_only: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Connect, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'koble doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let user_id = settings.user_id()?;
    let selection = settings.connection.selection;
    let orchestrator = Orchestrator::new(settings)?;

    if check_only {
        let spinner = Output::spinner("Checking for an existing connection...");
        let outcome = connect::lookup(orchestrator.platform().as_ref(), &user_id, selection).await;
        spinner.finish_and_clear();

        match outcome {
            Lookup::Found(account) => {
                Output::success("Connection is active.");
                Output::kv("Account", &account.id);
                if let Some(toolkit) = &account.toolkit {
                    Output::kv("Service", toolkit);
                }
            }
            Lookup::NotFound => {
                Output::warning("No active connection found.");
                Output::info("Run 'koble connect' (without --check) to authorize.");
            }
            Lookup::LookupFailed(cause) => {
                Output::error(&format!("Could not determine connection state: {}", cause));
                anyhow::bail!("connection lookup failed");
            }
        }
        return Ok(());
    }

    let spinner = Output::spinner("Resolving connection...");
    let result = orchestrator
        .resolve_account(|url| {
            spinner.finish_and_clear();
            Output::authorize_url(url);
            Output::info("Waiting for you to complete authorization...");
        })
        .await;

    match result {
        Ok(account) => {
            spinner.finish_and_clear();
            Output::success("Connection established.");
            Output::kv("Account", &account.id);
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Connection failed: {}", e));
            Err(e.into())
        }
    }
}
