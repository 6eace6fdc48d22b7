//! Draft command implementation.

use crate::cli::output::truncate;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::KobleError;
use crate::orchestrator::{DraftRequest, Orchestrator};
use anyhow::Result;

/// Run the draft command.
pub async fn run_draft(
    to: &str,
    subject: &str,
    body: &str,
    task: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'koble doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if task.is_none() && !to.contains('@') {
        let e = KobleError::InvalidInput(format!(
            "'{}' does not look like an email address",
            to
        ));
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let task = task.unwrap_or_else(|| {
        DraftRequest {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
        .to_task()
    });

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Agent working...");

    let result = orchestrator
        .run_task(&task, |url| {
            spinner.finish_and_clear();
            Output::authorize_url(url);
            Output::info("Waiting for you to complete authorization...");
        })
        .await;

    match result {
        Ok(outcome) => {
            spinner.finish_and_clear();

            println!("\n{}\n", outcome.final_output);

            if !outcome.tool_calls.is_empty() {
                Output::header(&format!("Tool calls ({})", outcome.tool_calls.len()));
                for call in &outcome.tool_calls {
                    Output::info(&format!("  {} {}", call.name, truncate(&call.arguments, 60)));
                }
                println!();
            }

            Output::info(&format!("Completed in {} iteration(s)", outcome.iterations));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Draft failed: {}", e));
            Err(e.into())
        }
    }
}
