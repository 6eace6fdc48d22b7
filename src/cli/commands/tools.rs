//! Tools command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the tools command.
pub async fn run_tools(slugs: Option<Vec<String>>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Tools, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'koble doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let slugs = slugs.unwrap_or_else(|| settings.agent.tools.clone());
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching tools...");
    let result = orchestrator.fetch_toolbox(&slugs).await;
    spinner.finish_and_clear();

    match result {
        Ok(toolbox) => {
            if toolbox.is_empty() {
                Output::warning(&format!(
                    "No tools available for: {}",
                    slugs.join(", ")
                ));
                Output::info("Check that the user's connected account has these tools enabled.");
                return Ok(());
            }

            Output::header(&format!("Available tools ({})", toolbox.len()));
            for tool in toolbox.descriptors() {
                Output::tool_item(&tool.slug, tool.description.as_deref());
            }
            println!();
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Tool fetch failed: {}", e));
            Err(e.into())
        }
    }
}
