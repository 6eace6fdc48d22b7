//! Flow orchestrator for Koble.
//!
//! Coordinates the two-phase flow: resolve an authorized account, fetch
//! remote tools, and run the agent against them.

use crate::agent::{Agent, AgentOutcome, Toolbox};
use crate::config::Settings;
use crate::connect::{self, ResolveOptions};
use crate::error::{KobleError, Result};
use crate::platform::{ConnectedAccount, HttpPlatform, Platform};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// One draft-creation request.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl DraftRequest {
    /// Build the natural-language task for the agent.
    pub fn to_task(&self) -> String {
        format!(
            "Create a draft email to {} with the subject '{}' and the body '{}'.",
            self.to, self.subject, self.body
        )
    }
}

/// The main orchestrator for the Koble flow.
pub struct Orchestrator {
    settings: Settings,
    platform: Arc<dyn Platform>,
}

impl Orchestrator {
    /// Create a new orchestrator backed by the HTTP platform client.
    pub fn new(settings: Settings) -> Result<Self> {
        let api_key = std::env::var("COMPOSIO_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                KobleError::Config(
                    "COMPOSIO_API_KEY not set. Set it with: export COMPOSIO_API_KEY='...'"
                        .to_string(),
                )
            })?;

        let platform = Arc::new(HttpPlatform::new(
            &settings.platform.base_url,
            &api_key,
            Duration::from_secs(settings.platform.timeout_secs),
        )?);

        Ok(Self { settings, platform })
    }

    /// Create an orchestrator with a custom platform implementation.
    pub fn with_platform(settings: Settings, platform: Arc<dyn Platform>) -> Self {
        Self { settings, platform }
    }

    /// The platform handle.
    pub fn platform(&self) -> Arc<dyn Platform> {
        self.platform.clone()
    }

    /// Resolve an authorized account for the configured user.
    ///
    /// `on_redirect` is invoked with the authorization URL when a new
    /// handshake is needed.
    #[instrument(skip(self, on_redirect))]
    pub async fn resolve_account(
        &self,
        on_redirect: impl FnOnce(&str),
    ) -> Result<ConnectedAccount> {
        let user_id = self.settings.user_id()?;
        let opts = ResolveOptions {
            auth_config_id: self.settings.auth_config_id().unwrap_or_default(),
            selection: self.settings.connection.selection,
            wait_timeout: Duration::from_secs(self.settings.connection.wait_timeout_secs),
            poll_interval: Duration::from_secs(self.settings.connection.poll_interval_secs.max(1)),
        };

        connect::resolve(self.platform.as_ref(), &user_id, &opts, on_redirect).await
    }

    /// Fetch a toolbox for the given slugs, scoped to the configured user.
    ///
    /// Descriptors are fetched fresh on every call; nothing is cached in
    /// this process.
    #[instrument(skip(self))]
    pub async fn fetch_toolbox(&self, slugs: &[String]) -> Result<Toolbox> {
        let user_id = self.settings.user_id()?;
        let tools = self.platform.fetch_tools(&user_id, slugs).await?;

        info!("Fetched {} tool(s) for {}", tools.len(), user_id);
        Ok(Toolbox::new(self.platform.clone(), &user_id, tools))
    }

    /// Build the agent from settings and the given toolbox.
    pub fn build_agent(&self, toolbox: Toolbox) -> Agent {
        Agent::new(
            &self.settings.agent.name,
            &self.settings.agent.instructions,
            &self.settings.agent.model,
            toolbox,
        )
        .with_max_iterations(self.settings.agent.max_iterations)
    }

    /// Run the full flow for one task: resolve, fetch, execute.
    #[instrument(skip(self, on_redirect))]
    pub async fn run_task(
        &self,
        task: &str,
        on_redirect: impl FnOnce(&str),
    ) -> Result<AgentOutcome> {
        let account = self.resolve_account(on_redirect).await?;
        info!("Running agent against account {}", account.id);

        let toolbox = self.fetch_toolbox(&self.settings.agent.tools).await?;
        let agent = self.build_agent(toolbox);

        agent.run(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AccountStatus, MemoryPlatform, ToolDescriptor};

    fn settings_for(user: &str) -> Settings {
        let mut settings = Settings::default();
        settings.user.id = Some(user.to_string());
        settings.connection.auth_config_id = Some("ac_test".to_string());
        settings
    }

    fn active_account(id: &str) -> crate::platform::ConnectedAccount {
        crate::platform::ConnectedAccount {
            id: id.to_string(),
            status: AccountStatus::Active,
            toolkit: Some("gmail".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn test_draft_request_task_text() {
        let request = DraftRequest {
            to: "yizucodes@gmail.com".to_string(),
            subject: "Hello".to_string(),
            body: "Congratulations on your first draft!".to_string(),
        };

        assert_eq!(
            request.to_task(),
            "Create a draft email to yizucodes@gmail.com with the subject 'Hello' \
             and the body 'Congratulations on your first draft!'."
        );
    }

    #[tokio::test]
    async fn test_fetch_toolbox_is_user_and_slug_scoped() {
        let platform = Arc::new(MemoryPlatform::new().with_tool(ToolDescriptor {
            slug: "GMAIL_CREATE_EMAIL_DRAFT".to_string(),
            description: None,
            input_parameters: serde_json::json!({}),
        }));
        let orchestrator =
            Orchestrator::with_platform(settings_for("user-123"), platform.clone());

        let slugs = vec!["GMAIL_CREATE_EMAIL_DRAFT".to_string()];
        let toolbox = orchestrator.fetch_toolbox(&slugs).await.unwrap();

        assert_eq!(toolbox.len(), 1);
        assert_eq!(platform.last_fetch(), Some(("user-123".to_string(), slugs)));
    }

    #[tokio::test]
    async fn test_fetch_toolbox_is_never_cached() {
        let platform = Arc::new(MemoryPlatform::new());
        let orchestrator =
            Orchestrator::with_platform(settings_for("user-123"), platform.clone());

        let slugs = vec!["GMAIL_CREATE_EMAIL_DRAFT".to_string()];
        orchestrator.fetch_toolbox(&slugs).await.unwrap();
        orchestrator.fetch_toolbox(&slugs).await.unwrap();

        assert_eq!(platform.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_account_uses_existing_connection() {
        let platform = Arc::new(
            MemoryPlatform::new().with_account("user-123", active_account("acct-1")),
        );
        let orchestrator = Orchestrator::with_platform(settings_for("user-123"), platform.clone());

        let account = orchestrator.resolve_account(|_| {}).await.unwrap();
        assert_eq!(account.id, "acct-1");
        assert_eq!(platform.link_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_account_walks_handshake_when_absent() {
        let platform = Arc::new(
            MemoryPlatform::new()
                .with_redirect_url("https://platform.example/authorize/r1")
                .activating_after(1),
        );
        let mut settings = settings_for("user-123");
        settings.connection.poll_interval_secs = 1;
        let orchestrator = Orchestrator::with_platform(settings, platform.clone());

        let mut redirect = None;
        let account = orchestrator
            .resolve_account(|url| redirect = Some(url.to_string()))
            .await
            .unwrap();

        assert_eq!(account.id, "acct-1");
        assert_eq!(platform.link_count(), 1);
        assert_eq!(
            redirect.as_deref(),
            Some("https://platform.example/authorize/r1")
        );
    }
}
