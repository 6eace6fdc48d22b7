//! In-memory platform implementation.
//!
//! Scripted backend useful for testing: accounts, tools, and execution
//! results are seeded up front, and every call is counted so tests can
//! assert interaction contracts.

use super::{AccountStatus, AuthLink, ConnectedAccount, Platform, ToolDescriptor, ToolExecution};
use crate::error::{KobleError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory platform.
pub struct MemoryPlatform {
    state: RwLock<State>,
}

struct State {
    accounts: HashMap<String, Vec<ConnectedAccount>>,
    tools: Vec<ToolDescriptor>,
    executions: HashMap<String, ToolExecution>,
    redirect_url: String,
    lookup_error: Option<String>,
    // Polls remaining before a linked account leaves Initiated.
    handshake_polls: u32,
    handshake_result: AccountStatus,
    pending: HashMap<String, u32>,
    next_account: u32,
    lookups: u32,
    links: u32,
    fetches: u32,
    last_fetch: Option<(String, Vec<String>)>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            tools: Vec::new(),
            executions: HashMap::new(),
            redirect_url: "https://platform.example/authorize".to_string(),
            lookup_error: None,
            handshake_polls: 0,
            handshake_result: AccountStatus::Active,
            pending: HashMap::new(),
            next_account: 0,
            lookups: 0,
            links: 0,
            fetches: 0,
            last_fetch: None,
        }
    }
}

impl MemoryPlatform {
    /// Create an empty in-memory platform.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Seed a connected account for a user.
    pub fn with_account(self, user_id: &str, account: ConnectedAccount) -> Self {
        self.state
            .write()
            .unwrap()
            .accounts
            .entry(user_id.to_string())
            .or_default()
            .push(account);
        self
    }

    /// Seed a tool descriptor returned by fetches.
    pub fn with_tool(self, tool: ToolDescriptor) -> Self {
        self.state.write().unwrap().tools.push(tool);
        self
    }

    /// Seed the execution result for a tool slug.
    pub fn with_execution(self, slug: &str, execution: ToolExecution) -> Self {
        self.state
            .write()
            .unwrap()
            .executions
            .insert(slug.to_string(), execution);
        self
    }

    /// Make every account lookup fail with the given message.
    pub fn failing_lookups(self, message: &str) -> Self {
        self.state.write().unwrap().lookup_error = Some(message.to_string());
        self
    }

    /// Set the redirect URL returned by link initiation.
    pub fn with_redirect_url(self, url: &str) -> Self {
        self.state.write().unwrap().redirect_url = url.to_string();
        self
    }

    /// Number of status polls before a linked account activates.
    /// Use `u32::MAX` for an account that never activates.
    pub fn activating_after(self, polls: u32) -> Self {
        self.state.write().unwrap().handshake_polls = polls;
        self
    }

    /// Make handshakes end in the given terminal status instead of Active.
    pub fn with_handshake_result(self, status: AccountStatus) -> Self {
        self.state.write().unwrap().handshake_result = status;
        self
    }

    /// Number of lookup calls made so far.
    pub fn lookup_count(&self) -> u32 {
        self.state.read().unwrap().lookups
    }

    /// Number of handshakes initiated so far.
    pub fn link_count(&self) -> u32 {
        self.state.read().unwrap().links
    }

    /// Number of tool fetches made so far.
    pub fn fetch_count(&self) -> u32 {
        self.state.read().unwrap().fetches
    }

    /// User id and slugs of the most recent tool fetch.
    pub fn last_fetch(&self) -> Option<(String, Vec<String>)> {
        self.state.read().unwrap().last_fetch.clone()
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn list_connected_accounts(&self, user_id: &str) -> Result<Vec<ConnectedAccount>> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;

        if let Some(message) = &state.lookup_error {
            return Err(KobleError::Platform(message.clone()));
        }

        Ok(state.accounts.get(user_id).cloned().unwrap_or_default())
    }

    async fn initiate_link(&self, user_id: &str, _auth_config_id: &str) -> Result<AuthLink> {
        let mut state = self.state.write().unwrap();
        state.links += 1;
        state.next_account += 1;

        let id = format!("acct-{}", state.next_account);
        let polls = state.handshake_polls;
        state.pending.insert(id.clone(), polls);
        state.accounts.entry(user_id.to_string()).or_default().push(
            ConnectedAccount {
                id: id.clone(),
                status: AccountStatus::Initiated,
                toolkit: None,
                created_at: None,
            },
        );

        Ok(AuthLink {
            id,
            redirect_url: state.redirect_url.clone(),
        })
    }

    async fn get_connected_account(&self, account_id: &str) -> Result<ConnectedAccount> {
        let mut state = self.state.write().unwrap();
        let result_status = state.handshake_result.clone();

        if let Some(polls) = state.pending.get_mut(account_id) {
            let status = if *polls == 0 {
                result_status
            } else if *polls == u32::MAX {
                // Scripted to never complete.
                AccountStatus::Initiated
            } else {
                *polls -= 1;
                if *polls == 0 {
                    result_status
                } else {
                    AccountStatus::Initiated
                }
            };

            return Ok(ConnectedAccount {
                id: account_id.to_string(),
                status,
                toolkit: None,
                created_at: None,
            });
        }

        state
            .accounts
            .values()
            .flatten()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or_else(|| KobleError::Platform(format!("No such account: {}", account_id)))
    }

    async fn fetch_tools(&self, user_id: &str, slugs: &[String]) -> Result<Vec<ToolDescriptor>> {
        let mut state = self.state.write().unwrap();
        state.fetches += 1;
        state.last_fetch = Some((user_id.to_string(), slugs.to_vec()));

        Ok(state
            .tools
            .iter()
            .filter(|t| slugs.contains(&t.slug))
            .cloned()
            .collect())
    }

    async fn execute_tool(
        &self,
        slug: &str,
        _user_id: &str,
        _arguments: serde_json::Value,
    ) -> Result<ToolExecution> {
        let state = self.state.read().unwrap();
        state
            .executions
            .get(slug)
            .cloned()
            .ok_or_else(|| KobleError::Platform(format!("No such tool: {}", slug)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_account(id: &str) -> ConnectedAccount {
        ConnectedAccount {
            id: id.to_string(),
            status: AccountStatus::Active,
            toolkit: Some("gmail".to_string()),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_seeded_accounts_are_listed() {
        let platform = MemoryPlatform::new().with_account("user-123", active_account("acct-1"));

        let accounts = platform.list_connected_accounts("user-123").await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, "acct-1");
        assert!(platform
            .list_connected_accounts("other-user")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(platform.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_linked_account_activates_after_polls() {
        let platform = MemoryPlatform::new().activating_after(2);

        let link = platform.initiate_link("user-123", "ac_1").await.unwrap();
        assert_eq!(platform.link_count(), 1);

        let first = platform.get_connected_account(&link.id).await.unwrap();
        assert_eq!(first.status, AccountStatus::Initiated);

        let second = platform.get_connected_account(&link.id).await.unwrap();
        assert_eq!(second.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_fetch_records_scope() {
        let platform = MemoryPlatform::new().with_tool(ToolDescriptor {
            slug: "GMAIL_CREATE_EMAIL_DRAFT".to_string(),
            description: None,
            input_parameters: serde_json::json!({}),
        });

        let slugs = vec!["GMAIL_CREATE_EMAIL_DRAFT".to_string()];
        let tools = platform.fetch_tools("user-123", &slugs).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(
            platform.last_fetch(),
            Some(("user-123".to_string(), slugs))
        );
    }
}
