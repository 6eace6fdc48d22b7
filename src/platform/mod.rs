//! Integration platform abstraction for Koble.
//!
//! Provides a trait-based interface over the remote tool-integration
//! platform: connected account lookup, authorization handshakes, tool
//! fetch, and tool execution.

mod http;
mod memory;

pub use http::HttpPlatform;
pub use memory::MemoryPlatform;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a connected account on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Authorized and usable for tool execution.
    Active,
    /// Handshake started but not completed by the user.
    Initiated,
    /// Authorization failed or was revoked.
    Failed,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    /// Whether this account can back tool executions.
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Whether the handshake has terminally failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, AccountStatus::Failed)
    }
}

/// An authorized binding between a user and a third-party service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    /// Platform-assigned account id.
    pub id: String,
    /// Current authorization status.
    pub status: AccountStatus,
    /// Slug of the third-party service (e.g., "gmail").
    #[serde(default)]
    pub toolkit: Option<String>,
    /// When the account was created on the platform.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of initiating an authorization handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthLink {
    /// Id of the account being provisioned.
    pub id: String,
    /// URL the user must visit to grant access.
    pub redirect_url: String,
}

/// A remote tool exposed to the agent for one user's connected account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Platform-wide tool slug (e.g., "GMAIL_CREATE_EMAIL_DRAFT").
    pub slug: String,
    /// Human-readable description of what the tool does.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON schema for the tool's arguments.
    #[serde(default = "empty_object")]
    pub input_parameters: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Response envelope from executing a tool on the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    /// Whether the remote action succeeded.
    pub successful: bool,
    /// Action output data.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Error message when unsuccessful.
    #[serde(default)]
    pub error: Option<String>,
}

/// Trait for integration platform implementations.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List connected accounts for a user, in platform order.
    async fn list_connected_accounts(&self, user_id: &str) -> Result<Vec<ConnectedAccount>>;

    /// Start an authorization handshake for a user.
    async fn initiate_link(&self, user_id: &str, auth_config_id: &str) -> Result<AuthLink>;

    /// Read the current state of a connected account.
    async fn get_connected_account(&self, account_id: &str) -> Result<ConnectedAccount>;

    /// Fetch tool descriptors scoped to a user and a set of tool slugs.
    async fn fetch_tools(&self, user_id: &str, slugs: &[String]) -> Result<Vec<ToolDescriptor>>;

    /// Execute a tool on behalf of a user.
    async fn execute_tool(
        &self,
        slug: &str,
        user_id: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolExecution>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Initiated.is_active());
        assert!(AccountStatus::Failed.is_failed());
        assert!(!AccountStatus::Active.is_failed());
    }

    #[test]
    fn test_status_tolerates_unknown_wire_values() {
        let status: AccountStatus = serde_json::from_str("\"EXPIRED\"").unwrap();
        assert_eq!(status, AccountStatus::Unknown);

        let status: AccountStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(status, AccountStatus::Active);
    }

    #[test]
    fn test_tool_descriptor_defaults() {
        let descriptor: ToolDescriptor =
            serde_json::from_str(r#"{"slug": "GMAIL_CREATE_EMAIL_DRAFT"}"#).unwrap();
        assert_eq!(descriptor.slug, "GMAIL_CREATE_EMAIL_DRAFT");
        assert!(descriptor.description.is_none());
        assert_eq!(descriptor.input_parameters, serde_json::json!({}));
    }
}
