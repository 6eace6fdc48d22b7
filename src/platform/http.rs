//! HTTP implementation of the platform client.

use super::{AuthLink, ConnectedAccount, Platform, ToolDescriptor, ToolExecution};
use crate::error::{KobleError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// HTTP client for the integration platform API.
pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpPlatform {
    /// Create a new platform client.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| KobleError::Config(format!("Invalid platform base URL: {}", e)))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| KobleError::Config(format!("Invalid platform endpoint: {}", e)))
    }

    /// Send a request and decode the JSON body, mapping non-2xx responses
    /// to a platform error carrying status and body text.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.header("x-api-key", &self.api_key).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body).unwrap_or(body);
            return Err(KobleError::Platform(format!("{}: {}", status, message)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    #[instrument(skip(self))]
    async fn list_connected_accounts(&self, user_id: &str) -> Result<Vec<ConnectedAccount>> {
        let url = self.endpoint("/api/v3/connected_accounts")?;
        let page: Page<ConnectedAccount> = self
            .send(self.client.get(url).query(&[("user_ids", user_id)]))
            .await?;

        debug!("Found {} connected account(s)", page.items.len());
        Ok(page.items)
    }

    #[instrument(skip(self))]
    async fn initiate_link(&self, user_id: &str, auth_config_id: &str) -> Result<AuthLink> {
        let url = self.endpoint("/api/v3/connected_accounts/link")?;
        let body = LinkRequest {
            user_id,
            auth_config_id,
        };

        let link: AuthLink = self.send(self.client.post(url).json(&body)).await?;
        debug!("Initiated handshake for account {}", link.id);
        Ok(link)
    }

    #[instrument(skip(self))]
    async fn get_connected_account(&self, account_id: &str) -> Result<ConnectedAccount> {
        let url = self.endpoint(&format!("/api/v3/connected_accounts/{}", account_id))?;
        self.send(self.client.get(url)).await
    }

    #[instrument(skip(self, slugs), fields(count = slugs.len()))]
    async fn fetch_tools(&self, user_id: &str, slugs: &[String]) -> Result<Vec<ToolDescriptor>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint("/api/v3/tools")?;
        let joined = slugs.join(",");
        let page: Page<ToolDescriptor> = self
            .send(
                self.client
                    .get(url)
                    .query(&[("user_id", user_id), ("tool_slugs", joined.as_str())]),
            )
            .await?;

        debug!("Fetched {} tool descriptor(s)", page.items.len());
        Ok(page.items)
    }

    #[instrument(skip(self, arguments))]
    async fn execute_tool(
        &self,
        slug: &str,
        user_id: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolExecution> {
        let url = self.endpoint(&format!("/api/v3/tools/execute/{}", slug))?;
        let body = ExecuteRequest { user_id, arguments };

        self.send(self.client.post(url).json(&body)).await
    }
}

/// Paged list envelope used by the platform's list endpoints.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
struct LinkRequest<'a> {
    user_id: &'a str,
    auth_config_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    user_id: &'a str,
    arguments: serde_json::Value,
}

/// Pull a human-readable message out of a platform error body, if the
/// body is the usual `{"error": {"message": ...}}` envelope.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = HttpPlatform::new("not a url", "key", Duration::from_secs(5));
        assert!(matches!(result, Err(KobleError::Config(_))));
    }

    #[test]
    fn test_endpoint_join() {
        let platform =
            HttpPlatform::new("https://backend.composio.dev", "key", Duration::from_secs(5))
                .unwrap();
        let url = platform.endpoint("/api/v3/connected_accounts").unwrap();
        assert_eq!(
            url.as_str(),
            "https://backend.composio.dev/api/v3/connected_accounts"
        );
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"message": "invalid api key"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("invalid api key")
        );
        assert!(extract_error_message("plain text").is_none());
    }

    #[test]
    fn test_page_tolerates_missing_items() {
        let page: Page<ToolDescriptor> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
    }
}
