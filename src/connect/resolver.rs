//! Lookup-or-handshake connection resolution.

use crate::config::AccountSelection;
use crate::error::{KobleError, Result};
use crate::platform::{ConnectedAccount, Platform};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of looking up a user's existing connections.
///
/// A failed lookup is distinct from a confirmed-empty result: only the
/// latter should start a new authorization handshake.
#[derive(Debug)]
pub enum Lookup {
    /// An active account exists and was selected.
    Found(ConnectedAccount),
    /// The platform confirmed the user has no usable account.
    NotFound,
    /// The lookup itself failed; existence is undetermined.
    LookupFailed(String),
}

/// Options controlling connection resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Auth config id used when a handshake is needed.
    pub auth_config_id: String,
    /// Tie-break when multiple active accounts exist.
    pub selection: AccountSelection,
    /// Deadline for the user to complete authorization.
    pub wait_timeout: Duration,
    /// Interval between handshake status polls.
    pub poll_interval: Duration,
}

/// Look up the user's connected accounts and select one.
///
/// Transport and API failures are folded into `Lookup::LookupFailed`
/// rather than propagated, so callers can decide how to react without a
/// blanket catch.
pub async fn lookup<P: Platform + ?Sized>(
    platform: &P,
    user_id: &str,
    selection: AccountSelection,
) -> Lookup {
    let accounts = match platform.list_connected_accounts(user_id).await {
        Ok(accounts) => accounts,
        Err(e) => {
            warn!("Connection lookup failed: {}", e);
            return Lookup::LookupFailed(e.to_string());
        }
    };

    let active: Vec<ConnectedAccount> = accounts
        .into_iter()
        .filter(|a| a.status.is_active())
        .collect();

    debug!("{} active account(s) for user", active.len());

    let selected = match selection {
        AccountSelection::First => active.into_iter().next(),
        AccountSelection::Newest => active
            .into_iter()
            .max_by_key(|a| a.created_at.unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)),
    };

    match selected {
        Some(account) => Lookup::Found(account),
        None => Lookup::NotFound,
    }
}

/// Resolve an authorized account for the user.
///
/// Returns an existing active account when one is found. When the
/// platform confirms none exists, initiates exactly one authorization
/// handshake, reports the redirect URL through `on_redirect`, and polls
/// until the account activates, fails, or the wait deadline passes.
///
/// A failed lookup is an error; it never silently falls back to a fresh
/// handshake.
pub async fn resolve<P: Platform + ?Sized>(
    platform: &P,
    user_id: &str,
    opts: &ResolveOptions,
    on_redirect: impl FnOnce(&str),
) -> Result<ConnectedAccount> {
    match lookup(platform, user_id, opts.selection).await {
        Lookup::Found(account) => {
            info!("Using existing connection {}", account.id);
            Ok(account)
        }
        Lookup::LookupFailed(cause) => Err(KobleError::ConnectionLookup(cause)),
        Lookup::NotFound => {
            if opts.auth_config_id.is_empty() {
                return Err(KobleError::Config(
                    "A new authorization is needed but no auth config id is set. \
                     Set AUTH_CONFIG_ID or [connection] auth_config_id."
                        .to_string(),
                ));
            }

            info!("No existing connection, starting authorization handshake");
            let link = platform
                .initiate_link(user_id, &opts.auth_config_id)
                .await?;

            on_redirect(&link.redirect_url);

            wait_for_activation(platform, &link.id, opts.wait_timeout, opts.poll_interval).await
        }
    }
}

/// Poll the account status until it activates, terminally fails, or the
/// deadline passes.
async fn wait_for_activation<P: Platform + ?Sized>(
    platform: &P,
    account_id: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ConnectedAccount> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let account = platform.get_connected_account(account_id).await?;

        if account.status.is_active() {
            info!("Connection {} established", account.id);
            return Ok(account);
        }

        if account.status.is_failed() {
            return Err(KobleError::AuthFailed(format!(
                "account {} reported a failed handshake",
                account_id
            )));
        }

        if tokio::time::Instant::now() + poll_interval > deadline {
            return Err(KobleError::AuthTimeout {
                waited_secs: timeout.as_secs(),
            });
        }

        debug!("Handshake pending for {}, polling again", account_id);
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AccountStatus, MemoryPlatform, ToolExecution};
    use chrono::{TimeZone, Utc};

    fn account(id: &str, status: AccountStatus, created_secs: i64) -> ConnectedAccount {
        ConnectedAccount {
            id: id.to_string(),
            status,
            toolkit: Some("gmail".to_string()),
            created_at: Some(Utc.timestamp_opt(created_secs, 0).unwrap()),
        }
    }

    fn options() -> ResolveOptions {
        ResolveOptions {
            auth_config_id: "ac_test".to_string(),
            selection: AccountSelection::First,
            wait_timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_existing_connection_initiates_nothing() {
        let platform = MemoryPlatform::new()
            .with_account("user-123", account("acct-1", AccountStatus::Active, 100));

        let mut redirect_seen = false;
        let resolved = resolve(&platform, "user-123", &options(), |_| {
            redirect_seen = true;
        })
        .await
        .unwrap();

        assert_eq!(resolved.id, "acct-1");
        assert_eq!(platform.link_count(), 0);
        assert!(!redirect_seen);
    }

    #[tokio::test]
    async fn test_no_connection_links_once_and_waits() {
        let platform = MemoryPlatform::new()
            .with_redirect_url("https://platform.example/authorize/xyz")
            .activating_after(2);

        let mut redirect = None;
        let resolved = resolve(&platform, "user-123", &options(), |url| {
            redirect = Some(url.to_string());
        })
        .await
        .unwrap();

        assert_eq!(resolved.id, "acct-1");
        assert!(resolved.status.is_active());
        assert_eq!(platform.link_count(), 1);
        assert_eq!(
            redirect.as_deref(),
            Some("https://platform.example/authorize/xyz")
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error_not_a_handshake() {
        let platform = MemoryPlatform::new().failing_lookups("upstream outage");

        let result = resolve(&platform, "user-123", &options(), |_| {
            panic!("no redirect expected");
        })
        .await;

        match result {
            Err(KobleError::ConnectionLookup(cause)) => {
                assert!(cause.contains("upstream outage"));
            }
            other => panic!("Expected ConnectionLookup error, got {:?}", other),
        }
        assert_eq!(platform.link_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_accounts_are_not_selected() {
        let platform = MemoryPlatform::new()
            .with_account("user-123", account("acct-1", AccountStatus::Initiated, 100));

        let outcome = lookup(&platform, "user-123", AccountSelection::First).await;
        assert!(matches!(outcome, Lookup::NotFound));
    }

    #[tokio::test]
    async fn test_newest_selection_uses_created_at() {
        let platform = MemoryPlatform::new()
            .with_account("user-123", account("acct-old", AccountStatus::Active, 100))
            .with_account("user-123", account("acct-new", AccountStatus::Active, 200));

        let outcome = lookup(&platform, "user-123", AccountSelection::Newest).await;
        match outcome {
            Lookup::Found(account) => assert_eq!(account.id, "acct-new"),
            other => panic!("Expected Found, got {:?}", other),
        }

        let outcome = lookup(&platform, "user-123", AccountSelection::First).await;
        match outcome {
            Lookup::Found(account) => assert_eq!(account.id, "acct-old"),
            other => panic!("Expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let platform = MemoryPlatform::new().activating_after(u32::MAX);

        let result = resolve(&platform, "user-123", &options(), |_| {}).await;
        assert!(matches!(result, Err(KobleError::AuthTimeout { .. })));
    }

    #[tokio::test]
    async fn test_failed_handshake_short_circuits() {
        let platform = MemoryPlatform::new()
            .activating_after(1)
            .with_handshake_result(AccountStatus::Failed);

        let result = resolve(&platform, "user-123", &options(), |_| {}).await;
        assert!(matches!(result, Err(KobleError::AuthFailed(_))));
    }

    // MemoryPlatform's execution scripting is exercised here so the
    // resolver tests and toolbox tests share one seeded platform shape.
    #[tokio::test]
    async fn test_execution_envelope_passthrough() {
        let platform = MemoryPlatform::new().with_execution(
            "GMAIL_CREATE_EMAIL_DRAFT",
            ToolExecution {
                successful: true,
                data: serde_json::json!({"id": "draft-9"}),
                error: None,
            },
        );

        let execution = platform
            .execute_tool("GMAIL_CREATE_EMAIL_DRAFT", "user-123", serde_json::json!({}))
            .await
            .unwrap();
        assert!(execution.successful);
        assert_eq!(execution.data["id"], "draft-9");
    }
}
