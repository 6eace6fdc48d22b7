//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::connect::{self, Lookup};
use crate::orchestrator::Orchestrator;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Koble Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Credentials").bold());
    let key_checks = vec![
        check_api_key("COMPOSIO_API_KEY", "export COMPOSIO_API_KEY='...'"),
        check_api_key("OPENAI_API_KEY", "export OPENAI_API_KEY='sk-...'"),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Identities").bold());
    let identity_checks = vec![
        check_identity(
            "User id",
            settings.user_id().ok(),
            "Set EXTERNAL_USER_ID or [user] id in the config file",
        ),
        check_identity(
            "Auth config id",
            settings.auth_config_id().ok(),
            "Set AUTH_CONFIG_ID or [connection] auth_config_id (needed for first-time authorization)",
        ),
    ];
    for check in &identity_checks {
        check.print();
    }
    checks.extend(identity_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    println!("{}", style("Platform").bold());
    let platform_check = check_platform(settings).await;
    platform_check.print();
    checks.push(platform_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Koble.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Koble is ready to use.");
    }

    Ok(())
}

/// Check that an API key is configured, without printing it.
fn check_api_key(name: &str, hint: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(key) if key.len() > 8 => {
            let masked = format!("{}...{}", &key[..4], &key[key.len() - 4..]);
            CheckResult::ok(name, &format!("configured ({})", masked))
        }
        Ok(key) if !key.is_empty() => CheckResult::warning(
            name,
            "set but suspiciously short",
            &format!("Set with: {}", hint),
        ),
        Ok(_) => CheckResult::error(name, "empty", &format!("Set with: {}", hint)),
        Err(_) => CheckResult::error(name, "not set", &format!("Set with: {}", hint)),
    }
}

/// Check a configured identity value.
fn check_identity(name: &str, value: Option<String>, hint: &str) -> CheckResult {
    match value {
        Some(v) => CheckResult::ok(name, &v),
        None => CheckResult::warning(name, "not configured", hint),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: koble config edit",
        )
    }
}

/// Check platform reachability with a real lookup when possible.
async fn check_platform(settings: &Settings) -> CheckResult {
    let base_url = settings.platform.base_url.clone();

    let user_id = match settings.user_id() {
        Ok(id) => id,
        Err(_) => {
            return CheckResult::warning(
                "Reachability",
                "skipped (no user id configured)",
                "Configure a user id to test the platform connection",
            );
        }
    };

    let orchestrator = match Orchestrator::new(settings.clone()) {
        Ok(o) => o,
        Err(e) => {
            return CheckResult::warning(
                "Reachability",
                &format!("skipped ({})", e),
                "Configure COMPOSIO_API_KEY to test the platform connection",
            );
        }
    };

    match connect::lookup(
        orchestrator.platform().as_ref(),
        &user_id,
        settings.connection.selection,
    )
    .await
    {
        Lookup::Found(account) => CheckResult::ok(
            "Reachability",
            &format!("{} (active connection {})", base_url, account.id),
        ),
        Lookup::NotFound => CheckResult::ok(
            "Reachability",
            &format!("{} (no connection yet for this user)", base_url),
        ),
        Lookup::LookupFailed(cause) => CheckResult::error(
            "Reachability",
            &format!("{} unreachable", base_url),
            &cause,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_identity() {
        let result = check_identity("User id", Some("user-123".to_string()), "hint");
        assert_eq!(result.status, CheckStatus::Ok);

        let result = check_identity("User id", None, "hint");
        assert_eq!(result.status, CheckStatus::Warning);
    }
}
