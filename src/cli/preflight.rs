//! Pre-flight checks before remote operations.
//!
//! Validates that required credentials and identities are configured
//! before starting operations that would otherwise fail midway with an
//! opaque remote error.

use crate::config::Settings;
use crate::error::{KobleError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Connecting requires the platform key, a user id, and an auth config.
    Connect,
    /// Listing tools requires the platform key and a user id.
    Tools,
    /// Agent runs additionally require the OpenAI key.
    Run,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_env_key(
        "COMPOSIO_API_KEY",
        "Set it with: export COMPOSIO_API_KEY='...'",
    )?;
    settings.user_id()?;

    match operation {
        Operation::Connect => {
            // The auth config id is only needed when a handshake actually
            // starts; resolution reports that case itself.
        }
        Operation::Tools => {}
        Operation::Run => {
            check_env_key(
                "OPENAI_API_KEY",
                "Set it with: export OPENAI_API_KEY='sk-...'",
            )?;
        }
    }
    Ok(())
}

/// Check that an environment key is set and non-empty.
fn check_env_key(name: &str, hint: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(KobleError::Config(format!("{} is empty. {}", name, hint))),
        Err(_) => Err(KobleError::Config(format!("{} not set. {}", name, hint))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_env_key_missing() {
        let err = check_env_key("KOBLE_TEST_UNSET_KEY", "set it").unwrap_err();
        assert!(err.to_string().contains("KOBLE_TEST_UNSET_KEY not set"));
    }
}
