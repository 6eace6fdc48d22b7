//! Koble - User Connections and Remote Agent Tools
//!
//! A CLI for connecting end users to third-party services through a
//! tool-integration platform and driving LLM agents against the
//! resulting remote tools.
//!
//! The name "Koble" comes from the Norwegian word for "connect."
//!
//! # Overview
//!
//! Koble allows you to:
//! - Reuse a user's existing authorized connection, or walk them through
//!   a new OAuth-style handshake with a bounded wait
//! - Fetch remote tools (e.g., Gmail draft creation) scoped to that user
//! - Run an LLM agent that executes those tools on the platform
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `platform` - Integration platform client (HTTP and in-memory)
//! - `connect` - Connection lookup and authorization handshakes
//! - `agent` - Agent runner over remote tools
//! - `orchestrator` - Flow coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use koble::config::Settings;
//! use koble::orchestrator::{DraftRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = DraftRequest {
//!         to: "someone@example.com".to_string(),
//!         subject: "Hello".to_string(),
//!         body: "Drafted by an agent.".to_string(),
//!     };
//!     let outcome = orchestrator
//!         .run_task(&request.to_task(), |url| println!("Authorize at {url}"))
//!         .await?;
//!     println!("{}", outcome.final_output);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod platform;

pub use error::{KobleError, Result};
