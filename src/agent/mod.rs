//! Agent system for executing remote actions through an LLM.
//!
//! Provides an agent that drives tools fetched from the integration
//! platform: descriptors become OpenAI tool definitions, and tool calls
//! issued by the model are executed remotely on the platform.

mod runner;
mod tools;

pub use runner::{Agent, AgentOutcome, ToolCallRecord};
pub use tools::Toolbox;
