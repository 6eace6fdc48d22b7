//! Agent runner with tool calling loop.

use super::tools::Toolbox;
use crate::error::{KobleError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use tracing::{debug, info};

/// Agent that executes remote tools on behalf of a user.
pub struct Agent {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    name: String,
    instructions: String,
    model: String,
    toolbox: Toolbox,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent with the given toolbox.
    ///
    /// An empty toolbox is allowed here; `run` reports it as an error.
    pub fn new(name: &str, instructions: &str, model: &str, toolbox: Toolbox) -> Self {
        Self {
            client: create_client(),
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: model.to_string(),
            toolbox,
            max_iterations: 8,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// The agent's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the agent against a natural-language task.
    pub async fn run(&self, task: &str) -> Result<AgentOutcome> {
        if self.toolbox.is_empty() {
            return Err(KobleError::ToolUnavailable(
                "no remote tools were fetched for this run".to_string(),
            ));
        }

        debug!(
            "Agent '{}' starting with {} tool(s)",
            self.name,
            self.toolbox.len()
        );

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.instructions.clone())
                .build()
                .map_err(|e| KobleError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(task.to_string())
                .build()
                .map_err(|e| KobleError::Agent(e.to_string()))?
                .into(),
        ];

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(KobleError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(self.toolbox.definitions())
                .build()
                .map_err(|e| KobleError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| KobleError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| KobleError::Agent("No response from model".to_string()))?;

            match &choice.message.tool_calls {
                Some(tool_calls) if !tool_calls.is_empty() => {
                    let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                        .tool_calls(tool_calls.clone())
                        .build()
                        .map_err(|e| KobleError::Agent(e.to_string()))?;
                    messages.push(assistant_msg.into());

                    for tool_call in tool_calls {
                        let record = self.execute_tool_call(tool_call).await;

                        let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(&tool_call.id)
                            .content(record.result.clone())
                            .build()
                            .map_err(|e| KobleError::Agent(e.to_string()))?;
                        messages.push(tool_msg.into());

                        tool_calls_made.push(record);
                    }
                }
                _ => {
                    // No tool calls: the model is done.
                    return Ok(build_outcome(
                        &choice.message.content,
                        tool_calls_made,
                        iterations,
                    ));
                }
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let result = match self.toolbox.execute(name, arguments).await {
            Ok(output) => output,
            Err(e) => format!("Tool error: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

/// Assemble the final outcome of an agent run.
fn build_outcome(
    content: &Option<String>,
    tool_calls: Vec<ToolCallRecord>,
    iterations: usize,
) -> AgentOutcome {
    AgentOutcome {
        final_output: content.clone().unwrap_or_default(),
        tool_calls,
        iterations,
    }
}

/// Outcome of an agent run.
#[derive(Debug)]
pub struct AgentOutcome {
    /// The final text produced by the agent.
    pub final_output: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Slug of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned to the model.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
