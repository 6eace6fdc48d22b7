//! Remote tool handling for the agent.

use crate::error::Result;
use crate::platform::{Platform, ToolDescriptor};
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use std::sync::Arc;
use tracing::info;

/// Tools fetched from the platform for one user, executable remotely.
pub struct Toolbox {
    platform: Arc<dyn Platform>,
    user_id: String,
    tools: Vec<ToolDescriptor>,
}

impl Toolbox {
    /// Create a toolbox from fetched descriptors.
    pub fn new(platform: Arc<dyn Platform>, user_id: &str, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            platform,
            user_id: user_id.to_string(),
            tools,
        }
    }

    /// Whether any tools are available.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Number of available tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Slugs of the available tools.
    pub fn slugs(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.slug.as_str()).collect()
    }

    /// The fetched descriptors.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// OpenAI function/tool definitions for the available tools.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools
            .iter()
            .map(|t| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: t.slug.clone(),
                    description: t.description.clone(),
                    parameters: Some(t.input_parameters.clone()),
                    strict: None,
                },
            })
            .collect()
    }

    /// Execute a model-issued tool call on the platform.
    ///
    /// Returns the result as a string for the tool message. Unknown tool
    /// names, malformed arguments, and remote failures are rendered as
    /// error text so the model can react to them.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String> {
        if !self.tools.iter().any(|t| t.slug == name) {
            return Ok(format!("Tool error: unknown tool '{}'", name));
        }

        let arguments: serde_json::Value = match serde_json::from_str(arguments) {
            Ok(value) => value,
            Err(e) => return Ok(format!("Tool error: invalid arguments: {}", e)),
        };

        info!("Executing remote tool {}", name);

        let execution = self
            .platform
            .execute_tool(name, &self.user_id, arguments)
            .await?;

        if execution.successful {
            Ok(serde_json::to_string(&execution.data)?)
        } else {
            Ok(format!(
                "Tool error: {}",
                execution.error.as_deref().unwrap_or("remote action failed")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryPlatform, ToolExecution};

    fn draft_tool() -> ToolDescriptor {
        ToolDescriptor {
            slug: "GMAIL_CREATE_EMAIL_DRAFT".to_string(),
            description: Some("Create a draft email in Gmail".to_string()),
            input_parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "recipient_email": {"type": "string"},
                    "subject": {"type": "string"},
                    "body": {"type": "string"}
                },
                "required": ["recipient_email"]
            }),
        }
    }

    fn toolbox(platform: MemoryPlatform, tools: Vec<ToolDescriptor>) -> Toolbox {
        Toolbox::new(Arc::new(platform), "user-123", tools)
    }

    #[test]
    fn test_definitions_carry_schema() {
        let toolbox = toolbox(MemoryPlatform::new(), vec![draft_tool()]);

        let definitions = toolbox.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].function.name, "GMAIL_CREATE_EMAIL_DRAFT");
        let params = definitions[0].function.parameters.as_ref().unwrap();
        assert_eq!(params["required"][0], "recipient_email");
    }

    #[tokio::test]
    async fn test_execute_success_returns_data() {
        let platform = MemoryPlatform::new().with_execution(
            "GMAIL_CREATE_EMAIL_DRAFT",
            ToolExecution {
                successful: true,
                data: serde_json::json!({"id": "draft-1"}),
                error: None,
            },
        );
        let toolbox = toolbox(platform, vec![draft_tool()]);

        let result = toolbox
            .execute("GMAIL_CREATE_EMAIL_DRAFT", r#"{"recipient_email": "a@b.c"}"#)
            .await
            .unwrap();
        assert!(result.contains("draft-1"));
    }

    #[tokio::test]
    async fn test_execute_failure_is_rendered_for_the_model() {
        let platform = MemoryPlatform::new().with_execution(
            "GMAIL_CREATE_EMAIL_DRAFT",
            ToolExecution {
                successful: false,
                data: serde_json::json!(null),
                error: Some("insufficient scopes".to_string()),
            },
        );
        let toolbox = toolbox(platform, vec![draft_tool()]);

        let result = toolbox
            .execute("GMAIL_CREATE_EMAIL_DRAFT", "{}")
            .await
            .unwrap();
        assert_eq!(result, "Tool error: insufficient scopes");
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let toolbox = toolbox(MemoryPlatform::new(), vec![draft_tool()]);

        let result = toolbox.execute("GMAIL_SEND_EMAIL", "{}").await.unwrap();
        assert!(result.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_execute_invalid_arguments() {
        let toolbox = toolbox(MemoryPlatform::new(), vec![draft_tool()]);

        let result = toolbox
            .execute("GMAIL_CREATE_EMAIL_DRAFT", "not json")
            .await
            .unwrap();
        assert!(result.contains("invalid arguments"));
    }
}
