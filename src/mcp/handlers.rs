use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::McpError;
use crate::tools::{Pipeline, SlackTool, all_tools};

use super::types::{CallToolResult, Tool as McpTool, ToolInputSchema};

/// Registry of the exposed tools plus the pipeline that runs them.
pub struct RequestHandler {
    tools: Vec<Box<dyn SlackTool>>,
    index: HashMap<&'static str, usize>,
    pipeline: Pipeline,
}

impl RequestHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        let tools = all_tools();
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.spec().name, i))
            .collect();

        if pipeline.policy().is_enabled() {
            info!("Safe search mode enabled: private channels, DMs and group DMs are hidden");
        }

        Self {
            tools,
            index,
            pipeline,
        }
    }

    pub fn list_tools(&self) -> Vec<McpTool> {
        self.tools
            .iter()
            .map(|tool| tool_to_mcp_tool(tool.as_ref()))
            .collect()
    }

    /// Run a tool. Failures inside the tool come back as an error result,
    /// only an unknown tool name is an `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        let tool = self
            .index
            .get(name)
            .map(|&i| self.tools[i].as_ref())
            .ok_or_else(|| McpError::NotFound(format!("Tool not found: {}", name)))?;

        let result = match self.pipeline.run(tool, arguments).await {
            Ok(value) => CallToolResult::success(value)?,
            Err(e) => {
                if let McpError::Validation(ref v) = e {
                    warn!(
                        tool = name,
                        field = %v.field,
                        reason = v.reason.code(),
                        "Rejected tool arguments"
                    );
                }
                CallToolResult::failure(e.to_failure())?
            }
        };

        Ok(result)
    }
}

fn tool_to_mcp_tool(tool: &dyn SlackTool) -> McpTool {
    let spec = tool.spec();
    let properties: Map<String, Value> = spec
        .params
        .iter()
        .map(|param| (param.name.to_string(), param.json_schema()))
        .collect();

    McpTool {
        name: spec.name.to_string(),
        description: spec.description.to_string(),
        input_schema: ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: spec
                .required_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            additional_properties: false,
        },
    }
}
