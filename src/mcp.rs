//! Remote document tool backed by an MCP server child process.
//!
//! The agent can pull documents that are not in the local index (for
//! example a Google Docs bridge) from any MCP server that exposes a
//! document-fetching tool over stdio.

use std::collections::HashMap;

use rmcp::model::CallToolRequestParams;
use rmcp::service::RoleClient;
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::ServiceExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::core::errors::RagError;

/// How to launch the MCP server that serves remote documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocsConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Tool to call; defaults to the first tool the server lists.
    #[serde(default)]
    pub tool: Option<String>,
}

pub struct RemoteDocs {
    service: RunningService<RoleClient, ()>,
    tools: Vec<Value>,
    preferred_tool: Option<String>,
}

impl RemoteDocs {
    /// Spawns the configured server over stdio and lists its tools.
    pub async fn connect(config: &RemoteDocsConfig) -> Result<Self, RagError> {
        let command = config.command.trim();
        if command.is_empty() {
            return Err(RagError::Config("remote_docs.command is empty".to_string()));
        }

        let mut cmd = Command::new(command);
        cmd.args(&config.args);
        if !config.env.is_empty() {
            cmd.envs(&config.env);
        }

        let transport = TokioChildProcess::new(cmd.configure(|cmd| {
            let _ = cmd;
        }))
        .map_err(RagError::tool)?;
        let service = ().serve(transport).await.map_err(RagError::tool)?;

        let tools_result = service
            .list_tools(Default::default())
            .await
            .map_err(RagError::tool)?;
        let tools = serde_json::to_value(&tools_result)
            .ok()
            .and_then(|value| value.get("tools").cloned())
            .and_then(|value| value.as_array().cloned())
            .unwrap_or_default();

        Ok(Self {
            service,
            tools,
            preferred_tool: config.tool.clone(),
        })
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .filter_map(|tool| tool.get("name").and_then(|v| v.as_str()))
            .map(|name| name.to_string())
            .collect()
    }

    /// Calls the configured (or first listed) tool with `query` and
    /// returns the text content of the result.
    pub async fn fetch(&self, query: &str) -> Result<String, RagError> {
        let tool = pick_tool(self.preferred_tool.as_deref(), &self.tool_names())
            .ok_or_else(|| RagError::Tool("remote docs server lists no tools".to_string()))?;

        let mut arguments = Map::new();
        arguments.insert("query".to_string(), Value::String(query.to_string()));

        let params = CallToolRequestParams {
            name: tool.into(),
            arguments: Some(arguments),
            meta: None,
            task: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(RagError::tool)?;

        Ok(format_tool_result(&result))
    }
}

fn pick_tool(preferred: Option<&str>, available: &[String]) -> Option<String> {
    if let Some(name) = preferred {
        if !name.trim().is_empty() {
            return Some(name.to_string());
        }
    }
    available.first().cloned()
}

fn format_tool_result(result: &impl Serialize) -> String {
    let value = serde_json::to_value(result).unwrap_or(Value::Null);
    let mut parts = Vec::new();
    if let Some(content) = value.get("content").and_then(|v| v.as_array()) {
        for item in content {
            let item_type = item.get("type").and_then(|v| v.as_str()).unwrap_or("");
            if item_type == "text" {
                if let Some(text) = item.get("text").and_then(|v| v.as_str()) {
                    if !text.trim().is_empty() {
                        parts.push(text.to_string());
                        continue;
                    }
                }
            }
            parts.push(item.to_string());
        }
    }

    if parts.is_empty() {
        return serde_json::to_string_pretty(&value).unwrap_or_default();
    }

    let mut output = parts.join("\n");
    let is_error = value
        .get("is_error")
        .or_else(|| value.get("isError"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if is_error {
        output = format!("Tool error: {}", output);
    }
    output
}
