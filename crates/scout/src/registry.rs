use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{AgentError, AgentResult};
use crate::models::message::ToolRequest;
use crate::models::tool::Tool;
use crate::tools::{PageFetcher, SearchTool, ToolExecutor, ToolInput, ToolResult};

struct Entry {
    schema: Tool,
    executor: Arc<dyn ToolExecutor>,
}

/// Catalog of the tools offered to the model, in registration order
///
/// The registry is built once and then shared read-only between requests.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    /// An empty registry. The agent still works, the model is simply offered no tools.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with both web tools
    pub fn standard(search: SearchTool, fetcher: PageFetcher) -> AgentResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(search))?;
        registry.register(Arc::new(fetcher))?;
        Ok(registry)
    }

    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) -> AgentResult<()> {
        let schema = executor.schema();
        if !ToolInput::supports(&schema.name) {
            return Err(AgentError::Internal(format!(
                "Tool {} has no argument type and cannot be dispatched",
                schema.name
            )));
        }
        if self.get(&schema.name).is_some() {
            return Err(AgentError::Internal(format!(
                "Tool {} is already registered",
                schema.name
            )));
        }
        self.entries.push(Entry { schema, executor });
        Ok(())
    }

    /// Schemas advertised to the model
    pub fn describe(&self) -> Vec<Tool> {
        self.entries.iter().map(|entry| entry.schema.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.schema.name == name)
    }

    /// Run the tool a request names. Lookup and argument errors come back as error results.
    pub async fn dispatch(&self, request: &ToolRequest) -> ToolResult {
        let result = match self.resolve(request) {
            Ok((entry, input)) => {
                info!(id = %request.id, tool = %request.name, "dispatching tool");
                entry.executor.execute(input).await
            }
            Err(error) => ToolResult::from(error),
        };

        if let Some(error) = result.error() {
            warn!(id = %request.id, tool = %request.name, error, "tool returned an error");
        }
        result
    }

    fn resolve(&self, request: &ToolRequest) -> AgentResult<(&Entry, ToolInput)> {
        let entry = self
            .get(&request.name)
            .ok_or_else(|| AgentError::ToolNotFound(request.name.clone()))?;
        let call = request.tool_call()?;
        let input = ToolInput::from_call(&call)?;
        Ok((entry, input))
    }
}
