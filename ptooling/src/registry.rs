//! Tool registry for lookup by tool definition name.

use std::future::Future;
use std::sync::Arc;

use pcommon::Registry;
use pprovider::ToolDefinition;

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext, ToolOutput};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        self.tools.insert(name, Arc::new(tool));
    }

    /// Registers an async handler whose text result is fed back to the model.
    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output.await.map(ToolOutput::Recall) }
        }));
    }

    /// Registers an async handler that decides its own [`ToolOutput`].
    pub fn register_output_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output }
        });
    }

    /// Registers a tool the caller's front end executes.
    pub fn register_frontend(&mut self, definition: ToolDefinition) {
        self.register_output_fn(definition, |_args_json, _context| async {
            Ok(ToolOutput::Frontend)
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|tool| tool.definition()).collect();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    /// Definitions for `names`, in the given order; unknown names are skipped.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition::new(name, format!("{name} tool"), r#"{"type":"object"}"#)
    }

    #[test]
    fn registry_tracks_registered_tools() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register_sync_fn(definition("lookup"), |args, _ctx| Ok(args));
        registry.register_frontend(definition("open_map"));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("lookup"));

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["lookup".to_string(), "open_map".to_string()]);

        assert!(registry.remove("lookup").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definitions_for_keeps_requested_order_and_skips_unknown() {
        let mut registry = ToolRegistry::new();
        registry.register_sync_fn(definition("a"), |args, _ctx| Ok(args));
        registry.register_sync_fn(definition("b"), |args, _ctx| Ok(args));

        let selected = registry.definitions_for(&[
            "b".to_string(),
            "missing".to_string(),
            "a".to_string(),
        ]);
        let names: Vec<&str> = selected.iter().map(|definition| definition.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn string_handlers_are_recalled_and_frontend_tools_defer() {
        let mut registry = ToolRegistry::new();
        registry.register_fn(definition("shout"), |args, _ctx| async move {
            Ok(args.to_uppercase())
        });
        registry.register_frontend(definition("open_map"));
        let context = ToolExecutionContext::new("session-1");

        let shout = registry.get("shout").expect("registered");
        assert_eq!(
            shout.invoke("hi", &context).await,
            Ok(ToolOutput::Recall("HI".to_string()))
        );

        let frontend = registry.get("open_map").expect("registered");
        assert_eq!(frontend.invoke("{}", &context).await, Ok(ToolOutput::Frontend));
    }
}
