//! Action registry: name lookup and output parsing.

use crate::scan::ScanOptions;
use crate::{ActionDescriptor, ActionResult, BuildTool, Diagnostic, ToolError};

/// Registry of available actions.
pub struct ActionRegistry {
    actions: Vec<ActionDescriptor>,
    options: ScanOptions,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            options: ScanOptions::default(),
        }
    }

    /// Create a registry with the built-in rebar3 actions.
    pub fn with_builtins() -> Self {
        crate::default_registry()
    }

    /// Create a registry holding every action of `tool`.
    pub fn for_tool(tool: &dyn BuildTool) -> Self {
        let mut registry = Self::new();
        for action in tool.actions() {
            registry.register(action);
        }
        registry
    }

    /// Replace the scanner options used by [`parse`](Self::parse).
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Register an action. An existing action with the same name is replaced
    /// in place, keeping its position in listings.
    pub fn register(&mut self, action: ActionDescriptor) {
        match self.actions.iter_mut().find(|a| a.name == action.name) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    /// Get all registered actions.
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Look up an action by name or alias. Exact names win over aliases.
    pub fn get(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.actions.iter().find(|a| a.answers_to(name)))
    }

    /// Parse one action's captured output into diagnostics, in output order.
    pub fn parse(&self, name: &str, output: &str) -> Result<Vec<Diagnostic>, ToolError> {
        let action = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownAction(name.to_string()))?;
        Ok(action.parse(output, &self.options))
    }

    /// Like [`parse`](Self::parse), wrapped with the resolved action name.
    pub fn parse_result(&self, name: &str, output: &str) -> Result<ActionResult, ToolError> {
        let action = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownAction(name.to_string()))?;
        Ok(ActionResult::new(
            &action.name,
            action.parse(output, &self.options),
        ))
    }
}
