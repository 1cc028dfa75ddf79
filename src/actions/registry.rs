use super::traits::{Action, ActionSpec};
use crate::schema::SchemaDescriptor;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the synthetic action that proposes a candidate record.
pub const SUBMIT_ACTION: &str = "submit";

const SUBMIT_DESCRIPTION: &str = "Submit the final record for the topic once the gathered \
evidence supports every field. The arguments must match the target schema.";

/// Fixed set of named actions plus the synthetic `submit` action.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Replaces any existing action with the same name.
    ///
    /// `submit` is reserved; registering it is refused.
    pub fn register(&mut self, action: Box<dyn Action>) -> bool {
        if action.name() == SUBMIT_ACTION {
            tracing::warn!("refusing to register an action named '{SUBMIT_ACTION}'");
            return false;
        }
        let action: Arc<dyn Action> = Arc::from(action);
        self.actions.insert(action.name().to_string(), action);
        true
    }

    /// Look up an invocable action by name. `submit` is never invocable.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Return sorted list of registered action names.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Specs for every registered action (sorted by name), followed by the
    /// `submit` action whose parameters are the target schema.
    pub fn specs_with_submit(&self, schema: &SchemaDescriptor) -> Vec<ActionSpec> {
        let mut specs: Vec<ActionSpec> = self
            .action_names()
            .into_iter()
            .filter_map(|name| self.actions.get(name))
            .map(|action| action.spec())
            .collect();
        specs.push(submit_spec(schema));
        specs
    }
}

pub fn submit_spec(schema: &SchemaDescriptor) -> ActionSpec {
    ActionSpec {
        name: SUBMIT_ACTION.to_string(),
        description: SUBMIT_DESCRIPTION.to_string(),
        parameters: schema.as_value().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::traits::RunContext;
    use serde_json::{Value, json};
    use std::future::Future;
    use std::pin::Pin;

    struct NamedAction(&'static str);

    impl Action for NamedAction {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        fn invoke<'a>(
            &'a self,
            _args: Value,
            _ctx: &'a RunContext,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move { Ok("ok".to_string()) })
        }
    }

    #[test]
    fn specs_end_with_submit_carrying_target_schema() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(NamedAction("search")));
        registry.register(Box::new(NamedAction("fetch_and_summarize")));
        let schema = SchemaDescriptor::new(json!({"type": "object", "required": ["x"]}));

        let specs = registry.specs_with_submit(&schema);
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["fetch_and_summarize", "search", "submit"]);
        assert_eq!(&specs[2].parameters, schema.as_value());
    }

    #[test]
    fn submit_is_reserved() {
        let mut registry = ActionRegistry::new();
        assert!(!registry.register(Box::new(NamedAction(SUBMIT_ACTION))));
        assert!(registry.get(SUBMIT_ACTION).is_none());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(NamedAction("search")));
        registry.register(Box::new(NamedAction("search")));
        assert_eq!(registry.action_names(), vec!["search"]);
    }

    #[test]
    fn get_unknown_returns_none() {
        let registry = ActionRegistry::new();
        assert!(registry.get("crawl").is_none());
    }
}
