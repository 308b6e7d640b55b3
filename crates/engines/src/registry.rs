//! Priority- and capability-based engine selection.
//!
//! Registrations happen at agent construction and the registry is read-only
//! afterward. Resolution is a pure fold over the registration list, so a
//! fixed registry and tool set resolve to the same engine on every call.

use std::sync::Arc;

use agentkeel_core::tool::ToolDefinition;
use tracing::{debug, warn};

use crate::engine::ToolCallEngine;
use crate::structured::StructuredEngine;

/// Holds the registered engines plus the built-in fallback.
pub struct EngineRegistry {
    engines: Vec<Arc<dyn ToolCallEngine>>,
    fallback: Arc<dyn ToolCallEngine>,
}

impl EngineRegistry {
    /// An empty registry. Resolution still succeeds: the built-in
    /// [`StructuredEngine`] answers when nothing else is capable.
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
            fallback: Arc::new(StructuredEngine),
        }
    }

    /// Register an engine. A later registration with the same name replaces
    /// the earlier one in place, keeping its slot for tie-breaking.
    pub fn register(&mut self, engine: Arc<dyn ToolCallEngine>) {
        debug!(
            engine = engine.name(),
            priority = engine.priority(),
            "Registering tool-call engine"
        );
        let existing = self
            .engines
            .iter()
            .position(|registered| registered.name() == engine.name());
        match existing {
            Some(index) => self.engines[index] = engine,
            None => self.engines.push(engine),
        }
    }

    /// Builder-style registration for construction sites.
    pub fn with_engine(mut self, engine: Arc<dyn ToolCallEngine>) -> Self {
        self.register(engine);
        self
    }

    /// Pick the highest-priority engine whose capability predicate accepts
    /// the offered tool set. Ties keep the earliest registration. A
    /// predicate that errors counts as not capable. When no engine is
    /// capable the fallback answers, so this never fails.
    pub fn resolve(&self, tools: &[ToolDefinition]) -> Arc<dyn ToolCallEngine> {
        let mut best: Option<&Arc<dyn ToolCallEngine>> = None;

        for engine in &self.engines {
            let capable = match engine.can_handle(tools) {
                Ok(capable) => capable,
                Err(error) => {
                    warn!(
                        engine = engine.name(),
                        error = %error,
                        "Capability predicate failed; treating engine as not capable"
                    );
                    false
                }
            };
            if !capable {
                continue;
            }
            let better = match best {
                Some(current) => engine.priority() > current.priority(),
                None => true,
            };
            if better {
                best = Some(engine);
            }
        }

        match best {
            Some(engine) => {
                debug!(engine = engine.name(), "Resolved tool-call engine");
                Arc::clone(engine)
            }
            None => {
                debug!(
                    engine = self.fallback.name(),
                    "No registered engine is capable; using fallback"
                );
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Registered engine names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|engine| engine.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, ParsedOutput};
    use crate::gui::GuiEngine;
    use crate::retrieval::RetrievalEngine;
    use agentkeel_core::model::ModelResponse;

    /// Capability by tool-name substring, everything else inert.
    struct VocabEngine {
        name: &'static str,
        priority: i32,
        word: &'static str,
    }

    impl ToolCallEngine for VocabEngine {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn can_handle(&self, tools: &[ToolDefinition]) -> Result<bool, EngineError> {
            Ok(tools.iter().any(|tool| tool.name.contains(self.word)))
        }
        fn parse(&self, _response: &ModelResponse) -> Result<ParsedOutput, EngineError> {
            Ok(ParsedOutput::default())
        }
    }

    /// A predicate that always errors.
    struct BrokenEngine {
        priority: i32,
    }

    impl ToolCallEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn can_handle(&self, _tools: &[ToolDefinition]) -> Result<bool, EngineError> {
            Err(EngineError::Capability("vocabulary store unavailable".into()))
        }
        fn parse(&self, _response: &ModelResponse) -> Result<ParsedOutput, EngineError> {
            Ok(ParsedOutput::default())
        }
    }

    fn defs(names: &[&str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .map(|name| ToolDefinition::new(*name, "", serde_json::json!({})))
            .collect()
    }

    #[test]
    fn built_in_engines_route_by_vocabulary_and_priority() {
        let registry = EngineRegistry::new()
            .with_engine(Arc::new(GuiEngine))
            .with_engine(Arc::new(RetrievalEngine));

        // Only the GUI engine recognizes a screenshot tool.
        let gui = registry.resolve(&defs(&["browser_screenshot"]));
        assert_eq!(gui.name(), "gui");

        // Both are capable here; retrieval has the higher priority.
        let retrieval = registry.resolve(&defs(&["web_search", "browser_screenshot"]));
        assert_eq!(retrieval.name(), "retrieval");

        // Nothing matches, so the fallback answers.
        let fallback = registry.resolve(&defs(&["read_file"]));
        assert_eq!(fallback.name(), "structured");
    }

    #[test]
    fn resolution_is_deterministic() {
        let registry = EngineRegistry::new()
            .with_engine(Arc::new(GuiEngine))
            .with_engine(Arc::new(RetrievalEngine));
        let tools = defs(&["web_search", "browser_screenshot"]);

        let first = registry.resolve(&tools);
        let second = registry.resolve(&tools);
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn ties_keep_the_earliest_registration() {
        let registry = EngineRegistry::new()
            .with_engine(Arc::new(VocabEngine {
                name: "earlier",
                priority: 7,
                word: "file",
            }))
            .with_engine(Arc::new(VocabEngine {
                name: "later",
                priority: 7,
                word: "file",
            }));

        assert_eq!(registry.resolve(&defs(&["read_file"])).name(), "earlier");
    }

    #[test]
    fn re_registering_a_name_replaces_in_place() {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(VocabEngine {
            name: "router",
            priority: 1,
            word: "file",
        }));
        registry.register(Arc::new(VocabEngine {
            name: "shadow",
            priority: 1,
            word: "file",
        }));
        // Same name again, different behavior.
        registry.register(Arc::new(VocabEngine {
            name: "router",
            priority: 9,
            word: "file",
        }));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["router", "shadow"]);

        // The replacement's priority applies, from the original slot.
        let resolved = registry.resolve(&defs(&["read_file"]));
        assert_eq!(resolved.name(), "router");
        assert_eq!(resolved.priority(), 9);
    }

    #[test]
    fn failing_predicate_is_skipped_not_fatal() {
        let registry = EngineRegistry::new()
            .with_engine(Arc::new(BrokenEngine { priority: 100 }))
            .with_engine(Arc::new(VocabEngine {
                name: "working",
                priority: 1,
                word: "file",
            }));

        assert_eq!(registry.resolve(&defs(&["read_file"])).name(), "working");
    }

    #[test]
    fn all_predicates_failing_falls_back() {
        let registry =
            EngineRegistry::new().with_engine(Arc::new(BrokenEngine { priority: 100 }));
        assert_eq!(registry.resolve(&defs(&["read_file"])).name(), "structured");
    }

    #[test]
    fn empty_registry_resolves_to_fallback() {
        let registry = EngineRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(&defs(&["anything"])).name(), "structured");
    }

    #[test]
    fn empty_tool_set_resolves_to_fallback() {
        let registry = EngineRegistry::new()
            .with_engine(Arc::new(GuiEngine))
            .with_engine(Arc::new(RetrievalEngine));
        assert_eq!(registry.resolve(&[]).name(), "structured");
    }
}
