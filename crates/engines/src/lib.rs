//! Tool-call engines for Agentkeel — parsing dialects and priority routing.
//!
//! A tool-call engine translates raw model output into structured tool
//! invocations. Each engine owns one parsing dialect, declares which tool
//! sets it understands through a capability predicate, and carries a static
//! priority; the [`EngineRegistry`] picks exactly one engine per iteration
//! and is guaranteed to produce an answer.

pub mod engine;
pub mod gui;
pub mod registry;
pub mod retrieval;
pub mod structured;

pub use engine::{mentions_vocabulary, EngineError, ParsedOutput, ToolCallEngine};
pub use gui::GuiEngine;
pub use registry::EngineRegistry;
pub use retrieval::RetrievalEngine;
pub use structured::StructuredEngine;

use std::sync::Arc;

/// A registry preloaded with every built-in engine.
pub fn default_registry() -> EngineRegistry {
    EngineRegistry::new()
        .with_engine(Arc::new(GuiEngine))
        .with_engine(Arc::new(RetrievalEngine))
}
