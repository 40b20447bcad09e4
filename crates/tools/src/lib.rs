//! Tool adapters for the finctx engine.
//!
//! Each tool takes JSON arguments carrying the records the caller already
//! fetched, runs the pure core, and returns JSON. Argument problems surface
//! as `ToolError::InvalidArguments`; the core itself never fails.

pub mod args;
pub mod build_evidence;
pub mod financial_context;
pub mod pack_context;

use finctx_config::AppConfig;
use finctx_context::ContextEngine;
use finctx_core::tool::ToolRegistry;
use finctx_evidence::EvidenceBuilder;

pub use build_evidence::BuildEvidenceTool;
pub use financial_context::FinancialContextTool;
pub use pack_context::PackContextTool;

/// Create a registry with every tool on default heuristics.
pub fn default_registry() -> ToolRegistry {
    registry_from_config(&AppConfig::default())
}

/// Create a registry with every tool tuned by `config`.
pub fn registry_from_config(config: &AppConfig) -> ToolRegistry {
    let engine = ContextEngine::from_config(config);
    let builder = EvidenceBuilder::from_config(config);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(PackContextTool::new(engine.clone())));
    registry.register(Box::new(BuildEvidenceTool::new(builder.clone())));
    registry.register(Box::new(FinancialContextTool::new(engine, builder)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_all_tools() {
        let registry = default_registry();
        assert_eq!(
            registry.names(),
            vec!["build_evidence", "financial_context", "pack_context"]
        );
        for definition in registry.definitions() {
            assert_eq!(definition.parameters["type"], "object");
        }
    }
}
