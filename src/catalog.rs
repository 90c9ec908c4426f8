//! Shared tool catalog.
//!
//! Built once from the registry at startup. Every adapter reads names,
//! descriptions and parameter schemas from here, so they cannot drift.

use serde::Serialize;

use crate::schema::ParametersSchema;
use crate::tools::ToolRegistry;
use crate::types::ToolName;

/// Description used when a tool has none.
pub const DEFAULT_DESCRIPTION: &str = "Facebook Ads tool";

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: ToolName,
    pub description: String,
    pub parameters: ParametersSchema,
}

/// Name and description only, as served by `GET /tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSummary<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    pub fn from_registry(registry: &ToolRegistry) -> Self {
        let entries = registry
            .handlers()
            .map(|handler| {
                let description = handler.description().trim();
                CatalogEntry {
                    name: ToolName::new(handler.name()),
                    description: if description.is_empty() {
                        DEFAULT_DESCRIPTION.to_string()
                    } else {
                        description.to_string()
                    },
                    parameters: handler.parameters(),
                }
            })
            .collect();
        Self { entries }
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn summaries(&self) -> Vec<ToolSummary<'_>> {
        self.entries
            .iter()
            .map(|e| ToolSummary {
                name: e.name.as_str(),
                description: &e.description,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Confirm the catalog and the registry name exactly the same tools, in
    /// the same order.
    pub fn verify_registry(&self, registry: &ToolRegistry) -> anyhow::Result<()> {
        let catalog_names: Vec<&str> = self.entries.iter().map(|e| e.name.as_str()).collect();
        let registry_names = registry.list_names();
        let registry_names: Vec<&str> = registry_names.iter().map(ToolName::as_str).collect();

        if catalog_names != registry_names {
            anyhow::bail!(
                "tool catalog [{}] does not match registry [{}]",
                catalog_names.join(", "),
                registry_names.join(", ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::EchoTool;

    #[test]
    fn test_catalog_mirrors_registry() {
        let registry = ToolRegistry::new()
            .register_handler(EchoTool { name: "b" })
            .register_handler(EchoTool { name: "a" });
        let catalog = ToolCatalog::from_registry(&registry);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].name.as_str(), "b");
        assert_eq!(catalog.entries()[1].description, "Echo the arguments back");
        assert!(catalog.verify_registry(&registry).is_ok());
    }

    #[test]
    fn test_verify_detects_drift() {
        let registry = ToolRegistry::new().register_handler(EchoTool { name: "a" });
        let catalog = ToolCatalog::from_registry(&registry);

        let grown = registry.register_handler(EchoTool { name: "c" });
        let err = catalog.verify_registry(&grown).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }
}
