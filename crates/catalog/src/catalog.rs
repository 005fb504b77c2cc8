//! Tool catalog loaded from TOML.

use crate::{Error, Result, ToolConfig};
use serde::Deserialize;
use std::path::Path;

/// On-disk catalog layout: a `[[tools]]` array.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tools: Vec<ToolConfig>,
}

/// The set of configured tools, keyed by unique id.
///
/// Entries are never mutated once added.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tools: Vec<ToolConfig>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a catalog from a TOML string.
    ///
    /// Every entry is validated and ids must be unique.
    pub fn parse(toml: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        let mut catalog = Self::new();
        for tool in file.tools {
            catalog.add(tool)?;
        }
        Ok(catalog)
    }

    /// All tools, in insertion order.
    pub fn list(&self) -> &[ToolConfig] {
        &self.tools
    }

    /// Get a tool by id.
    pub fn get(&self, id: &str) -> Option<&ToolConfig> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Register a tool. Rejects duplicate ids and invalid configs.
    pub fn add(&mut self, config: ToolConfig) -> Result<()> {
        config.validate()?;
        if self.get(&config.id).is_some() {
            return Err(Error::DuplicateTool(config.id));
        }
        self.tools.push(config);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
