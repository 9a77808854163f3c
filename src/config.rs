//! Session configuration
//!
//! Loaded once from a TOML file (or built-in defaults) and never mutated
//! while a session runs.
//!
//! ```toml
//! [session]
//! mode = "aggregate_only"
//!
//! [normalizer]
//! strip_prefixes = ["arrow::", "std::"]
//! anonymous_marker = "(anonymous namespace)::"
//!
//! [[normalizer.aliases]]
//! prefix = "CheckNotYetImplementedTestCase"
//! alias = "CheckNotYetImplementedTestCase"
//!
//! [table]
//! test_name_depth = 12
//!
//! [graph]
//! name = "array-c-bridge-test"
//! identity = "name"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::CaptureMode;
use crate::domain::callgraph::NodeIdentity;
use crate::domain::highlight::EdgePalette;
use crate::domain::normalize::{NameNormalizer, NormalizerConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionSection,
    pub normalizer: NormalizerConfig,
    pub table: TableSection,
    pub graph: GraphSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub mode: CaptureMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSection {
    /// Test name column reads `frames[len - test_name_depth]`. The default
    /// of 1 names the entry frame, the same on every row; set it to the
    /// depth of the test body below the runner (12 for gtest binaries).
    pub test_name_depth: usize,
}

impl Default for TableSection {
    fn default() -> Self {
        Self { test_name_depth: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    /// Artifact name; derived from the breakpoint location when absent.
    pub name: Option<String>,
    pub identity: NodeIdentity,
    pub highlight_color: String,
    pub base_color: String,
}

impl Default for GraphSection {
    fn default() -> Self {
        let palette = EdgePalette::default();
        Self {
            name: None,
            identity: NodeIdentity::default(),
            highlight_color: palette.highlight,
            base_color: palette.base,
        }
    }
}

impl GraphSection {
    pub fn palette(&self) -> EdgePalette {
        EdgePalette {
            highlight: self.highlight_color.clone(),
            base: self.base_color.clone(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid configuration TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    /// Load `path` if given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.test_name_depth == 0 {
            bail!("table.test_name_depth must be at least 1");
        }
        if self.graph.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            bail!("graph.name must not be empty");
        }
        self.normalizer()?;
        Ok(())
    }

    /// Build the validated normalizer for these rules.
    pub fn normalizer(&self) -> Result<NameNormalizer> {
        NameNormalizer::new(self.normalizer.clone()).context("Invalid normalizer rules")
    }
}
