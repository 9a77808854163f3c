//! Frame Name Normalizer
//!
//! Maps raw debugger frame identifiers to canonical display names. The
//! canonical name is the node identity in the call graph, so two overloads
//! that only differ in their argument lists fold into one node.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel name for frames whose symbol could not be resolved.
pub const UNKNOWN_FRAME: &str = "<unknown>";

/// Replace any name starting with `prefix` by `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub prefix: String,
    pub alias: String,
}

impl AliasRule {
    pub fn new(prefix: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            alias: alias.into(),
        }
    }
}

/// Rule tables for the normalizer. Loaded once per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Namespace prefixes removed wherever they occur.
    pub strip_prefixes: Vec<String>,
    /// Marker for anonymous namespaces, removed wherever it occurs.
    pub anonymous_marker: Option<String>,
    /// Exact-prefix alias rules, first match wins.
    pub aliases: Vec<AliasRule>,
    /// Name used for frames without symbol information.
    pub unknown_name: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_prefixes: vec!["std::".to_string()],
            anonymous_marker: Some("(anonymous namespace)::".to_string()),
            aliases: Vec::new(),
            unknown_name: UNKNOWN_FRAME.to_string(),
        }
    }
}

impl NormalizerConfig {
    /// Rules used when tracing the Arrow C++ test suite.
    pub fn arrow_profile() -> Self {
        Self {
            strip_prefixes: vec![
                "arrow::".to_string(),
                "engine::".to_string(),
                "std::".to_string(),
            ],
            aliases: vec![AliasRule::new(
                "CheckNotYetImplementedTestCase",
                "CheckNotYetImplementedTestCase",
            )],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizerConfigError {
    #[error("strip prefix #{0} is empty")]
    EmptyPrefix(usize),
    #[error("anonymous namespace marker is empty")]
    EmptyMarker,
    #[error("alias rule #{0} has an empty prefix")]
    EmptyAliasPrefix(usize),
    #[error("unknown frame name is empty")]
    EmptyUnknownName,
    #[error("alias `{alias}` (prefix `{prefix}`) normalizes to `{normalized}`; aliases must already be canonical")]
    UnstableAlias {
        prefix: String,
        alias: String,
        normalized: String,
    },
}

/// Validated normalizer. Construct through [`NameNormalizer::new`].
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    config: NormalizerConfig,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self {
            config: NormalizerConfig::default(),
        }
    }
}

impl NameNormalizer {
    /// Validate the rule tables and build a normalizer.
    ///
    /// Every alias must be a fixed point of the pipeline. Together with the
    /// fact that the strip and parenthesis steps only ever shorten a name,
    /// this makes [`NameNormalizer::normalize`] terminate and idempotent.
    pub fn new(config: NormalizerConfig) -> Result<Self, NormalizerConfigError> {
        if let Some(pos) = config.strip_prefixes.iter().position(|p| p.is_empty()) {
            return Err(NormalizerConfigError::EmptyPrefix(pos));
        }
        if matches!(config.anonymous_marker.as_deref(), Some("")) {
            return Err(NormalizerConfigError::EmptyMarker);
        }
        if let Some(pos) = config.aliases.iter().position(|r| r.prefix.is_empty()) {
            return Err(NormalizerConfigError::EmptyAliasPrefix(pos));
        }
        if config.unknown_name.is_empty() {
            return Err(NormalizerConfigError::EmptyUnknownName);
        }

        let normalizer = Self { config };
        for rule in &normalizer.config.aliases {
            let normalized = normalizer.apply_rules(&rule.alias);
            if normalized != rule.alias {
                return Err(NormalizerConfigError::UnstableAlias {
                    prefix: rule.prefix.clone(),
                    alias: rule.alias.clone(),
                    normalized,
                });
            }
        }
        Ok(normalizer)
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn unknown_name(&self) -> &str {
        &self.config.unknown_name
    }

    /// Canonical name for a raw frame identifier.
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = self.apply_rules(raw);
        loop {
            let next = self.apply_rules(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Canonical name for a frame that may lack symbol information.
    pub fn normalize_frame(&self, raw: Option<&str>) -> String {
        match raw.map(str::trim) {
            Some(name) if !name.is_empty() => self.normalize(name),
            _ => self.config.unknown_name.clone(),
        }
    }

    /// One pass of the fixed pipeline: strip prefixes, strip the anonymous
    /// marker, alias, drop parenthesized spans.
    fn apply_rules(&self, raw: &str) -> String {
        let mut name = raw.to_string();
        for prefix in &self.config.strip_prefixes {
            name = strip_all(&name, prefix);
        }
        if let Some(marker) = &self.config.anonymous_marker {
            name = strip_all(&name, marker);
        }
        if let Some(rule) = self
            .config
            .aliases
            .iter()
            .find(|rule| name.starts_with(&rule.prefix))
        {
            name = rule.alias.clone();
        }
        drop_parenthesized(&name)
    }
}

/// Remove `pattern` until it no longer occurs. A single `replace` can splice
/// a new occurrence together (`"ststd::d::"` with `"std::"`).
fn strip_all(name: &str, pattern: &str) -> String {
    let mut out = name.replace(pattern, "");
    while out.contains(pattern) {
        out = out.replace(pattern, "");
    }
    out
}

/// Keep the segments at even positions when splitting on `(` and `)`.
fn drop_parenthesized(name: &str) -> String {
    name.split(|c| c == '(' || c == ')').step_by(2).collect()
}
