//! Label taxonomy configuration.
//!
//! The taxonomy is read once at startup from a YAML document and is immutable
//! afterwards. A document has this shape:
//!
//! ```yaml
//! repositories:
//!   - acme/widgets
//! labels:
//!   - { name: "waffle:active", color: "0e8a16" }
//! deprecated:
//!   - { from: "waffle:now", to: "waffle:active" }
//!   - { from: "P1" }
//! lifecycle:
//!   - "waffle:active"
//! prefixes:
//!   lifecycle: "waffle:"
//!   legacy_version: "v0."
//! ```
//!
//! When no document is given the taxonomy bundled with the binary is used.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::tracker::RepoRef;

/// Taxonomy shipped with the binary.
const BUNDLED_CONFIG: &str = include_str!("../config/labels.yaml");

/// A label color: six lowercase hex digits, no leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    /// Parse a color, accepting an optional `#` and either case.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidColor` unless the input is six hex digits.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let hex = raw.trim().trim_start_matches('#');
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(hex.to_ascii_lowercase()))
        } else {
            Err(ConfigError::InvalidColor(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a color reported by the tracker is this color.
    #[must_use]
    pub fn matches(&self, remote: &str) -> bool {
        remote.trim_start_matches('#').eq_ignore_ascii_case(&self.0)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub color: Color,
}

impl LabelSpec {
    /// # Errors
    /// Returns `ConfigError::InvalidColor` if `color` is not a hex color.
    pub fn new(name: impl Into<String>, color: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            color: Color::parse(color)?,
        })
    }
}

/// A deprecated label and the label replacing it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Deprecation {
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
}

impl Deprecation {
    #[must_use]
    pub fn replaced(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
        }
    }

    #[must_use]
    pub fn removed(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
        }
    }
}

// Issues are listed by label, and the tracker splits a label query on commas.
fn check_filterable(name: &str) -> Result<(), ConfigError> {
    if name.contains(',') {
        return Err(ConfigError::CommaInFilterLabel(name.to_string()));
    }
    Ok(())
}

/// Reserved name prefixes marking labels for pruning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prefixes {
    /// Namespace of lifecycle-stage labels (e.g. `waffle:`).
    #[serde(default)]
    pub lifecycle: Option<String>,
    /// Prefix of labels left over from an older taxonomy version.
    #[serde(default)]
    pub legacy_version: Option<String>,
}

impl Prefixes {
    /// Configured prefixes, skipping unset and empty ones.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.lifecycle.as_deref(), self.legacy_version.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
    }
}

/// The validated label taxonomy.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    labels: Vec<LabelSpec>,
    deprecated: Vec<Deprecation>,
    lifecycle: Vec<String>,
    prefixes: Prefixes,
}

impl Taxonomy {
    /// Build a taxonomy, checking its consistency rules.
    ///
    /// # Errors
    /// Returns the first violated rule: duplicate label, deprecated label that
    /// is also specified, replacement or lifecycle label that is not
    /// specified, duplicate lifecycle label, or a comma in a deprecated or
    /// lifecycle label.
    pub fn new(
        labels: Vec<LabelSpec>,
        deprecated: Vec<Deprecation>,
        lifecycle: Vec<String>,
        prefixes: Prefixes,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for spec in &labels {
            if !seen.insert(spec.name.to_lowercase()) {
                return Err(ConfigError::DuplicateLabel(spec.name.clone()));
            }
        }

        let taxonomy = Self {
            labels,
            deprecated,
            lifecycle,
            prefixes,
        };

        for entry in &taxonomy.deprecated {
            check_filterable(&entry.from)?;
            if taxonomy.is_specified(&entry.from) {
                return Err(ConfigError::DeprecatedLabelInSpec(entry.from.clone()));
            }
            if let Some(to) = &entry.to {
                if !taxonomy.is_specified(to) {
                    return Err(ConfigError::UnknownReplacement {
                        from: entry.from.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        let mut stages = HashSet::new();
        for stage in &taxonomy.lifecycle {
            check_filterable(stage)?;
            if !taxonomy.is_specified(stage) {
                return Err(ConfigError::UnknownLifecycleLabel(stage.clone()));
            }
            if !stages.insert(stage.to_lowercase()) {
                return Err(ConfigError::DuplicateLifecycleLabel(stage.clone()));
            }
        }

        Ok(taxonomy)
    }

    /// The taxonomy labels, in declaration order.
    #[must_use]
    pub fn labels(&self) -> &[LabelSpec] {
        &self.labels
    }

    /// The deprecation map, in declaration order.
    #[must_use]
    pub fn deprecated(&self) -> &[Deprecation] {
        &self.deprecated
    }

    /// Deprecated labels that have a replacement, as `(from, to)` pairs.
    pub fn replacements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.deprecated
            .iter()
            .filter_map(|d| d.to.as_deref().map(|to| (d.from.as_str(), to)))
    }

    /// Lifecycle-stage labels in canonical order.
    #[must_use]
    pub fn lifecycle(&self) -> &[String] {
        &self.lifecycle
    }

    #[must_use]
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    /// Look up a specified label. Label names compare case-insensitively.
    #[must_use]
    pub fn spec_for(&self, name: &str) -> Option<&LabelSpec> {
        self.labels.iter().find(|s| same_label(&s.name, name))
    }

    #[must_use]
    pub fn is_specified(&self, name: &str) -> bool {
        self.spec_for(name).is_some()
    }

    #[must_use]
    pub fn is_deprecated(&self, name: &str) -> bool {
        self.deprecated.iter().any(|d| same_label(&d.from, name))
    }

    #[must_use]
    pub fn is_lifecycle(&self, name: &str) -> bool {
        self.lifecycle.iter().any(|l| same_label(l, name))
    }
}

/// Label names are case-insensitive on the tracker.
#[must_use]
pub fn same_label(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive prefix test.
#[must_use]
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Full configuration: target repositories plus the taxonomy.
#[derive(Debug, Clone)]
pub struct Config {
    pub repositories: Vec<RepoRef>,
    pub taxonomy: Taxonomy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    repositories: Vec<String>,
    labels: Vec<RawLabel>,
    #[serde(default)]
    deprecated: Vec<Deprecation>,
    #[serde(default)]
    lifecycle: Vec<String>,
    #[serde(default)]
    prefixes: Prefixes,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLabel {
    name: String,
    color: String,
}

impl Config {
    /// The taxonomy bundled with the binary. It names no repositories.
    ///
    /// # Errors
    /// Returns an error only if the bundled document is malformed.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_yaml(BUNDLED_CONFIG)
    }

    /// Parse and validate a YAML configuration document.
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for malformed YAML and the matching
    /// validation error for an inconsistent taxonomy.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents)?;

        let repositories = raw
            .repositories
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<RepoRef>, _>>()?;

        let labels = raw
            .labels
            .into_iter()
            .map(|l| LabelSpec::new(l.name, &l.color))
            .collect::<Result<Vec<_>, _>>()?;

        let taxonomy = Taxonomy::new(labels, raw.deprecated, raw.lifecycle, raw.prefixes)?;

        debug!(
            repositories = repositories.len(),
            labels = taxonomy.labels().len(),
            deprecated = taxonomy.deprecated().len(),
            lifecycle = taxonomy.lifecycle().len(),
            "Loaded label taxonomy"
        );

        Ok(Self {
            repositories,
            taxonomy,
        })
    }

    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`Config::from_yaml`].
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::from_yaml(&contents)
    }

    /// Replace the configured repositories when `repositories` is non-empty.
    #[must_use]
    pub fn with_repositories(mut self, repositories: Vec<RepoRef>) -> Self {
        if !repositories.is_empty() {
            self.repositories = repositories;
        }
        self
    }

    /// # Errors
    /// Returns `ConfigError::NoRepositories` if there is nothing to sync.
    pub fn ensure_repositories(&self) -> Result<(), ConfigError> {
        if self.repositories.is_empty() {
            Err(ConfigError::NoRepositories)
        } else {
            Ok(())
        }
    }
}
