//! Effective package versions for a unit
//!
//! The evaluator reports what a unit declares; this module decides which
//! version is actually in effect, honouring central version management.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::PackageReference;

/// A package reference as written in the unit's build definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredPackage {
    pub name: String,
    /// Version declared on the reference itself; may be empty.
    #[serde(default)]
    pub version: String,
    /// Per-reference override of the centrally managed version.
    #[serde(default)]
    pub version_override: Option<String>,
}

impl DeclaredPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        DeclaredPackage {
            name: name.into(),
            version: version.into(),
            version_override: None,
        }
    }

    pub fn with_override(mut self, version: impl Into<String>) -> Self {
        self.version_override = Some(version.into());
        self
    }
}

/// Everything the evaluator knows about a unit's package dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDeclarations {
    /// Whether the unit restores external packages at all.
    pub uses_package_references: bool,
    /// Whether versions come from a shared manifest.
    #[serde(default)]
    pub central_management: bool,
    /// Whether a reference may override the central version.
    #[serde(default = "default_true")]
    pub version_override_enabled: bool,
    /// Path of the shared version manifest. Not treated as an input file
    /// while package tracking is on; its effect shows up as version changes.
    #[serde(default)]
    pub central_manifest: Option<PathBuf>,
    #[serde(default)]
    pub references: Vec<DeclaredPackage>,
    /// `(name, version)` entries from the shared manifest.
    #[serde(default)]
    pub central_versions: Vec<(String, String)>,
}

fn default_true() -> bool {
    true
}

impl Default for PackageDeclarations {
    fn default() -> Self {
        PackageDeclarations {
            uses_package_references: false,
            central_management: false,
            version_override_enabled: true,
            central_manifest: None,
            references: Vec::new(),
            central_versions: Vec::new(),
        }
    }
}

impl PackageDeclarations {
    /// Resolve the version in effect for every declared reference.
    pub fn resolve(&self) -> BTreeSet<PackageReference> {
        if !self.uses_package_references {
            return BTreeSet::new();
        }
        self.references
            .iter()
            .map(|reference| PackageReference::new(&reference.name, self.effective_version(reference)))
            .collect()
    }

    fn effective_version<'a>(&'a self, reference: &'a DeclaredPackage) -> &'a str {
        if !self.central_management {
            return &reference.version;
        }
        if self.version_override_enabled {
            if let Some(version) = reference.version_override.as_deref().filter(|v| !v.is_empty()) {
                return version;
            }
        }
        self.central_versions
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&reference.name))
            .map_or(reference.version.as_str(), |(_, version)| version.as_str())
    }
}
