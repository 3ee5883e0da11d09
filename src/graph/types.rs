//! Core graph types
//!
//! The value types shared by the store, the builder and the wire format:
//! package identities, per-node metadata and the package-manager descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A package identity: name plus optional version, compared by value.
///
/// Used as the query key for all package-addressed operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pkg {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Pkg {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    pub fn without_version(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Canonical package id: `name@version`, with an empty version string
    /// when the package has no version.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version.as_deref().unwrap_or(""))
    }
}

/// A package plus its optional metadata (e.g. a package-URL string).
///
/// Immutable after graph construction. The `purl` is carried as opaque
/// metadata; this crate does not validate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

impl PkgInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            purl: None,
        }
    }

    pub fn pkg(&self) -> Pkg {
        Pkg {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    pub fn id(&self) -> String {
        self.pkg().id()
    }
}

impl From<&PkgInfo> for Pkg {
    fn from(info: &PkgInfo) -> Self {
        info.pkg()
    }
}

/// Where a node's version assignment came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProvenance {
    #[serde(rename = "type")]
    pub provenance_type: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<VersionProvenanceProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProvenanceProperty {
    pub name: String,
}

/// Free-form metadata attached to one node instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_provenance: Option<VersionProvenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

impl NodeInfo {
    pub fn with_labels(labels: BTreeMap<String, String>) -> Self {
        Self {
            version_provenance: None,
            labels: Some(labels),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.version_provenance.is_none()
            && self.labels.as_ref().is_none_or(BTreeMap::is_empty)
    }

    /// Collapse `Some(empty)` into `None` so that "no info" compares and
    /// serializes identically however it was produced.
    pub fn normalized(mut info: Option<NodeInfo>) -> Option<NodeInfo> {
        if let Some(inner) = info.as_mut()
            && inner.labels.as_ref().is_some_and(BTreeMap::is_empty)
        {
            inner.labels = None;
        }
        info.filter(|inner| !inner.is_empty())
    }
}

/// The package manager that produced a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgManager {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<Repository>>,
}

impl PkgManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            repositories: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub alias: String,
}
