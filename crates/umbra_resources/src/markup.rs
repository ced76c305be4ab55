//! Markup Element Trees
//!
//! Effect and program documents are trees of named elements carrying string
//! attributes. On disk they are stored as JSON:
//!
//! ```json
//! {
//!   "tag": "program",
//!   "attributes": { "type": "glsl" },
//!   "children": [
//!     { "tag": "vertex", "attributes": { "file": "glsl/model.vs" } }
//!   ]
//! }
//! ```
//!
//! `attributes` and `children` may be omitted. Child order is preserved and
//! is significant (techniques and passes are processed in document order).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use umbra_core::errors::{Result, ShaderError};
use umbra_core::vfs::{Vfs, VfsPath};

/// One element of a markup tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Element {
    tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style child appender.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value, if present.
    #[inline]
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns an attribute value, treating an empty string as absent.
    #[inline]
    #[must_use]
    pub fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.is_empty())
    }

    /// Returns an attribute value or `""`.
    #[inline]
    #[must_use]
    pub fn attr_or_empty(&self, name: &str) -> &str {
        self.attr(name).unwrap_or("")
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Serializes the subtree into its compact on-disk form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// A parsed markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupDocument {
    path: VfsPath,
    root: Element,
}

impl MarkupDocument {
    /// Parses a document from text. `path` is used for diagnostics only.
    pub fn parse(path: VfsPath, text: &str) -> Result<Self> {
        let root = serde_json::from_str(text).map_err(|e| ShaderError::DocumentParse {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { path, root })
    }

    /// Reads and parses a document from the virtual filesystem.
    pub fn load(vfs: &dyn Vfs, path: &VfsPath) -> Result<Self> {
        let text = vfs.read_to_string(path)?;
        Self::parse(path.clone(), &text)
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Serializes the tree back into its compact on-disk form.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.root.to_json()
    }
}
