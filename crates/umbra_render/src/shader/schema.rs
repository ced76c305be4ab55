//! Document grammars.
//!
//! Program documents are checked against a [`Schema`] before any of their
//! content is trusted. A schema lists, per element tag, the attributes that
//! must or may appear and the child tags that may appear.
//!
//! Schemas are plain serde data, so a project can ship its own grammar as a
//! JSON file next to its shaders:
//!
//! ```json
//! {
//!   "root": "program",
//!   "elements": {
//!     "program": { "required": ["type"], "children": ["define", "vertex", "fragment"] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use umbra_core::errors::{Result, ShaderError};
use umbra_resources::Element;

/// Attribute and content rules for one element tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementRule {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub children: Vec<String>,
}

impl ElementRule {
    fn new(required: &[&str], optional: &[&str], children: &[&str]) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            required: owned(required),
            optional: owned(optional),
            children: owned(children),
        }
    }

    fn allows_attribute(&self, name: &str) -> bool {
        self.required.iter().chain(&self.optional).any(|a| a == name)
    }
}

/// A grammar over markup element trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub root: String,
    pub elements: BTreeMap<String, ElementRule>,
}

impl Schema {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ShaderError::DocumentParse {
            path: "<schema>".to_string(),
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// The built-in grammar of program documents.
    #[must_use]
    pub fn program() -> Self {
        let mut elements = BTreeMap::new();
        elements.insert(
            "program".to_string(),
            ElementRule::new(&["type"], &[], &["define", "vertex", "fragment"]),
        );
        elements.insert("define".to_string(), ElementRule::new(&["name", "value"], &[], &[]));
        elements.insert(
            "vertex".to_string(),
            ElementRule::new(&["file"], &[], &["uniform", "stream", "attrib"]),
        );
        elements.insert(
            "fragment".to_string(),
            ElementRule::new(&["file"], &[], &["uniform"]),
        );
        // Vertex and fragment uniforms share one rule; `type` only matters
        // for fragment samplers.
        elements.insert(
            "uniform".to_string(),
            ElementRule::new(&["name", "loc"], &["type", "if"], &[]),
        );
        elements.insert("stream".to_string(), ElementRule::new(&["name"], &["if"], &[]));
        elements.insert(
            "attrib".to_string(),
            ElementRule::new(&["name", "semantics"], &["if"], &[]),
        );

        Self {
            root: "program".to_string(),
            elements,
        }
    }

    /// Checks a document tree; `name` is used in diagnostics.
    pub fn validate(&self, name: &str, root: &Element) -> Result<()> {
        if root.tag() != self.root {
            return Err(ShaderError::Validation {
                name: name.to_string(),
                reason: format!("expected root <{}>, found <{}>", self.root, root.tag()),
            });
        }
        self.validate_element(root)
            .map_err(|reason| ShaderError::Validation {
                name: name.to_string(),
                reason,
            })
    }

    fn validate_element(&self, element: &Element) -> std::result::Result<(), String> {
        let tag = element.tag();
        let Some(rule) = self.elements.get(tag) else {
            return Err(format!("unknown element <{tag}>"));
        };

        for required in &rule.required {
            if element.attr(required).is_none() {
                return Err(format!("<{tag}> is missing attribute '{required}'"));
            }
        }
        for (attr, _) in element.attributes() {
            if !rule.allows_attribute(attr) {
                return Err(format!("<{tag}> does not allow attribute '{attr}'"));
            }
        }
        for child in element.children() {
            if !rule.children.iter().any(|c| c == child.tag()) {
                return Err(format!("<{tag}> does not allow child <{}>", child.tag()));
            }
            self.validate_element(child)?;
        }
        Ok(())
    }
}
