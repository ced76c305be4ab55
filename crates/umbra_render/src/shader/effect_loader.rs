//! Effect document resolution.
//!
//! An effect lists candidate techniques in order of preference. The first
//! technique whose `<require>` predicates all hold is used; later candidates
//! are never looked at.
//!
//! Malformed pass state fails the whole effect. A pass program that fails to
//! resolve does not: the pass records the failure (see [`ShaderPass`]).
//!
//! ```json
//! { "tag": "effect", "children": [
//!   { "tag": "technique", "children": [
//!     { "tag": "require", "attributes": { "shaders": "glsl" } },
//!     { "tag": "define", "attributes": { "name": "USE_SHADOW", "value": "1" } },
//!     { "tag": "sort_by_distance" },
//!     { "tag": "pass", "attributes": { "shader": "model" }, "children": [
//!       { "tag": "blend", "attributes": { "src": "SRC_ALPHA", "dst": "ONE_MINUS_SRC_ALPHA" } },
//!       { "tag": "depth", "attributes": { "mask": "false" } }
//!     ] }
//!   ] }
//! ] }
//! ```

use std::sync::Arc;

use log::debug;
use umbra_core::errors::{Result, ShaderError};
use umbra_resources::{DefineSet, Element, MarkupDocument};

use super::capabilities::ProgramFlavor;
use super::manager::ShaderManager;
use super::pass_state::build_pipeline_state;
use super::preprocessor::Preprocessor;
use super::technique::{ShaderPass, ShaderTechnique, TechniquePtr};

impl ShaderManager {
    /// Selects a technique and resolves its passes. Runs on effect cache misses.
    pub(super) fn new_effect(
        &mut self,
        name: &str,
        base_defines: &DefineSet,
    ) -> Result<TechniquePtr> {
        let document = MarkupDocument::load(self.vfs.as_ref(), &self.settings.effect_path(name))?;
        let preprocessor = Preprocessor::new(base_defines);

        let mut chosen = None;
        for (index, candidate) in document.root().children_named("technique").enumerate() {
            if self.is_technique_usable(candidate, &preprocessor)? {
                debug!("Effect '{name}' uses technique {index}");
                chosen = Some(candidate);
                break;
            }
        }
        let technique = chosen.ok_or_else(|| ShaderError::NoUsableTechnique {
            effect: name.to_string(),
        })?;

        // Every technique define is visible to every pass, wherever the
        // <define> sits relative to the <pass> tags.
        let mut technique_defines = base_defines.clone();
        let mut sort_by_distance = false;
        for child in technique.children() {
            match child.tag() {
                "define" => {
                    technique_defines
                        .add(child.attr_or_empty("name"), child.attr_or_empty("value"));
                }
                "sort_by_distance" => sort_by_distance = true,
                _ => {}
            }
        }

        let mut passes = Vec::new();
        for (index, pass) in technique.children_named("pass").enumerate() {
            let pass_error = |source: ShaderError| ShaderError::Pass {
                effect: name.to_string(),
                index,
                source: Box::new(source),
            };

            let mut pass_defines = technique_defines.clone();
            for define in pass.children_named("define") {
                pass_defines.add(define.attr_or_empty("name"), define.attr_or_empty("value"));
            }

            let pipeline_state = build_pipeline_state(pass).map_err(pass_error)?;

            let shader = pass.attr_non_empty("shader").ok_or_else(|| {
                pass_error(ShaderError::Authoring("pass without 'shader' attribute".to_string()))
            })?;
            // A program failure is already logged and cached at program level;
            // the pass keeps it and the technique stays usable.
            let program = self.load_program(shader, &pass_defines);

            passes.push(ShaderPass::new(pipeline_state, program));
        }

        Ok(Arc::new(ShaderTechnique::new(passes, sort_by_distance)))
    }

    /// A technique is usable when every one of its `<require>` tags holds.
    fn is_technique_usable(
        &self,
        technique: &Element,
        preprocessor: &Preprocessor,
    ) -> Result<bool> {
        for require in technique.children_named("require") {
            if let Some(shaders) = require.attr_non_empty("shaders") {
                let flavor: ProgramFlavor = shaders.parse()?;
                if !self.capabilities.is_flavor_usable(flavor) {
                    return Ok(false);
                }
            } else if let Some(context) = require.attr_non_empty("context")
                && !preprocessor.test_conditional(context)?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
