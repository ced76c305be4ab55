//! Program document resolution.
//!
//! ```json
//! { "tag": "program", "attributes": { "type": "glsl" }, "children": [
//!   { "tag": "define", "attributes": { "name": "USE_FOG", "value": "1" } },
//!   { "tag": "vertex", "attributes": { "file": "glsl/model.vs" }, "children": [
//!     { "tag": "stream", "attributes": { "name": "pos" } },
//!     { "tag": "attrib", "attributes": { "name": "a_uv1", "semantics": "gl_MultiTexCoord1", "if": "USE_AO" } }
//!   ] },
//!   { "tag": "fragment", "attributes": { "file": "glsl/model.fs" }, "children": [
//!     { "tag": "uniform", "attributes": { "name": "baseTex", "loc": "0", "type": "sampler2D" } }
//!   ] }
//! ] }
//! ```

use rustc_hash::FxHashMap;
use umbra_core::errors::{Result, ShaderError};
use umbra_core::interner;
use umbra_core::vfs::VfsPath;
use umbra_resources::{DefineSet, Element, MarkupDocument};

use super::capabilities::ProgramFlavor;
use super::manager::ShaderManager;
use super::preprocessor::Preprocessor;
use super::program::{ProgramDesc, ProgramPtr, StreamFlags, TextureKind, attrib_location};

impl ShaderManager {
    /// Builds, loads and registers a program. Runs on program cache misses.
    pub(super) fn new_program(
        &mut self,
        name: &str,
        base_defines: &DefineSet,
    ) -> Result<ProgramPtr> {
        let document = MarkupDocument::load(self.vfs.as_ref(), &self.settings.program_path(name))?;
        let root = document.root();

        if let Some(schema) = &self.schema {
            schema.validate(name, root)?;
        }

        // Untyped documents are ARB programs.
        let flavor = match root.attr_non_empty("type") {
            Some(ty) => ty.parse()?,
            None => ProgramFlavor::Arb,
        };

        // Document defines apply before any stage content is looked at.
        let mut defines = base_defines.clone();
        for define in root.children_named("define") {
            defines.add(define.attr_or_empty("name"), define.attr_or_empty("value"));
        }
        let preprocessor = Preprocessor::new(&defines);

        let mut desc = ProgramDesc {
            name: interner::intern(name),
            flavor,
            vertex_file: VfsPath::default(),
            fragment_file: VfsPath::default(),
            defines,
            vertex_uniforms: FxHashMap::default(),
            fragment_uniforms: FxHashMap::default(),
            vertex_attribs: FxHashMap::default(),
            stream_flags: StreamFlags::empty(),
        };

        for stage in root.children() {
            match stage.tag() {
                "vertex" => {
                    desc.vertex_file = self.settings.stage_path(stage.attr_or_empty("file"));
                    parse_vertex_params(name, stage, &preprocessor, &mut desc)?;
                }
                "fragment" => {
                    desc.fragment_file = self.settings.stage_path(stage.attr_or_empty("file"));
                    self.parse_fragment_params(name, stage, &preprocessor, &mut desc)?;
                }
                _ => {}
            }
        }

        for (file, stage) in [(&desc.vertex_file, "vertex"), (&desc.fragment_file, "fragment")] {
            if file.is_empty() {
                return Err(ShaderError::Program {
                    name: name.to_string(),
                    reason: format!("no {stage} stage"),
                });
            }
        }

        let program = self.factory.construct(desc, &self.vfs)?;
        program.reload();

        for path in program.file_dependencies() {
            self.hotload.register(&program, path);
        }
        Ok(program)
    }

    fn parse_fragment_params(
        &self,
        name: &str,
        stage: &Element,
        preprocessor: &Preprocessor,
        desc: &mut ProgramDesc,
    ) -> Result<()> {
        for param in stage.children_named("uniform") {
            if !is_enabled(param, preprocessor)? {
                continue;
            }

            let ty = param.attr_or_empty("type");
            let kind = TextureKind::from_sampler_type(ty).ok_or_else(|| {
                ShaderError::Authoring(format!("unknown sampler type '{ty}' in shader '{name}'"))
            })?;
            if !self.capabilities.supports_texture_kind(kind) {
                return Err(ShaderError::Authoring(format!(
                    "{ty} is not supported by the active backend (shader '{name}')"
                )));
            }

            let loc = parse_location(param)?;
            desc.fragment_uniforms
                .insert(interner::intern(param.attr_or_empty("name")), (loc, kind));
        }
        Ok(())
    }
}

fn parse_vertex_params(
    name: &str,
    stage: &Element,
    preprocessor: &Preprocessor,
    desc: &mut ProgramDesc,
) -> Result<()> {
    for param in stage.children() {
        if !is_enabled(param, preprocessor)? {
            continue;
        }

        match param.tag() {
            "uniform" => {
                let loc = parse_location(param)?;
                desc.vertex_uniforms
                    .insert(interner::intern(param.attr_or_empty("name")), loc);
            }
            "stream" => {
                let stream = param.attr_or_empty("name");
                let flag = StreamFlags::from_stream_name(stream).ok_or_else(|| {
                    ShaderError::Authoring(format!("unknown stream '{stream}' in shader '{name}'"))
                })?;
                desc.stream_flags |= flag;
            }
            "attrib" => {
                let semantics = param.attr_or_empty("semantics");
                let loc = attrib_location(semantics).ok_or_else(|| {
                    ShaderError::Authoring(format!(
                        "invalid attribute semantics '{semantics}' in shader '{name}'"
                    ))
                })?;
                desc.vertex_attribs
                    .insert(interner::intern(param.attr_or_empty("name")), loc);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Evaluates the optional `if` predicate of a stage parameter.
fn is_enabled(param: &Element, preprocessor: &Preprocessor) -> Result<bool> {
    match param.attr_non_empty("if") {
        Some(condition) => preprocessor.test_conditional(condition),
        None => Ok(true),
    }
}

fn parse_location(param: &Element) -> Result<u32> {
    let loc = param.attr_or_empty("loc");
    loc.trim().parse().map_err(|_| ShaderError::InvalidToken {
        kind: "uniform location",
        token: loc.to_string(),
    })
}
