//! Shader Programs
//!
//! A program is one vertex + fragment pairing resolved from a program
//! document under a specific define set. Programs are shared: the program
//! cache owns them through [`ProgramPtr`], passes of cached techniques hold
//! further strong references, and the hotload tracker observes them weakly.
//!
//! Compilation mechanics belong to the backend behind [`ProgramFactory`].
//! [`SourceProgram`] is the default backend: it assembles final stage
//! sources and records every file read, which is what the hotload tracker
//! needs. `#include`s are resolved for both flavors. GLSL sources get a
//! `#define` block for the driver's preprocessor; ARB assembly has none, so
//! its conditional blocks are resolved against the defines at assembly time.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, error};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use umbra_core::errors::{Result, ShaderError};
use umbra_core::interner::Symbol;
use umbra_core::vfs::{Vfs, VfsPath};
use umbra_resources::DefineSet;
use xxhash_rust::xxh3::xxh3_128;

use super::capabilities::ProgramFlavor;
use super::preprocessor::Preprocessor;

bitflags! {
    /// Vertex streams consumed by a program.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StreamFlags: u16 {
        const POS = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
        const UV0 = 1 << 3;
        const UV1 = 1 << 4;
        const UV2 = 1 << 5;
        const UV3 = 1 << 6;
        const UV4 = 1 << 7;
        const UV5 = 1 << 8;
        const UV6 = 1 << 9;
        const UV7 = 1 << 10;
    }
}

impl StreamFlags {
    /// Maps a `<stream name="...">` value to its flag.
    #[must_use]
    pub fn from_stream_name(name: &str) -> Option<Self> {
        Some(match name {
            "pos" => Self::POS,
            "normal" => Self::NORMAL,
            "color" => Self::COLOR,
            "uv0" => Self::UV0,
            "uv1" => Self::UV1,
            "uv2" => Self::UV2,
            "uv3" => Self::UV3,
            "uv4" => Self::UV4,
            "uv5" => Self::UV5,
            "uv6" => Self::UV6,
            "uv7" => Self::UV7,
            _ => return None,
        })
    }
}

/// Dimensionality of a fragment sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Tex1D,
    Tex2D,
    Tex3D,
    Cube,
}

impl TextureKind {
    /// Maps a sampler type string. Shadow and rect samplers are 2D; an absent
    /// type defaults to 2D.
    #[must_use]
    pub fn from_sampler_type(ty: &str) -> Option<Self> {
        Some(match ty {
            "sampler1D" => Self::Tex1D,
            "" | "sampler2D" | "sampler2DShadow" | "sampler2DRect" => Self::Tex2D,
            "sampler3D" => Self::Tex3D,
            "samplerCube" => Self::Cube,
            _ => return None,
        })
    }
}

/// Fixed binding slot of a vertex attribute semantic.
///
/// Standard semantics follow the conventional generic-attribute aliasing;
/// three custom slots fill the gaps that no standard semantic occupies.
#[must_use]
pub fn attrib_location(semantics: &str) -> Option<u32> {
    Some(match semantics {
        "gl_Vertex" => 0,
        "gl_Normal" => 2,
        "gl_Color" => 3,
        "gl_SecondaryColor" => 4,
        "gl_FogCoord" => 5,
        "gl_MultiTexCoord0" => 8,
        "gl_MultiTexCoord1" => 9,
        "gl_MultiTexCoord2" => 10,
        "gl_MultiTexCoord3" => 11,
        "gl_MultiTexCoord4" => 12,
        "gl_MultiTexCoord5" => 13,
        "gl_MultiTexCoord6" => 14,
        "gl_MultiTexCoord7" => 15,

        "CustomAttribute0" => 1,
        "CustomAttribute1" => 6,
        "CustomAttribute2" => 7,
        _ => return None,
    })
}

/// Everything a backend needs to build a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDesc {
    pub name: Symbol,
    pub flavor: ProgramFlavor,
    pub vertex_file: VfsPath,
    pub fragment_file: VfsPath,
    /// Caller defines merged with the document's own `<define>`s.
    pub defines: DefineSet,
    pub vertex_uniforms: FxHashMap<Symbol, u32>,
    pub fragment_uniforms: FxHashMap<Symbol, (u32, TextureKind)>,
    pub vertex_attribs: FxHashMap<Symbol, u32>,
    pub stream_flags: StreamFlags,
}

/// A compiled (or compilable) vertex + fragment program.
pub trait ShaderProgram: Send + Sync + fmt::Debug {
    fn desc(&self) -> &ProgramDesc;

    /// Re-reads the sources and rebuilds the program in place.
    ///
    /// Failures are logged and leave the program invalid; cached handles stay
    /// usable and a later reload may repair it.
    fn reload(&self);

    fn is_valid(&self) -> bool;

    /// Every file the last reload read (or tried to read).
    fn file_dependencies(&self) -> Vec<VfsPath>;
}

pub type ProgramPtr = Arc<dyn ShaderProgram>;

/// Builds programs for a backend.
pub trait ProgramFactory: Send + Sync {
    fn construct(&self, desc: ProgramDesc, vfs: &Arc<dyn Vfs>) -> Result<ProgramPtr>;
}

// ─── SourceProgram ────────────────────────────────────────────────────────────

const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Debug, Default)]
struct SourceState {
    vertex_source: String,
    fragment_source: String,
    source_hash: u128,
    dependencies: Vec<VfsPath>,
    valid: bool,
    reload_count: u64,
}

/// Default backend program: final stage sources assembled from the VFS.
pub struct SourceProgram {
    desc: ProgramDesc,
    vfs: Arc<dyn Vfs>,
    state: RwLock<SourceState>,
}

impl fmt::Debug for SourceProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("SourceProgram")
            .field("vertex_file", &self.desc.vertex_file)
            .field("fragment_file", &self.desc.fragment_file)
            .field("defines", &self.desc.defines.to_string())
            .field("valid", &state.valid)
            .field("reload_count", &state.reload_count)
            .finish_non_exhaustive()
    }
}

impl SourceProgram {
    /// Creates an unloaded program; call [`ShaderProgram::reload`] to build it.
    #[must_use]
    pub fn new(desc: ProgramDesc, vfs: Arc<dyn Vfs>) -> Self {
        Self {
            desc,
            vfs,
            state: RwLock::new(SourceState::default()),
        }
    }

    #[must_use]
    pub fn vertex_source(&self) -> String {
        self.state.read().vertex_source.clone()
    }

    #[must_use]
    pub fn fragment_source(&self) -> String {
        self.state.read().fragment_source.clone()
    }

    /// xxh3-128 of both final stage sources.
    #[must_use]
    pub fn source_hash(&self) -> u128 {
        self.state.read().source_hash
    }

    #[must_use]
    pub fn reload_count(&self) -> u64 {
        self.state.read().reload_count
    }

    fn define_block(&self) -> String {
        self.desc
            .defines
            .to_map()
            .into_iter()
            .map(|(name, value)| format!("#define {name} {value}\n"))
            .collect()
    }

    /// Builds the final source of one stage, collecting every file read.
    fn assemble_stage(&self, file: &VfsPath, deps: &mut Vec<VfsPath>) -> Result<String> {
        let mut body = String::new();
        let mut included = FxHashSet::default();
        self.expand_includes(file, &mut body, &mut included, deps, 0)?;

        if self.desc.flavor == ProgramFlavor::Arb {
            return Preprocessor::new(&self.desc.defines).resolve_conditionals(&body);
        }

        // `#version` has to stay the first directive.
        let (version, rest) = match body.split_once('\n') {
            Some((first, rest)) if first.trim_start().starts_with("#version") => {
                (format!("{first}\n"), rest)
            }
            _ => (String::new(), body.as_str()),
        };
        Ok(format!("{version}{}{rest}", self.define_block()))
    }

    fn expand_includes(
        &self,
        file: &VfsPath,
        out: &mut String,
        included: &mut FxHashSet<VfsPath>,
        deps: &mut Vec<VfsPath>,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(ShaderError::Program {
                name: umbra_core::interner::resolve(self.desc.name).to_string(),
                reason: format!("include depth exceeded at '{file}'"),
            });
        }
        if !included.insert(file.clone()) {
            return Ok(());
        }
        if !deps.contains(file) {
            deps.push(file.clone());
        }

        let source = self.vfs.read_to_string(file)?;
        for line in source.lines() {
            if let Some(target) = parse_include(line) {
                let target = file.parent().join(target);
                self.expand_includes(&target, out, included, deps, depth + 1)?;
            } else {
                out.push_str(line);
                out.push('\n');
            }
        }
        Ok(())
    }
}

/// Returns the path of an `#include "path"` directive.
fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}

impl ShaderProgram for SourceProgram {
    fn desc(&self) -> &ProgramDesc {
        &self.desc
    }

    fn reload(&self) {
        let mut deps = Vec::new();
        let vertex = self.assemble_stage(&self.desc.vertex_file, &mut deps);
        let fragment = self.assemble_stage(&self.desc.fragment_file, &mut deps);
        for stage in [&self.desc.vertex_file, &self.desc.fragment_file] {
            if !deps.contains(stage) {
                deps.push(stage.clone());
            }
        }

        let mut state = self.state.write();
        state.reload_count += 1;
        state.dependencies = deps;

        match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => {
                let mut combined = Vec::with_capacity(vertex.len() + fragment.len() + 1);
                combined.extend_from_slice(vertex.as_bytes());
                combined.push(0);
                combined.extend_from_slice(fragment.as_bytes());
                state.source_hash = xxh3_128(&combined);
                state.vertex_source = vertex;
                state.fragment_source = fragment;
                state.valid = true;
                debug!(
                    "Built program {} + {} {}",
                    self.desc.vertex_file, self.desc.fragment_file, self.desc.defines
                );
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(
                    "Failed to build program {} + {}: {e}",
                    self.desc.vertex_file, self.desc.fragment_file
                );
                state.valid = false;
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.state.read().valid
    }

    fn file_dependencies(&self) -> Vec<VfsPath> {
        self.state.read().dependencies.clone()
    }
}

/// Factory producing [`SourceProgram`]s; the flavor of the description
/// selects how stage sources are assembled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceProgramFactory;

impl ProgramFactory for SourceProgramFactory {
    fn construct(&self, desc: ProgramDesc, vfs: &Arc<dyn Vfs>) -> Result<ProgramPtr> {
        Ok(Arc::new(SourceProgram::new(desc, Arc::clone(vfs))))
    }
}
