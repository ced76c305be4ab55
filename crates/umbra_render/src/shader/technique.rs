//! Resolved techniques and passes.

use std::sync::Arc;

use umbra_core::errors::{Result, ShaderError};
use umbra_resources::GraphicsPipelineStateDesc;

use super::program::ProgramPtr;

/// One pipeline state paired with one resolved program.
///
/// A pass whose program failed to resolve keeps the failure instead of a
/// handle. The technique stays usable; such a pass draws nothing.
#[derive(Debug, Clone)]
pub struct ShaderPass {
    pub pipeline_state: GraphicsPipelineStateDesc,
    program: Result<ProgramPtr>,
}

impl ShaderPass {
    #[must_use]
    pub fn new(pipeline_state: GraphicsPipelineStateDesc, program: Result<ProgramPtr>) -> Self {
        Self {
            pipeline_state,
            program,
        }
    }

    /// The program to bind, `None` when it failed to resolve.
    #[inline]
    #[must_use]
    pub fn program(&self) -> Option<&ProgramPtr> {
        self.program.as_ref().ok()
    }

    /// Why the program failed to resolve.
    #[inline]
    #[must_use]
    pub fn program_error(&self) -> Option<&ShaderError> {
        self.program.as_ref().err()
    }

    #[inline]
    #[must_use]
    pub fn has_program(&self) -> bool {
        self.program.is_ok()
    }
}

/// A fully resolved rendering strategy: passes run in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ShaderTechnique {
    passes: Vec<ShaderPass>,
    sort_by_distance: bool,
}

pub type TechniquePtr = Arc<ShaderTechnique>;

impl ShaderTechnique {
    #[must_use]
    pub fn new(passes: Vec<ShaderPass>, sort_by_distance: bool) -> Self {
        Self {
            passes,
            sort_by_distance,
        }
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[ShaderPass] {
        &self.passes
    }

    #[inline]
    #[must_use]
    pub fn pass(&self, index: usize) -> Option<&ShaderPass> {
        self.passes.get(index)
    }

    #[inline]
    #[must_use]
    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    /// Whether every pass resolved its program.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.passes.iter().all(ShaderPass::has_program)
    }

    /// Whether draws using this technique are ordered back to front.
    #[inline]
    #[must_use]
    pub fn sort_by_distance(&self) -> bool {
        self.sort_by_distance
    }
}
