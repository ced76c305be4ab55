//! # Umbra Resources
//!
//! Plain data definitions shared by the resolution engine:
//!
//! - [`shader_defines`]: the [`DefineSet`] used by conditionals and cache keys
//! - [`pipeline_state`]: the [`GraphicsPipelineStateDesc`] of one pass
//! - [`markup`]: the attribute-queryable [`Element`] tree of effect/program documents

pub mod markup;
pub mod pipeline_state;
pub mod shader_defines;

pub use markup::{Element, MarkupDocument};
pub use pipeline_state::{
    GraphicsPipelineStateDesc, default_pipeline_state, set_default_pipeline_state,
};
pub use shader_defines::DefineSet;
