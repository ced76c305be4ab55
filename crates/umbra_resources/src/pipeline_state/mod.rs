//! Graphics Pipeline State Descriptors
//!
//! Backend-agnostic description of the fixed-function state of one pass:
//! blending, rasterization and depth/stencil testing.
//!
//! Every pass starts from the engine-wide default returned by
//! [`default_pipeline_state`]. The default is built once per process and only
//! ever copied; markup overrides are applied to the copy.

mod enums;

use std::sync::OnceLock;

use bitflags::bitflags;
use umbra_core::errors::{Result, ShaderError};

pub use enums::{BlendFactor, BlendOp, CompareOp, CullMode, FrontFace, PolygonMode, StencilOp};

bitflags! {
    /// Which color channels a pass writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const RED = 0b0001;
        const GREEN = 0b0010;
        const BLUE = 0b0100;
        const ALPHA = 0b1000;
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Constant blend color, normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlendConstant {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl BlendConstant {
    /// Parses `"r g b [a]"` with components in `0..=255`.
    ///
    /// Alpha defaults to 255. Returns `None` for anything else.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let components = s
            .split_whitespace()
            .map(|c| c.parse::<f32>().ok().filter(|v| (0.0..=255.0).contains(v)))
            .collect::<Option<Vec<_>>>()?;

        let (r, g, b, a) = match components.as_slice() {
            [r, g, b] => (*r, *g, *b, 255.0),
            [r, g, b, a] => (*r, *g, *b, *a),
            _ => return None,
        };
        Some(Self {
            r: r / 255.0,
            g: g / 255.0,
            b: b / 255.0,
            a: a / 255.0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub enabled: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub constant: BlendConstant,
    pub color_write_mask: ColorWriteMask,
}

/// Stencil operations for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enabled: bool,
    pub depth_compare_op: CompareOp,
    pub depth_write_enabled: bool,
    pub stencil_test_enabled: bool,
    pub stencil_read_mask: u32,
    pub stencil_write_mask: u32,
    pub stencil_reference: u32,
    pub stencil_front_face: StencilOpState,
    pub stencil_back_face: StencilOpState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizationState {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}

/// Aggregate fixed-function state of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsPipelineStateDesc {
    pub depth_stencil_state: DepthStencilState,
    pub blend_state: BlendState,
    pub rasterization_state: RasterizationState,
}

impl GraphicsPipelineStateDesc {
    /// The built-in engine default.
    #[must_use]
    pub const fn engine_default() -> Self {
        let stencil_face = StencilOpState {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
        };
        Self {
            depth_stencil_state: DepthStencilState {
                depth_test_enabled: true,
                depth_compare_op: CompareOp::LessOrEqual,
                depth_write_enabled: true,
                stencil_test_enabled: false,
                stencil_read_mask: 0xFF,
                stencil_write_mask: 0xFF,
                stencil_reference: 0,
                stencil_front_face: stencil_face,
                stencil_back_face: stencil_face,
            },
            blend_state: BlendState {
                enabled: false,
                src_color_blend_factor: BlendFactor::One,
                dst_color_blend_factor: BlendFactor::Zero,
                color_blend_op: BlendOp::Add,
                src_alpha_blend_factor: BlendFactor::One,
                dst_alpha_blend_factor: BlendFactor::Zero,
                alpha_blend_op: BlendOp::Add,
                constant: BlendConstant {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    a: 0.0,
                },
                color_write_mask: ColorWriteMask::ALL,
            },
            rasterization_state: RasterizationState {
                polygon_mode: PolygonMode::Fill,
                cull_mode: CullMode::Back,
                front_face: FrontFace::CounterClockwise,
            },
        }
    }
}

impl Default for GraphicsPipelineStateDesc {
    /// A copy of the process-wide default.
    fn default() -> Self {
        *default_pipeline_state()
    }
}

static DEFAULT_PIPELINE_STATE: OnceLock<GraphicsPipelineStateDesc> = OnceLock::new();

/// The process-wide default every pass state is built from.
///
/// Initialized with [`GraphicsPipelineStateDesc::engine_default`] on first use
/// unless [`set_default_pipeline_state`] ran earlier.
pub fn default_pipeline_state() -> &'static GraphicsPipelineStateDesc {
    DEFAULT_PIPELINE_STATE.get_or_init(GraphicsPipelineStateDesc::engine_default)
}

/// Installs the process-wide default. Must run at startup, before any effect
/// is loaded; fails once the default has been fixed.
pub fn set_default_pipeline_state(desc: GraphicsPipelineStateDesc) -> Result<()> {
    DEFAULT_PIPELINE_STATE
        .set(desc)
        .map_err(|_| ShaderError::DefaultStateAlreadySet)
}
