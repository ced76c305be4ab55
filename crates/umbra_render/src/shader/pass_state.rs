//! Pass State Builder
//!
//! Translates the state-override tags of one `<pass>` into a
//! [`GraphicsPipelineStateDesc`]. Every build starts from a copy of the
//! process-wide default; absent tags and attributes leave the default
//! untouched, so overrides are sparse and additive.
//!
//! | Tag         | Attributes                                                   |
//! |-------------|--------------------------------------------------------------|
//! | `<blend>`   | `src`, `dst`, `op`, `constant`                               |
//! | `<color>`   | `mask_red`, `mask_green`, `mask_blue`, `mask_alpha`          |
//! | `<cull>`    | `mode`, `front_face`                                         |
//! | `<depth>`   | `test`, `func`, `mask`                                       |
//! | `<polygon>` | `mode`                                                       |
//! | `<stencil>` | `test`, `reference`, `mask_read`, `mask`, `compare`, `fail`, `pass`, `depth_fail` |
//!
//! Other children of the pass (`<define>`) are handled by the effect loader.

use std::str::FromStr;

use log::error;
use umbra_core::errors::{Result, ShaderError};
use umbra_resources::pipeline_state::{
    BlendConstant, BlendState, ColorWriteMask, CompareOp, DepthStencilState, RasterizationState,
    StencilOp, StencilOpState,
};
use umbra_resources::{Element, GraphicsPipelineStateDesc, default_pipeline_state};

/// Builds the pipeline state of a `<pass>` element.
pub fn build_pipeline_state(pass: &Element) -> Result<GraphicsPipelineStateDesc> {
    let mut desc = *default_pipeline_state();

    for element in pass.children() {
        match element.tag() {
            "blend" => apply_blend(element, &mut desc.blend_state)?,
            "color" => apply_color(element, &mut desc.blend_state)?,
            "cull" => apply_cull(element, &mut desc.rasterization_state)?,
            "depth" => apply_depth(element, &mut desc.depth_stencil_state)?,
            "polygon" => {
                if let Some(mode) = parse_attr(element, "mode")? {
                    desc.rasterization_state.polygon_mode = mode;
                }
            }
            "stencil" => apply_stencil(element, &mut desc.depth_stencil_state)?,
            _ => {}
        }
    }

    Ok(desc)
}

fn apply_blend(element: &Element, blend: &mut BlendState) -> Result<()> {
    blend.enabled = true;

    // One src/dst pair drives both the color and the alpha equation.
    let src = element.attr_or_empty("src").parse()?;
    let dst = element.attr_or_empty("dst").parse()?;
    blend.src_color_blend_factor = src;
    blend.src_alpha_blend_factor = src;
    blend.dst_color_blend_factor = dst;
    blend.dst_alpha_blend_factor = dst;

    if let Some(op) = parse_attr(element, "op")? {
        blend.color_blend_op = op;
        blend.alpha_blend_op = op;
    }

    if let Some(constant) = element.attr_non_empty("constant") {
        match BlendConstant::parse(constant) {
            Some(c) => blend.constant = c,
            None => error!("Failed to parse blend constant: {constant}"),
        }
    }
    Ok(())
}

fn apply_color(element: &Element, blend: &mut BlendState) -> Result<()> {
    let mut mask = ColorWriteMask::empty();
    for (attr, channel) in [
        ("mask_red", ColorWriteMask::RED),
        ("mask_green", ColorWriteMask::GREEN),
        ("mask_blue", ColorWriteMask::BLUE),
        ("mask_alpha", ColorWriteMask::ALPHA),
    ] {
        if parse_bool_attr(element, attr)?.unwrap_or(false) {
            mask |= channel;
        }
    }
    blend.color_write_mask = mask;
    Ok(())
}

fn apply_cull(element: &Element, raster: &mut RasterizationState) -> Result<()> {
    if let Some(mode) = parse_attr(element, "mode")? {
        raster.cull_mode = mode;
    }
    if let Some(front_face) = parse_attr(element, "front_face")? {
        raster.front_face = front_face;
    }
    Ok(())
}

fn apply_depth(element: &Element, ds: &mut DepthStencilState) -> Result<()> {
    if let Some(test) = parse_bool_attr(element, "test")? {
        ds.depth_test_enabled = test;
    }
    if let Some(func) = parse_attr(element, "func")? {
        ds.depth_compare_op = func;
    }
    if let Some(mask) = parse_bool_attr(element, "mask")? {
        ds.depth_write_enabled = mask;
    }
    Ok(())
}

fn apply_stencil(element: &Element, ds: &mut DepthStencilState) -> Result<()> {
    if let Some(test) = parse_bool_attr(element, "test")? {
        ds.stencil_test_enabled = test;
    }
    if let Some(reference) = parse_u32_attr(element, "reference")? {
        ds.stencil_reference = reference;
    }
    if let Some(read_mask) = parse_u32_attr(element, "mask_read")? {
        ds.stencil_read_mask = read_mask;
    }
    if let Some(write_mask) = parse_u32_attr(element, "mask")? {
        ds.stencil_write_mask = write_mask;
    }

    let compare = parse_attr(element, "compare")?;
    let fail = parse_attr(element, "fail")?;
    let pass = parse_attr(element, "pass")?;
    let depth_fail = parse_attr(element, "depth_fail")?;

    // Front and back faces always share their operations.
    for face in [&mut ds.stencil_front_face, &mut ds.stencil_back_face] {
        apply_stencil_face(face, compare, fail, pass, depth_fail);
    }
    Ok(())
}

fn apply_stencil_face(
    face: &mut StencilOpState,
    compare: Option<CompareOp>,
    fail: Option<StencilOp>,
    pass: Option<StencilOp>,
    depth_fail: Option<StencilOp>,
) {
    if let Some(compare) = compare {
        face.compare_op = compare;
    }
    if let Some(fail) = fail {
        face.fail_op = fail;
    }
    if let Some(pass) = pass {
        face.pass_op = pass;
    }
    if let Some(depth_fail) = depth_fail {
        face.depth_fail_op = depth_fail;
    }
}

/// Parses an optional enumeration attribute. Empty counts as absent.
fn parse_attr<T>(element: &Element, name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = ShaderError>,
{
    element.attr_non_empty(name).map(str::parse).transpose()
}

fn parse_bool_attr(element: &Element, name: &str) -> Result<Option<bool>> {
    element.attr_non_empty(name).map(parse_bool).transpose()
}

fn parse_bool(token: &str) -> Result<bool> {
    if token.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if token.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ShaderError::InvalidToken {
            kind: "boolean",
            token: token.to_string(),
        })
    }
}

fn parse_u32_attr(element: &Element, name: &str) -> Result<Option<u32>> {
    element.attr_non_empty(name).map(parse_u32).transpose()
}

fn parse_u32(token: &str) -> Result<u32> {
    let token = token.trim();
    let parsed = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| ShaderError::InvalidToken {
        kind: "stencil value",
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_resources::pipeline_state::{BlendFactor, BlendOp, CullMode, FrontFace, PolygonMode};

    fn pass(children: Vec<Element>) -> Element {
        children
            .into_iter()
            .fold(Element::new("pass").with_attr("shader", "basic"), Element::with_child)
    }

    #[test]
    fn test_empty_pass_is_default() {
        let desc = build_pipeline_state(&pass(vec![])).unwrap();
        assert_eq!(desc, *default_pipeline_state());
    }

    #[test]
    fn test_sparse_depth_override() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("depth").with_attr("test", "FALSE"),
        ]))
        .unwrap();
        let default = default_pipeline_state();

        assert!(!desc.depth_stencil_state.depth_test_enabled);
        assert_eq!(
            desc.depth_stencil_state.depth_compare_op,
            default.depth_stencil_state.depth_compare_op
        );
        assert_eq!(desc.rasterization_state, default.rasterization_state);
        assert_eq!(desc.blend_state, default.blend_state);
        assert_eq!(
            desc.depth_stencil_state.stencil_front_face,
            default.depth_stencil_state.stencil_front_face
        );
    }

    #[test]
    fn test_blend_sets_color_and_alpha() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("blend")
                .with_attr("src", "SRC_ALPHA")
                .with_attr("dst", "ONE_MINUS_SRC_ALPHA")
                .with_attr("op", "MAX")
                .with_attr("constant", "255 255 255 0"),
        ]))
        .unwrap();
        let blend = desc.blend_state;

        assert!(blend.enabled);
        assert_eq!(blend.src_color_blend_factor, BlendFactor::SrcAlpha);
        assert_eq!(blend.src_alpha_blend_factor, BlendFactor::SrcAlpha);
        assert_eq!(blend.dst_color_blend_factor, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.dst_alpha_blend_factor, BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.color_blend_op, BlendOp::Max);
        assert_eq!(blend.alpha_blend_op, BlendOp::Max);
        assert!((blend.constant.r - 1.0).abs() < 1e-6);
        assert!(blend.constant.a.abs() < 1e-6);
    }

    #[test]
    fn test_malformed_blend_constant_is_not_fatal() {
        let _ = env_logger::builder().is_test(true).try_init();
        let desc = build_pipeline_state(&pass(vec![
            Element::new("blend")
                .with_attr("src", "ONE")
                .with_attr("dst", "ONE")
                .with_attr("constant", "red"),
        ]))
        .unwrap();
        assert!(desc.blend_state.enabled);
        assert_eq!(desc.blend_state.constant, default_pipeline_state().blend_state.constant);
    }

    #[test]
    fn test_blend_requires_factors() {
        let err = build_pipeline_state(&pass(vec![Element::new("blend").with_attr("src", "ONE")]))
            .unwrap_err();
        assert!(matches!(err, ShaderError::InvalidToken { kind: "blend factor", .. }));
    }

    #[test]
    fn test_color_mask_resets_all_channels() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("color").with_attr("mask_red", "TRUE").with_attr("mask_alpha", "false"),
        ]))
        .unwrap();
        assert_eq!(desc.blend_state.color_write_mask, ColorWriteMask::RED);

        let desc = build_pipeline_state(&pass(vec![Element::new("color")])).unwrap();
        assert!(desc.blend_state.color_write_mask.is_empty());
    }

    #[test]
    fn test_cull_and_polygon() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("cull").with_attr("mode", "NONE").with_attr("front_face", "CLOCKWISE"),
            Element::new("polygon").with_attr("mode", "LINE"),
        ]))
        .unwrap();
        assert_eq!(desc.rasterization_state.cull_mode, CullMode::None);
        assert_eq!(desc.rasterization_state.front_face, FrontFace::Clockwise);
        assert_eq!(desc.rasterization_state.polygon_mode, PolygonMode::Line);
    }

    #[test]
    fn test_stencil_applies_to_both_faces() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("stencil")
                .with_attr("test", "TRUE")
                .with_attr("reference", "1")
                .with_attr("mask_read", "0x0F")
                .with_attr("mask", "255")
                .with_attr("compare", "EQUAL")
                .with_attr("fail", "ZERO")
                .with_attr("pass", "REPLACE")
                .with_attr("depth_fail", "INVERT"),
        ]))
        .unwrap();
        let ds = desc.depth_stencil_state;

        assert!(ds.stencil_test_enabled);
        assert_eq!(ds.stencil_reference, 1);
        assert_eq!(ds.stencil_read_mask, 0x0F);
        assert_eq!(ds.stencil_write_mask, 255);
        assert_eq!(ds.stencil_front_face, ds.stencil_back_face);
        assert_eq!(ds.stencil_front_face.compare_op, CompareOp::Equal);
        assert_eq!(ds.stencil_front_face.fail_op, StencilOp::Zero);
        assert_eq!(ds.stencil_front_face.pass_op, StencilOp::Replace);
        assert_eq!(ds.stencil_front_face.depth_fail_op, StencilOp::Invert);
    }

    #[test]
    fn test_unknown_tokens_are_errors() {
        let bad_func = pass(vec![Element::new("depth").with_attr("func", "SOMETIMES")]);
        assert!(build_pipeline_state(&bad_func).is_err());

        let bad_bool = pass(vec![Element::new("depth").with_attr("mask", "yes")]);
        assert!(matches!(
            build_pipeline_state(&bad_bool),
            Err(ShaderError::InvalidToken { kind: "boolean", .. })
        ));

        let bad_number = pass(vec![Element::new("stencil").with_attr("reference", "-1")]);
        assert!(build_pipeline_state(&bad_number).is_err());
    }

    #[test]
    fn test_define_children_are_ignored() {
        let desc = build_pipeline_state(&pass(vec![
            Element::new("define").with_attr("name", "A").with_attr("value", "1"),
        ]))
        .unwrap();
        assert_eq!(desc, *default_pipeline_state());
    }
}
