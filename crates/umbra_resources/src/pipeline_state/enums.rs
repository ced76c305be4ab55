//! Enumerations of the pipeline state descriptor and their markup tokens.
//!
//! Every enumeration parses from the upper-case token used in effect
//! documents (`ONE_MINUS_SRC_ALPHA`, `LEQUAL`, ...). Unknown tokens are
//! authoring errors reported when the effect is loaded.

use std::fmt;
use std::str::FromStr;

use umbra_core::errors::ShaderError;

macro_rules! markup_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The markup token of this variant.
            #[must_use]
            pub const fn token(self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ShaderError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok($name::$variant), )+
                    _ => Err(ShaderError::InvalidToken {
                        kind: $kind,
                        token: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

markup_enum! {
    /// A factor in a blend equation.
    BlendFactor, "blend factor" {
        Zero => "ZERO",
        One => "ONE",
        SrcColor => "SRC_COLOR",
        OneMinusSrcColor => "ONE_MINUS_SRC_COLOR",
        DstColor => "DST_COLOR",
        OneMinusDstColor => "ONE_MINUS_DST_COLOR",
        SrcAlpha => "SRC_ALPHA",
        OneMinusSrcAlpha => "ONE_MINUS_SRC_ALPHA",
        DstAlpha => "DST_ALPHA",
        OneMinusDstAlpha => "ONE_MINUS_DST_ALPHA",
        ConstantColor => "CONSTANT_COLOR",
        OneMinusConstantColor => "ONE_MINUS_CONSTANT_COLOR",
        ConstantAlpha => "CONSTANT_ALPHA",
        OneMinusConstantAlpha => "ONE_MINUS_CONSTANT_ALPHA",
        SrcAlphaSaturate => "SRC_ALPHA_SATURATE",
    }
}

markup_enum! {
    /// The operation combining source and destination in a blend equation.
    BlendOp, "blend op" {
        Add => "ADD",
        Subtract => "SUBTRACT",
        ReverseSubtract => "REVERSE_SUBTRACT",
        Min => "MIN",
        Max => "MAX",
    }
}

markup_enum! {
    /// The comparison used by depth and stencil tests.
    CompareOp, "compare op" {
        Never => "NEVER",
        Less => "LESS",
        Equal => "EQUAL",
        LessOrEqual => "LEQUAL",
        Greater => "GREATER",
        NotEqual => "NOT_EQUAL",
        GreaterOrEqual => "GEQUAL",
        Always => "ALWAYS",
    }
}

markup_enum! {
    /// An operation applied to a stencil buffer value.
    StencilOp, "stencil op" {
        Keep => "KEEP",
        Zero => "ZERO",
        Replace => "REPLACE",
        IncrementAndClamp => "INCREMENT_AND_CLAMP",
        DecrementAndClamp => "DECREMENT_AND_CLAMP",
        Invert => "INVERT",
        IncrementAndWrap => "INCREMENT_AND_WRAP",
        DecrementAndWrap => "DECREMENT_AND_WRAP",
    }
}

markup_enum! {
    /// Which faces are culled.
    CullMode, "cull mode" {
        None => "NONE",
        Front => "FRONT",
        Back => "BACK",
    }
}

markup_enum! {
    /// Winding order of front-facing triangles.
    FrontFace, "front face" {
        CounterClockwise => "COUNTER_CLOCKWISE",
        Clockwise => "CLOCKWISE",
    }
}

markup_enum! {
    /// How polygons are rasterized.
    PolygonMode, "polygon mode" {
        Fill => "FILL",
        Line => "LINE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_parse_back() {
        for &factor in BlendFactor::ALL {
            assert_eq!(factor.token().parse::<BlendFactor>(), Ok(factor));
        }
        for &op in StencilOp::ALL {
            assert_eq!(op.token().parse::<StencilOp>(), Ok(op));
        }
    }

    #[test]
    fn test_unknown_token() {
        let err = "LESS_OR_EQUAL".parse::<CompareOp>().unwrap_err();
        assert_eq!(
            err,
            ShaderError::InvalidToken {
                kind: "compare op",
                token: "LESS_OR_EQUAL".to_string()
            }
        );
        assert!("back".parse::<CullMode>().is_err());
    }
}
