//! Rendering backend capabilities.
//!
//! The only live-environment input to technique selection: which program
//! flavor the active backend runs, whether the device supports it, and which
//! sampler dimensionalities are available.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use umbra_core::errors::ShaderError;

use super::program::TextureKind;

/// The program backend flavor declared by a program document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramFlavor {
    /// High-level GLSL programs with named vertex attributes.
    #[default]
    Glsl,
    /// Low-level ARB assembly programs with numbered uniforms.
    Arb,
}

impl FromStr for ProgramFlavor {
    type Err = ShaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glsl" => Ok(Self::Glsl),
            "arb" => Ok(Self::Arb),
            _ => Err(ShaderError::InvalidToken {
                kind: "program flavor",
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProgramFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Glsl => "glsl",
            Self::Arb => "arb",
        })
    }
}

/// Capability queries answered by the active rendering backend.
pub trait RenderCapabilities: Send + Sync {
    /// The flavor of the backend currently in use.
    fn active_flavor(&self) -> ProgramFlavor;

    /// Whether the device can run programs of `flavor`.
    fn supports_flavor(&self, flavor: ProgramFlavor) -> bool;

    /// Whether samplers of `kind` are available.
    fn supports_texture_kind(&self, kind: TextureKind) -> bool {
        let _ = kind;
        true
    }

    /// A technique requiring `flavor` is usable only when that flavor is both
    /// active and supported.
    fn is_flavor_usable(&self, flavor: ProgramFlavor) -> bool {
        self.active_flavor() == flavor && self.supports_flavor(flavor)
    }
}

/// Fixed capability set, for headless use and tests.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCapabilities {
    pub active_flavor: ProgramFlavor,
    pub glsl_supported: bool,
    pub arb_supported: bool,
    pub texture_1d: bool,
    pub texture_3d: bool,
}

impl Default for StaticCapabilities {
    fn default() -> Self {
        Self {
            active_flavor: ProgramFlavor::Glsl,
            glsl_supported: true,
            arb_supported: false,
            texture_1d: true,
            texture_3d: true,
        }
    }
}

impl StaticCapabilities {
    /// A GL backend running `flavor`, supported by the device.
    #[must_use]
    pub fn with_flavor(flavor: ProgramFlavor) -> Self {
        Self {
            active_flavor: flavor,
            glsl_supported: true,
            arb_supported: flavor == ProgramFlavor::Arb,
            ..Self::default()
        }
    }

    /// An embedded-class backend without 1D and 3D textures.
    #[must_use]
    pub fn constrained() -> Self {
        Self {
            texture_1d: false,
            texture_3d: false,
            ..Self::default()
        }
    }
}

impl RenderCapabilities for StaticCapabilities {
    fn active_flavor(&self) -> ProgramFlavor {
        self.active_flavor
    }

    fn supports_flavor(&self, flavor: ProgramFlavor) -> bool {
        match flavor {
            ProgramFlavor::Glsl => self.glsl_supported,
            ProgramFlavor::Arb => self.arb_supported,
        }
    }

    fn supports_texture_kind(&self, kind: TextureKind) -> bool {
        match kind {
            TextureKind::Tex1D => self.texture_1d,
            TextureKind::Tex3D => self.texture_3d,
            TextureKind::Tex2D | TextureKind::Cube => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_usable_requires_active_and_supported() {
        let caps = StaticCapabilities::default();
        assert!(caps.is_flavor_usable(ProgramFlavor::Glsl));
        assert!(!caps.is_flavor_usable(ProgramFlavor::Arb));

        let arb_unsupported = StaticCapabilities {
            active_flavor: ProgramFlavor::Arb,
            arb_supported: false,
            ..StaticCapabilities::default()
        };
        assert!(!arb_unsupported.is_flavor_usable(ProgramFlavor::Arb));
        let arb = StaticCapabilities::with_flavor(ProgramFlavor::Arb);
        assert!(arb.is_flavor_usable(ProgramFlavor::Arb));
    }

    #[test]
    fn test_flavor_tokens() {
        assert_eq!("glsl".parse::<ProgramFlavor>(), Ok(ProgramFlavor::Glsl));
        assert_eq!("arb".parse::<ProgramFlavor>(), Ok(ProgramFlavor::Arb));
        assert!("hlsl".parse::<ProgramFlavor>().is_err());
    }

    #[test]
    fn test_constrained_textures() {
        let caps = StaticCapabilities::constrained();
        assert!(!caps.supports_texture_kind(TextureKind::Tex1D));
        assert!(!caps.supports_texture_kind(TextureKind::Tex3D));
        assert!(caps.supports_texture_kind(TextureKind::Cube));
    }
}
