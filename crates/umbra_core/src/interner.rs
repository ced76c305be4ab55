//! Global String Interner
//!
//! Converts strings into compact integer [`Symbol`]s so that define names,
//! define values and program/effect names can be compared and hashed as
//! integers. This is the foundation of the define-set and cache-key system.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

/// Global interner instance.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Symbol type alias.
///
/// A Symbol is a compact integer identifier; comparing or hashing it never
/// touches the underlying string.
pub type Symbol = Spur;

/// Interns a string and returns its Symbol.
///
/// Returns the existing Symbol if the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns define names and values that almost every effect touches.
pub fn preload_common_defines() {
    let common = [
        "USE_SHADOW",
        "USE_FOG",
        "USE_INSTANCING",
        "USE_NORMAL_MAP",
        "USE_SPECULAR_MAP",
        "USE_GPU_SKINNING",
        "MODE_SHADOWCAST",
        "MODE_WIREFRAME",
        "MODE_SILHOUETTEOCCLUDER",
        "MODE_SILHOUETTEDISPLAY",
        "ALPHABLEND_PASS_OPAQUE",
        "ALPHABLEND_PASS_BLEND",
        "0",
        "1",
    ];

    for name in common {
        intern(name);
    }
}
