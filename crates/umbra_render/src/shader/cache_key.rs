//! Strongly-typed cache keys.
//!
//! Programs and effects are both cached by `(name, defines)`. The two key
//! families have the same shape but are distinct types, so an effect key can
//! never be used to query the program cache or the other way round.

use std::hash::{Hash, Hasher};

use umbra_core::interner::{self, Symbol};
use umbra_resources::DefineSet;

macro_rules! define_cache_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub name: Symbol,
            pub defines: DefineSet,
        }

        impl $name {
            #[must_use]
            pub fn new(name: &str, defines: &DefineSet) -> Self {
                Self {
                    name: interner::intern(name),
                    defines: defines.clone(),
                }
            }

            #[inline]
            #[must_use]
            pub fn name_str(&self) -> &'static str {
                interner::resolve(self.name)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.name.hash(state);
                state.write_u64(self.defines.compute_hash());
            }
        }
    };
}

define_cache_key! {
    /// Key of the program cache.
    ProgramCacheKey
}

define_cache_key! {
    /// Key of the effect cache.
    EffectCacheKey
}
