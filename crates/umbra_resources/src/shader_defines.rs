//! Shader Define Sets
//!
//! A [`DefineSet`] is the active set of preprocessor-style `NAME = VALUE`
//! pairs. It both selects branches inside effect/program documents and forms
//! half of every program and effect cache key.
//!
//! # Architecture
//!
//! Names and values are interned [`Symbol`]s kept in a vector sorted by the
//! name symbol. Because the storage order depends only on the content, the
//! derived `Eq` and `Hash` are defined over the whole set and two sets built
//! in different insertion orders compare and hash identically.
//!
//! # Usage
//!
//! ```rust,ignore
//! use umbra_resources::DefineSet;
//!
//! let mut defines = DefineSet::new();
//! defines.add("USE_SHADOW", "1");
//! let shadowless = defines.with("USE_SHADOW", "0");
//! assert_ne!(defines, shadowless);
//! ```

use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};

use umbra_core::interner::{self, Symbol};

/// An ordered, hashable collection of define name/value pairs.
///
/// Once a set is used as a cache key it is never mutated; derived sets are
/// produced with [`DefineSet::with`] or by cloning and adding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DefineSet {
    defines: Vec<(Symbol, Symbol)>,
}

impl DefineSet {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            defines: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            defines: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites a define. Later writes for the same name win.
    pub fn add(&mut self, name: &str, value: &str) {
        self.add_symbol(interner::intern(name), interner::intern(value));
    }

    /// Inserts or overwrites a define by symbol.
    #[inline]
    pub fn add_symbol(&mut self, name: Symbol, value: Symbol) {
        match self.defines.binary_search_by_key(&name, |&(k, _)| k) {
            Ok(idx) => self.defines[idx].1 = value,
            Err(idx) => self.defines.insert(idx, (name, value)),
        }
    }

    /// Returns a copy of this set with one more define.
    #[must_use]
    pub fn with(&self, name: &str, value: &str) -> Self {
        let mut result = self.clone();
        result.add(name, value);
        result
    }

    /// Adds every define of `other`; values from `other` win on conflict.
    pub fn merge(&mut self, other: &DefineSet) {
        for &(name, value) in &other.defines {
            self.add_symbol(name, value);
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.contains_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn contains_symbol(&self, name: Symbol) -> bool {
        self.defines.binary_search_by_key(&name, |&(k, _)| k).is_ok()
    }

    /// Returns the value of a define.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static str> {
        interner::get(name).and_then(|sym| self.get_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn get_symbol(&self, name: Symbol) -> Option<&'static str> {
        self.defines
            .binary_search_by_key(&name, |&(k, _)| k)
            .ok()
            .map(|idx| interner::resolve(self.defines[idx].1))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Iterates all defines as symbols.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Symbol)> {
        self.defines.iter()
    }

    /// Iterates all defines as strings.
    pub fn iter_strings(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.defines
            .iter()
            .map(|&(k, v)| (interner::resolve(k), interner::resolve(v)))
    }

    /// Defines sorted by name, for deterministic source generation and logs.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, &'static str> {
        self.iter_strings().collect()
    }

    /// Content hash of the whole set.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        rustc_hash::FxBuildHasher.hash_one(self)
    }
}

impl From<&[(&str, &str)]> for DefineSet {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self::with_capacity(defines.len());
        for (k, v) in defines {
            result.add(k, v);
        }
        result
    }
}

impl<const N: usize> From<[(&str, &str); N]> for DefineSet {
    fn from(defines: [(&str, &str); N]) -> Self {
        Self::from(&defines[..])
    }
}

impl std::fmt::Display for DefineSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.to_map().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut defines = DefineSet::new();
        defines.add("USE_SHADOW", "1");
        defines.add("USE_FOG", "1");

        assert!(defines.contains("USE_SHADOW"));
        assert!(defines.contains("USE_FOG"));
        assert!(!defines.contains("USE_INSTANCING_UNSET"));
        assert_eq!(defines.get("USE_SHADOW"), Some("1"));
    }

    #[test]
    fn test_later_write_wins() {
        let mut defines = DefineSet::new();
        defines.add("QUALITY", "0");
        defines.add("QUALITY", "2");

        assert_eq!(defines.len(), 1);
        assert_eq!(defines.get("QUALITY"), Some("2"));
    }

    #[test]
    fn test_insertion_order_is_irrelevant() {
        let mut d1 = DefineSet::new();
        d1.add("A", "1");
        d1.add("B", "2");

        let mut d2 = DefineSet::new();
        d2.add("B", "2");
        d2.add("A", "1");

        assert_eq!(d1, d2);
        assert_eq!(d1.compute_hash(), d2.compute_hash());
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let base = DefineSet::from([("MODE", "0")]);
        let derived = base.with("MODE", "1");

        assert_eq!(base.get("MODE"), Some("0"));
        assert_eq!(derived.get("MODE"), Some("1"));
        assert_ne!(base, derived);
    }

    #[test]
    fn test_merge() {
        let mut d1 = DefineSet::from([("A", "1"), ("B", "2")]);
        let d2 = DefineSet::from([("B", "3"), ("C", "4")]);

        d1.merge(&d2);

        assert_eq!(d1.get("A"), Some("1"));
        assert_eq!(d1.get("B"), Some("3"));
        assert_eq!(d1.get("C"), Some("4"));
    }

    #[test]
    fn test_display_is_sorted_by_name() {
        let defines = DefineSet::from([("ZETA", "1"), ("ALPHA", "2")]);
        assert_eq!(defines.to_string(), "{ALPHA=2, ZETA=1}");
    }
}
