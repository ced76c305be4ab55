//! Hotload Dependency Tracking
//!
//! Maps every source file to the programs that read it. When a file changes,
//! each program that is still alive is reloaded in place; cached handles stay
//! valid, so no cache entry is touched.
//!
//! The tracker only observes programs. Its references are [`Weak`], so a
//! program retired by its owners disappears from the tracker's point of view
//! without the tracker ever taking part in that decision.

use std::sync::{Arc, Weak};

use log::info;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use umbra_core::interner;
use umbra_core::vfs::VfsPath;

use super::program::{ProgramPtr, ShaderProgram};

type Dependents = SmallVec<[Weak<dyn ShaderProgram>; 2]>;

#[derive(Default)]
pub struct HotloadTracker {
    files: FxHashMap<VfsPath, Dependents>,
}

impl HotloadTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `program` depends on `path`. Registering the same pair
    /// twice has no effect.
    pub fn register(&mut self, program: &ProgramPtr, path: VfsPath) {
        let dependents = self.files.entry(path).or_default();
        let weak = Arc::downgrade(program);
        if !dependents.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            dependents.push(weak);
        }
    }

    /// Reloads every live program depending on `path`.
    ///
    /// A reload may pull in files the program did not read before (a new
    /// `#include`); those are registered too. Returns the number of programs
    /// reloaded. Unknown paths and retired programs are skipped silently.
    pub fn on_file_changed(&mut self, path: &VfsPath) -> usize {
        let programs = self.dependents(path);
        for program in &programs {
            info!(
                "Hotloading {path} for program '{}'",
                interner::resolve(program.desc().name)
            );
            program.reload();
            for dependency in program.file_dependencies() {
                self.register(program, dependency);
            }
        }
        programs.len()
    }

    /// Drops references to retired programs and paths left without any.
    ///
    /// Returns the number of references removed.
    pub fn prune(&mut self) -> usize {
        let mut removed = 0;
        self.files.retain(|_, dependents| {
            let before = dependents.len();
            dependents.retain(|w| w.strong_count() > 0);
            removed += before - dependents.len();
            !dependents.is_empty()
        });
        removed
    }

    /// Live programs depending on `path`.
    #[must_use]
    pub fn dependents(&self, path: &VfsPath) -> Vec<ProgramPtr> {
        self.files
            .get(path)
            .map(|d| d.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }

    /// Number of tracked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
