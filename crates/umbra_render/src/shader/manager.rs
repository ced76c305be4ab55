//! Shader Manager
//!
//! Two-level cache of resolved shader objects:
//!
//! | Level   | Key                 | Value                        | Miss handler                  |
//! |---------|---------------------|------------------------------|-------------------------------|
//! | Effect  | [`EffectCacheKey`]  | `Result<`[`TechniquePtr`]`>` | technique selection + passes  |
//! | Program | [`ProgramCacheKey`] | `Result<`[`ProgramPtr`]`>`   | program document resolution   |
//!
//! Failures are cached exactly like successes: a key that failed once keeps
//! failing, without touching the filesystem or logging again, until it is
//! explicitly invalidated.
//!
//! Programs register every file they read with the [`HotloadTracker`]. A
//! changed file reloads the affected programs in place; no cache entry moves.
//! Changes to the effect and program documents themselves are not picked up
//! automatically; use [`ShaderManager::invalidate_effect`] and
//! [`ShaderManager::invalidate_program`] for that.
//!
//! The manager is owned by the thread that owns the rendering context. All
//! operations take `&mut self` or `&self`; there is no internal locking.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;
use umbra_core::errors::Result;
use umbra_core::interner;
use umbra_core::vfs::{Vfs, VfsPath};
use umbra_resources::DefineSet;

use super::cache_key::{EffectCacheKey, ProgramCacheKey};
use super::capabilities::RenderCapabilities;
use super::hotload::HotloadTracker;
use super::program::{ProgramFactory, ProgramPtr, SourceProgramFactory};
use super::schema::Schema;
use super::technique::TechniquePtr;
use crate::settings::ShaderSettings;

pub struct ShaderManager {
    pub(super) settings: ShaderSettings,
    pub(super) vfs: Arc<dyn Vfs>,
    pub(super) capabilities: Arc<dyn RenderCapabilities>,
    pub(super) factory: Box<dyn ProgramFactory>,
    /// `None` when program validation is disabled.
    pub(super) schema: Option<Schema>,

    program_cache: FxHashMap<ProgramCacheKey, Result<ProgramPtr>>,
    effect_cache: FxHashMap<EffectCacheKey, Result<TechniquePtr>>,
    pub(super) hotload: HotloadTracker,
}

impl ShaderManager {
    /// Creates a manager building [`SourceProgram`](super::SourceProgram)s.
    pub fn new(
        vfs: Arc<dyn Vfs>,
        capabilities: Arc<dyn RenderCapabilities>,
        settings: ShaderSettings,
    ) -> Self {
        Self::with_factory(vfs, capabilities, settings, Box::new(SourceProgramFactory))
    }

    /// Creates a manager building programs through `factory`.
    pub fn with_factory(
        vfs: Arc<dyn Vfs>,
        capabilities: Arc<dyn RenderCapabilities>,
        settings: ShaderSettings,
        factory: Box<dyn ProgramFactory>,
    ) -> Self {
        interner::preload_common_defines();
        let schema = settings
            .validate_programs
            .then(|| load_program_schema(vfs.as_ref(), &settings));

        Self {
            settings,
            vfs,
            capabilities,
            factory,
            schema,
            program_cache: FxHashMap::default(),
            effect_cache: FxHashMap::default(),
            hotload: HotloadTracker::new(),
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves program `name` under `defines`.
    ///
    /// A cached result, success or failure, is returned as is.
    pub fn load_program(&mut self, name: &str, defines: &DefineSet) -> Result<ProgramPtr> {
        let key = ProgramCacheKey::new(name, defines);
        if let Some(cached) = self.program_cache.get(&key) {
            return cached.clone();
        }

        let start = Instant::now();
        let result = self.new_program(name, defines);
        match &result {
            Ok(_) => debug!("Loaded shader '{name}' {defines} in {:?}", start.elapsed()),
            Err(e) => error!("Failed to load shader '{name}': {e}"),
        }

        self.program_cache.insert(key, result.clone());
        result
    }

    /// Resolves effect `name` under `defines` to its first usable technique.
    ///
    /// A cached result, success or failure, is returned as is.
    pub fn load_effect(&mut self, name: &str, defines: &DefineSet) -> Result<TechniquePtr> {
        let key = EffectCacheKey::new(name, defines);
        if let Some(cached) = self.effect_cache.get(&key) {
            return cached.clone();
        }

        let start = Instant::now();
        let result = self.new_effect(name, defines);
        match &result {
            Ok(_) => debug!("Loaded effect '{name}' {defines} in {:?}", start.elapsed()),
            Err(e) => error!("Failed to load effect '{name}': {e}"),
        }

        self.effect_cache.insert(key, result.clone());
        result
    }

    /// [`load_effect`](Self::load_effect) with an empty define set.
    pub fn load_effect_default(&mut self, name: &str) -> Result<TechniquePtr> {
        self.load_effect(name, &DefineSet::new())
    }

    /// Number of effect cache entries, failures included.
    #[inline]
    #[must_use]
    pub fn num_effects_loaded(&self) -> usize {
        self.effect_cache.len()
    }

    /// Number of program cache entries, failures included.
    #[inline]
    #[must_use]
    pub fn num_programs_loaded(&self) -> usize {
        self.program_cache.len()
    }

    // ========================================================================
    // Hotload
    // ========================================================================

    /// Reloads every live program that read `path`. Returns how many were
    /// reloaded.
    pub fn reload_changed_file(&mut self, path: &VfsPath) -> usize {
        self.hotload.on_file_changed(path)
    }

    /// Applies every change queued by `watcher`.
    #[cfg(feature = "watch")]
    pub fn pump_file_changes(&mut self, watcher: &super::watcher::FileWatcher) -> usize {
        watcher
            .drain()
            .iter()
            .map(|path| self.reload_changed_file(path))
            .sum()
    }

    #[inline]
    #[must_use]
    pub fn hotload(&self) -> &HotloadTracker {
        &self.hotload
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Drops every cached effect and program.
    ///
    /// Handles already given out stay valid.
    pub fn clear_caches(&mut self) {
        info!(
            "Clearing {} effects and {} programs",
            self.effect_cache.len(),
            self.program_cache.len()
        );
        self.effect_cache.clear();
        self.program_cache.clear();
        self.hotload.prune();
    }

    /// Drops every cached entry of program `name`, whatever its defines.
    /// Returns the number of entries removed.
    pub fn invalidate_program(&mut self, name: &str) -> usize {
        let Some(symbol) = interner::get(name) else {
            return 0;
        };
        let before = self.program_cache.len();
        self.program_cache.retain(|key, _| key.name != symbol);
        self.hotload.prune();
        before - self.program_cache.len()
    }

    /// Drops every cached entry of effect `name`, whatever its defines.
    /// Returns the number of entries removed.
    pub fn invalidate_effect(&mut self, name: &str) -> usize {
        let Some(symbol) = interner::get(name) else {
            return 0;
        };
        let before = self.effect_cache.len();
        self.effect_cache.retain(|key, _| key.name != symbol);
        before - self.effect_cache.len()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ShaderSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> &dyn RenderCapabilities {
        self.capabilities.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn vfs(&self) -> &Arc<dyn Vfs> {
        &self.vfs
    }
}

fn load_program_schema(vfs: &dyn Vfs, settings: &ShaderSettings) -> Schema {
    let Some(path) = settings.program_schema.as_deref().map(VfsPath::new) else {
        return Schema::program();
    };
    if !vfs.exists(&path) {
        debug!("No program schema at {path}, using the built-in grammar");
        return Schema::program();
    }

    match vfs.read_to_string(&path).and_then(|text| Schema::from_json(&text)) {
        Ok(schema) => {
            info!("Loaded program schema {path}");
            schema
        }
        Err(e) => {
            warn!("Failed to load program schema {path}: {e}; using the built-in grammar");
            Schema::program()
        }
    }
}
