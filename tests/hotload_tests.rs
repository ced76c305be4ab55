//! Hotload Tests
//!
//! Tests for:
//! - Reload scope: only programs that read a changed file are reloaded
//! - Reloads happen in place; cached handles stay valid
//! - Broken programs are repaired by a later change
//! - Retired programs are skipped and pruned
//! - Custom program factories are registered like built-in ones

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{Fixture, effect, pass, program, technique};
use umbra::render::shader::{ProgramDesc, ProgramFactory, SourceProgram};
use umbra::{
    DefineSet, MemoryVfs, ProgramPtr, ShaderManager, ShaderProgram, ShaderSettings,
    StaticCapabilities, Vfs, VfsPath,
};

#[test]
fn change_reloads_only_dependent_programs() {
    let mut fx = Fixture::new();
    fx.add_program("other", &program("glsl", "glsl/other.vs", "glsl/other.fs"));
    fx.vfs.insert("shaders/glsl/other.vs", "void main() {}\n");
    fx.vfs.insert("shaders/glsl/other.fs", "void main() {}\n");

    fx.manager.load_program("basic", &DefineSet::new()).unwrap();
    fx.manager.load_program("other", &DefineSet::new()).unwrap();
    let basic_reads = fx.vfs.read_count("shaders/glsl/basic.vs");
    let other_reads = fx.vfs.read_count("shaders/glsl/other.vs");

    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/common.h".into()), 1);
    assert_eq!(fx.vfs.read_count("shaders/glsl/basic.vs"), basic_reads + 1);
    assert_eq!(fx.vfs.read_count("shaders/glsl/other.vs"), other_reads);

    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/unrelated.fs".into()), 0);
    assert_eq!(fx.vfs.read_count("shaders/glsl/basic.vs"), basic_reads + 1);
}

#[test]
fn every_define_variant_of_a_file_is_reloaded() {
    let mut fx = Fixture::new();
    fx.manager.load_program("basic", &DefineSet::new()).unwrap();
    fx.manager
        .load_program("basic", &DefineSet::from([("USE_FOG", "1")]))
        .unwrap();

    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/basic.fs".into()), 2);
}

#[test]
fn reload_keeps_cached_handles() {
    let mut fx = Fixture::new();
    fx.add_effect("simple", &effect(vec![technique(vec![pass("basic", vec![])])]));

    let tech = fx.manager.load_effect_default("simple").unwrap();
    let program = fx.manager.load_program("basic", &DefineSet::new()).unwrap();
    assert!(Arc::ptr_eq(tech.passes()[0].program().unwrap(), &program));

    fx.vfs.insert("shaders/glsl/basic.fs", "void main() { discard; }\n");
    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/basic.fs".into()), 1);

    let again = fx.manager.load_effect_default("simple").unwrap();
    assert!(Arc::ptr_eq(&tech, &again));
    assert_eq!(fx.manager.num_programs_loaded(), 1);
    assert_eq!(fx.manager.num_effects_loaded(), 1);
}

#[test]
fn includes_added_by_a_reload_are_watched() {
    let mut fx = Fixture::new();
    fx.add_program("plain", &program("glsl", "glsl/plain.vs", "glsl/plain.fs"));
    fx.vfs.insert("shaders/glsl/plain.vs", "void main() {}\n");
    fx.vfs.insert("shaders/glsl/plain.fs", "void main() {}\n");
    fx.vfs.insert("shaders/glsl/extra.h", "float extra() { return 1.0; }\n");

    let plain = fx.manager.load_program("plain", &DefineSet::new()).unwrap();
    let extra = VfsPath::new("shaders/glsl/extra.h");
    assert_eq!(fx.manager.reload_changed_file(&extra), 0);

    fx.vfs.insert("shaders/glsl/plain.vs", "#include \"extra.h\"\nvoid main() {}\n");
    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/plain.vs".into()), 1);
    assert!(plain.file_dependencies().contains(&extra));

    let reads = fx.vfs.read_count("shaders/glsl/extra.h");
    assert_eq!(fx.manager.reload_changed_file(&extra), 1);
    assert_eq!(fx.vfs.read_count("shaders/glsl/extra.h"), reads + 1);
}

#[test]
fn broken_program_is_repaired_by_a_later_change() {
    let mut fx = Fixture::new();
    fx.add_program("wip", &program("glsl", "glsl/wip.vs", "glsl/wip.fs"));
    fx.vfs.insert("shaders/glsl/wip.vs", "void main() {}\n");

    // The missing stage makes the build fail, but the program is still
    // cached and watched.
    let wip = fx.manager.load_program("wip", &DefineSet::new()).unwrap();
    assert!(!wip.is_valid());
    assert!(wip.file_dependencies().contains(&"shaders/glsl/wip.fs".into()));

    fx.vfs.insert("shaders/glsl/wip.fs", "void main() {}\n");
    assert_eq!(fx.manager.reload_changed_file(&"shaders/glsl/wip.fs".into()), 1);
    assert!(wip.is_valid());
}

#[test]
fn retired_programs_are_skipped() {
    let mut fx = Fixture::new();
    let program = fx.manager.load_program("basic", &DefineSet::new()).unwrap();
    let path = VfsPath::new("shaders/glsl/basic.vs");
    assert_eq!(fx.manager.hotload().dependents(&path).len(), 1);

    fx.manager.clear_caches();
    // Still alive through the handle held here.
    assert_eq!(fx.manager.reload_changed_file(&path), 1);

    drop(program);
    assert_eq!(fx.manager.reload_changed_file(&path), 0);
    assert!(fx.manager.hotload().dependents(&path).is_empty());

    fx.manager.clear_caches();
    assert!(fx.manager.hotload().is_empty());
}

// ============================================================================
// Custom factory
// ============================================================================

struct CountingFactory {
    constructed: Arc<AtomicUsize>,
}

impl ProgramFactory for CountingFactory {
    fn construct(&self, desc: ProgramDesc, vfs: &Arc<dyn Vfs>) -> umbra::Result<ProgramPtr> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(SourceProgram::new(desc, Arc::clone(vfs))))
    }
}

#[test]
fn custom_factories_construct_once_per_key() {
    common::init_logger();
    let vfs = Arc::new(MemoryVfs::new());
    vfs.insert(
        "shaders/basic.json",
        program("glsl", "glsl/basic.vs", "glsl/basic.fs").to_json(),
    );
    vfs.insert("shaders/glsl/basic.vs", "void main() {}\n");
    vfs.insert("shaders/glsl/basic.fs", "void main() {}\n");

    let constructed = Arc::new(AtomicUsize::new(0));
    let mut manager = ShaderManager::with_factory(
        vfs,
        Arc::new(StaticCapabilities::default()),
        ShaderSettings::default(),
        Box::new(CountingFactory {
            constructed: Arc::clone(&constructed),
        }),
    );

    for _ in 0..3 {
        manager.load_program("basic", &DefineSet::new()).unwrap();
    }
    manager
        .load_program("basic", &DefineSet::from([("USE_FOG", "1")]))
        .unwrap();

    assert_eq!(constructed.load(Ordering::SeqCst), 2);
    assert_eq!(manager.reload_changed_file(&"shaders/glsl/basic.vs".into()), 2);
}
