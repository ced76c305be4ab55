//! Loads the `model` effect from `demos/data` and reloads its programs
//! whenever a stage source changes on disk.
//!
//! ```text
//! RUST_LOG=info cargo run --example shader_hotload
//! ```

use std::sync::Arc;
use std::time::Duration;

use log::info;
use umbra::{DefineSet, DiskVfs, FileWatcher, ShaderManager, ShaderSettings, StaticCapabilities};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/data");
    let mut shaders = ShaderManager::new(
        Arc::new(DiskVfs::new(root)),
        Arc::new(StaticCapabilities::default()),
        ShaderSettings::default(),
    );

    for defines in [DefineSet::new(), DefineSet::from([("USE_FOG", "1")])] {
        let technique = shaders.load_effect("model", &defines)?;
        info!(
            "model {defines}: {} passes, sort_by_distance = {}",
            technique.num_passes(),
            technique.sort_by_distance()
        );
    }
    info!(
        "{} effects, {} programs loaded",
        shaders.num_effects_loaded(),
        shaders.num_programs_loaded()
    );

    let watcher = FileWatcher::new(root)?;
    info!("Edit a file under {root}/shaders/glsl to trigger a reload (Ctrl+C to quit)");
    loop {
        let reloaded = shaders.pump_file_changes(&watcher);
        if reloaded > 0 {
            info!("Reloaded {reloaded} programs");
        }
        std::thread::sleep(Duration::from_millis(250));
    }
}
