//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use umbra::{Element, MemoryVfs, ShaderManager, ShaderSettings, StaticCapabilities};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn define(name: &str, value: &str) -> Element {
    Element::new("define").with_attr("name", name).with_attr("value", value)
}

pub fn require_context(expr: &str) -> Element {
    Element::new("require").with_attr("context", expr)
}

pub fn require_shaders(flavor: &str) -> Element {
    Element::new("require").with_attr("shaders", flavor)
}

pub fn pass(shader: &str, children: Vec<Element>) -> Element {
    children
        .into_iter()
        .fold(Element::new("pass").with_attr("shader", shader), Element::with_child)
}

pub fn technique(children: Vec<Element>) -> Element {
    children.into_iter().fold(Element::new("technique"), Element::with_child)
}

pub fn effect(techniques: Vec<Element>) -> Element {
    techniques.into_iter().fold(Element::new("effect"), Element::with_child)
}

/// A minimal program document: position stream, one vertex and one
/// fragment file.
pub fn program(flavor: &str, vertex_file: &str, fragment_file: &str) -> Element {
    Element::new("program")
        .with_attr("type", flavor)
        .with_child(
            Element::new("vertex")
                .with_attr("file", vertex_file)
                .with_child(Element::new("stream").with_attr("name", "pos")),
        )
        .with_child(Element::new("fragment").with_attr("file", fragment_file))
}

pub struct Fixture {
    pub vfs: Arc<MemoryVfs>,
    pub manager: ShaderManager,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_capabilities(StaticCapabilities::default())
    }

    /// A filesystem holding the `basic` GLSL program.
    pub fn with_capabilities(capabilities: StaticCapabilities) -> Self {
        init_logger();

        let vfs = Arc::new(MemoryVfs::new());
        vfs.insert(
            "shaders/basic.json",
            program("glsl", "glsl/basic.vs", "glsl/basic.fs").to_json(),
        );
        vfs.insert(
            "shaders/glsl/basic.vs",
            "#version 120\n#include \"common.h\"\nvoid main() {}\n",
        );
        vfs.insert("shaders/glsl/basic.fs", "void main() {}\n");
        vfs.insert("shaders/glsl/common.h", "float shade() { return 1.0; }\n");

        let manager = ShaderManager::new(
            vfs.clone(),
            Arc::new(capabilities),
            ShaderSettings::default(),
        );
        Self { vfs, manager }
    }

    pub fn add_program(&self, name: &str, program: &Element) {
        self.vfs.insert(format!("shaders/{name}.json"), program.to_json());
    }

    pub fn add_effect(&self, name: &str, effect: &Element) {
        self.vfs.insert(format!("shaders/effects/{name}.json"), effect.to_json());
    }
}
