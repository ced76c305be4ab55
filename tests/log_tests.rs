//! Failure Logging Tests
//!
//! Tests for:
//! - A failed resolution is logged once, not on every cache hit
//! - A pass program failure is logged by the program cache only
//!
//! This binary installs its own logger; records are matched by the names
//! each test uses, so tests running in parallel do not see each other.

mod common;

use std::sync::{Mutex, OnceLock};

use common::{Fixture, effect, pass, technique};
use log::{Level, LevelFilter, Log, Metadata, Record};
use umbra::DefineSet;

#[derive(Default)]
struct RecordingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for RecordingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

fn logger() -> &'static RecordingLogger {
    static LOGGER: OnceLock<&'static RecordingLogger> = OnceLock::new();
    *LOGGER.get_or_init(|| {
        let logger: &'static RecordingLogger = Box::leak(Box::new(RecordingLogger::default()));
        log::set_logger(logger).unwrap();
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

/// Number of `error!` records mentioning `needle`.
fn errors_mentioning(needle: &str) -> usize {
    logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == Level::Error && message.contains(needle))
        .count()
}

#[test]
fn missing_program_is_logged_once() {
    logger();
    let mut fx = Fixture::new();

    for _ in 0..2 {
        assert!(fx.manager.load_program("absent_program", &DefineSet::new()).is_err());
    }

    assert_eq!(errors_mentioning("absent_program"), 1);
}

#[test]
fn missing_effect_is_logged_once() {
    logger();
    let mut fx = Fixture::new();

    for _ in 0..3 {
        assert!(fx.manager.load_effect_default("absent_effect").is_err());
    }

    assert_eq!(errors_mentioning("absent_effect"), 1);
}

#[test]
fn pass_program_failure_is_logged_by_the_program_cache() {
    logger();
    let mut fx = Fixture::new();
    fx.add_effect(
        "partial_effect",
        &effect(vec![technique(vec![pass("absent_pass_program", vec![])])]),
    );

    for _ in 0..2 {
        assert!(fx.manager.load_effect_default("partial_effect").is_ok());
    }

    assert_eq!(errors_mentioning("absent_pass_program"), 1);
    assert_eq!(errors_mentioning("partial_effect"), 0);
}
