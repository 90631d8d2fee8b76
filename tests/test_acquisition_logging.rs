mod common;
use common::*;

use growatt_node::transport::TransportStatus::{Continue, Failure, Success};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;

/// Captures warnings and errors; this binary installs it as the only logger.
struct Capture {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    lines: Mutex::new(Vec::new()),
};

#[tokio::test]
async fn each_failure_is_reported_once() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut subject = Factory::acquisition(&[Failure(0xe2), Continue, Failure(0xe3), Success], 5);
    assert_eq!(subject.acquire().await, Success);

    let lines = CAPTURE.lines.lock().unwrap().clone();
    assert_eq!(
        lines,
        vec![
            (Level::Error, "Error: scripted 0xe2".to_string()),
            (Level::Error, "Error: scripted 0xe3".to_string()),
        ]
    );
}
