#![allow(dead_code)]

use std::io::Write;

use mockall::mock;
use tempfile::NamedTempFile;

use stream_batch_rs::{
    Record,
    core::item::{ItemHandler, ItemHandlerResult},
};

mock! {
    pub Handler {}
    impl ItemHandler<Record> for Handler {
        fn handle(&self, item: &Record) -> ItemHandlerResult;
    }
}

pub const TWO_RECORDS: &str = r#"[{"id":1,"name":"a","value":1.5,"tags":["x"],"metadata":{"created":"2020","priority":1,"active":true}},{"id":2,"name":"b","value":2.5,"tags":[],"metadata":{"created":"2021","priority":2,"active":false}}]"#;

/// Routes the crate logs to the test output, filtered by `RUST_LOG`.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Writes `content` to a fresh temporary file.
pub fn json_file(content: &str) -> NamedTempFile {
    init_logger();
    let mut file = NamedTempFile::new().expect("Unable to create temporary file");
    file.write_all(content.as_bytes())
        .expect("Unable to write temporary file");
    file
}

/// A JSON array of `count` records with ids `1..=count`.
pub fn records_json(count: usize) -> String {
    let items: Vec<String> = (1..=count)
        .map(|id| {
            format!(
                r#"{{"id":{id},"name":"record-{id}","value":{id}.25,"tags":["t{id}"],"metadata":{{"created":"2024-01-01","priority":{p},"active":{a}}}}}"#,
                id = id,
                p = id % 5,
                a = id % 2 == 0
            )
        })
        .collect();
    format!("[\n{}\n]", items.join(",\n"))
}
