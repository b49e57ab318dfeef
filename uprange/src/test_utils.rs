//! Shared fixtures for unit and handler tests.

use crate::config::{Config, UploadLimits};
use crate::upload::{Part, PartContent, UploadLog, log::Chain};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum_test::TestServer;
use bytes::Bytes;
use std::{
    error::Error as StdError,
    fmt,
    path::Path,
    sync::{Arc, Mutex},
};

/// Config rooted at `app_root`, bound nowhere in particular.
pub fn create_test_config(app_root: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        app_root: app_root.to_path_buf(),
        ..Default::default()
    }
}

/// Config with tiny limits so size handling can be exercised with small bodies.
pub fn create_small_limits_config(app_root: &Path) -> Config {
    Config {
        limits: UploadLimits {
            file_size_threshold: 8,
            max_file_size: 32,
            max_request_size: 4096,
            spool_dir: None,
        },
        ..create_test_config(app_root)
    }
}

pub fn create_test_app(config: Config) -> (TestServer, Arc<RecordingUploadLog>) {
    let log = Arc::new(RecordingUploadLog::default());
    let app = crate::Application::with_upload_log(config, log.clone()).expect("Failed to create application");
    (app.into_test_server(), log)
}

pub fn part_with_headers(headers: &[(&str, &str)], content: &[u8]) -> Part {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_bytes(value.as_bytes()).unwrap(),
        );
    }
    Part {
        headers: map,
        content: PartContent::Memory(Bytes::copy_from_slice(content)),
    }
}

pub fn file_part(file_name: &str, content: &[u8]) -> Part {
    let disposition = format!("form-data; name=\"file\"; filename=\"{file_name}\"");
    part_with_headers(&[("content-disposition", &disposition)], content)
}

/// An [`UploadLog`] that keeps every entry for later assertions.
#[derive(Debug, Default)]
pub struct RecordingUploadLog {
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingUploadLog {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl UploadLog for RecordingUploadLog {
    fn info(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        let mut entry = message.to_string();
        for (key, value) in fields {
            entry.push_str(&format!(" {key}={value}"));
        }
        self.infos.lock().unwrap().push(entry);
    }

    fn error(&self, message: &str, error: &(dyn StdError + 'static)) {
        self.errors.lock().unwrap().push(format!("{message}: {}", Chain(error)));
    }
}
