use serde::Serialize;

use crate::config::UploadLimits;

const MIB: u64 = 1024 * 1024;

/// Context for the upload page.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPage {
    /// Result of the last upload; absent when the form is shown fresh
    pub message: Option<String>,
    pub max_file_size_mb: u64,
    pub max_request_size_mb: u64,
}

impl UploadPage {
    pub fn new(limits: &UploadLimits, message: Option<String>) -> Self {
        Self {
            message,
            max_file_size_mb: limits.max_file_size / MIB,
            max_request_size_mb: limits.max_request_size / MIB,
        }
    }
}
