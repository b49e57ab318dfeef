//! Multipart upload handling.
//!
//! An upload runs in three steps. [`store::ensure_upload_dir`] creates the upload directory
//! before the body is looked at. [`intake::receive_parts`] then turns the request body into
//! [`Part`]s, enforcing the size limits while it streams; no part is written until the whole body
//! has been accepted. [`store::store_parts`] finally writes every part that carries a filename to
//! `<upload_dir>/<filename>` and records a [`PartOutcome`] per part. The first failed part ends
//! the run, so parts after it are never written.
//!
//! The resulting [`UploadReport`] collapses into a single [`UploadResult`] message for the page.

pub mod errors;
pub mod filename;
pub mod intake;
pub mod log;
pub mod store;

use axum::http::{HeaderMap, header};
use bytes::Bytes;
use std::{io, path::PathBuf, pin::Pin};
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncSeekExt},
};

pub use errors::{IntakeError, UploadError};
pub use log::{TracingUploadLog, UploadLog};

/// Message rendered when every part was handled.
pub const SUCCESS_MESSAGE: &str = "文件上传成功!";

/// Prefix of the message rendered when the upload was aborted.
pub const FAILURE_PREFIX: &str = "文件上传失败: ";

/// One part of a multipart request.
#[derive(Debug)]
pub struct Part {
    pub headers: HeaderMap,
    pub content: PartContent,
}

impl Part {
    /// Raw header value, decoded lossily so non-ASCII filenames survive.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<String> {
        self.headers
            .get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
    }

    pub fn content_disposition(&self) -> Option<String> {
        self.header(header::CONTENT_DISPOSITION)
    }
}

/// Part body, held in memory below the buffering threshold and in an anonymous temp file above.
#[derive(Debug)]
pub enum PartContent {
    Memory(Bytes),
    Spooled { file: File, len: u64 },
}

impl PartContent {
    pub fn len(&self) -> u64 {
        match self {
            PartContent::Memory(bytes) => bytes.len() as u64,
            PartContent::Spooled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_spooled(&self) -> bool {
        matches!(self, PartContent::Spooled { .. })
    }

    /// Consume the content as a reader positioned at its first byte.
    pub async fn into_reader(self) -> io::Result<Pin<Box<dyn AsyncRead + Send>>> {
        match self {
            PartContent::Memory(bytes) => Ok(Box::pin(io::Cursor::new(bytes))),
            PartContent::Spooled { mut file, .. } => {
                file.rewind().await?;
                Ok(Box::pin(file))
            }
        }
    }
}

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug)]
pub enum PartOutcome {
    Stored(StoredFile),
    /// No filename, or an empty one
    Skipped,
    Failed(UploadError),
}

/// Per-part outcomes of one upload, in arrival order.
///
/// Outcomes stop at the first failure; parts after it have no entry.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub outcomes: Vec<PartOutcome>,
}

impl UploadReport {
    pub fn failure(&self) -> Option<&UploadError> {
        self.outcomes.iter().find_map(|outcome| match outcome {
            PartOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    pub fn stored(&self) -> impl Iterator<Item = &StoredFile> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PartOutcome::Stored(file) => Some(file),
            _ => None,
        })
    }

    pub fn result(&self) -> UploadResult {
        match self.failure() {
            Some(err) => UploadResult::failure(err),
            None => UploadResult::Success,
        }
    }
}

/// The message attached to the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Success,
    Failure { description: String },
}

impl UploadResult {
    /// The description carries the error and each of its causes.
    pub fn failure(err: &UploadError) -> Self {
        UploadResult::Failure {
            description: log::Chain(err).to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            UploadResult::Success => SUCCESS_MESSAGE.to_string(),
            UploadResult::Failure { description } => format!("{FAILURE_PREFIX}{description}"),
        }
    }
}
