//! Multipart intake: request body to [`Part`]s.
//!
//! Size limits are checked as bytes arrive. A declared `Content-Length` over the request limit is
//! refused before the body is read; otherwise each chunk is counted against both the per-part and
//! the per-request limit. Framing overhead counts toward the request limit through multer's
//! whole-stream constraint.

use axum::{
    body::Body,
    http::{HeaderMap, header},
};
use bytes::{Bytes, BytesMut};
use std::{io, path::PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, instrument};

use super::{IntakeError, Part, PartContent};
use crate::config::UploadLimits;

/// Refuse a request whose declared `Content-Length` is over the request limit.
pub fn check_declared_length(headers: &HeaderMap, limits: &UploadLimits) -> Result<(), IntakeError> {
    match content_length(headers) {
        Some(declared) if declared > limits.max_request_size => Err(IntakeError::RequestTooLarge {
            limit: limits.max_request_size,
        }),
        _ => Ok(()),
    }
}

/// Read every part of a multipart request body.
#[instrument(skip_all, fields(content_length))]
pub async fn receive_parts(headers: &HeaderMap, body: Body, limits: &UploadLimits) -> Result<Vec<Part>, IntakeError> {
    if let Some(declared) = content_length(headers) {
        tracing::Span::current().record("content_length", declared);
    }
    check_declared_length(headers, limits)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(IntakeError::NotMultipart)?;

    let constraints = multer::Constraints::new().size_limit(multer::SizeLimit::new().whole_stream(limits.max_request_size));
    let mut multipart = multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut parts = Vec::new();
    let mut request_total = 0u64;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| stream_error(e, limits))? {
        let index = parts.len();
        let part_headers = field.headers().clone();
        let mut spool = Spool::new(limits);

        while let Some(chunk) = field.chunk().await.map_err(|e| stream_error(e, limits))? {
            let size = chunk.len() as u64;
            request_total += size;

            if spool.len + size > limits.max_file_size {
                return Err(IntakeError::PartTooLarge {
                    index,
                    limit: limits.max_file_size,
                });
            }
            if request_total > limits.max_request_size {
                return Err(IntakeError::RequestTooLarge {
                    limit: limits.max_request_size,
                });
            }

            spool.push(chunk).await.map_err(|source| IntakeError::Spool { index, source })?;
        }

        let content = spool.finish().await.map_err(|source| IntakeError::Spool { index, source })?;
        debug!(index, bytes = content.len(), spooled = content.is_spooled(), "Received part");

        parts.push(Part {
            headers: part_headers,
            content,
        });
    }

    Ok(parts)
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn stream_error(err: multer::Error, limits: &UploadLimits) -> IntakeError {
    match err {
        multer::Error::StreamSizeExceeded { .. } => IntakeError::RequestTooLarge {
            limit: limits.max_request_size,
        },
        other => IntakeError::Malformed(other),
    }
}

/// Accumulates one part, moving it to an anonymous temp file once it passes the threshold.
struct Spool {
    threshold: u64,
    dir: Option<PathBuf>,
    buffer: BytesMut,
    file: Option<File>,
    len: u64,
}

impl Spool {
    fn new(limits: &UploadLimits) -> Self {
        Self {
            threshold: limits.file_size_threshold,
            dir: limits.spool_dir.clone(),
            buffer: BytesMut::new(),
            file: None,
            len: 0,
        }
    }

    async fn push(&mut self, chunk: Bytes) -> io::Result<()> {
        self.len += chunk.len() as u64;

        if let Some(file) = self.file.as_mut() {
            return file.write_all(&chunk).await;
        }

        if self.len <= self.threshold {
            self.buffer.extend_from_slice(&chunk);
            return Ok(());
        }

        let mut file = self.create_file().await?;
        file.write_all(&self.buffer).await?;
        file.write_all(&chunk).await?;
        self.buffer = BytesMut::new();
        self.file = Some(file);
        Ok(())
    }

    async fn create_file(&self) -> io::Result<File> {
        let dir = self.dir.clone();
        let file = tokio::task::spawn_blocking(move || match dir {
            Some(dir) => tempfile::tempfile_in(dir),
            None => tempfile::tempfile(),
        })
        .await
        .map_err(io::Error::other)??;
        Ok(File::from_std(file))
    }

    async fn finish(self) -> io::Result<PartContent> {
        match self.file {
            Some(mut file) => {
                file.flush().await?;
                Ok(PartContent::Spooled { file, len: self.len })
            }
            None => Ok(PartContent::Memory(self.buffer.freeze())),
        }
    }
}
