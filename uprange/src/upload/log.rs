//! The logging capability handed to the upload path.
//!
//! Handlers receive an [`UploadLog`] through the application state instead of reaching for a
//! process-wide logger. [`TracingUploadLog`] forwards to `tracing`, which is what the server uses.

use std::{error::Error as StdError, fmt};

pub trait UploadLog: Send + Sync {
    /// Informational entry with structured key/value fields
    fn info(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]);

    /// Severe entry carrying the failure and its source chain
    fn error(&self, message: &str, error: &(dyn StdError + 'static));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUploadLog;

impl UploadLog for TracingUploadLog {
    fn info(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        tracing::info!(fields = %Fields(fields), "{message}");
    }

    fn error(&self, message: &str, error: &(dyn StdError + 'static)) {
        tracing::error!(error, "{message}");
    }
}

struct Fields<'a>(&'a [(&'a str, &'a dyn fmt::Display)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Renders an error followed by each of its sources, `: `-separated.
pub(crate) struct Chain<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
