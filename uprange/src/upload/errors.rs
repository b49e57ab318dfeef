use std::{io, path::PathBuf};
use thiserror::Error as ThisError;

/// Failures while turning a request body into parts.
#[derive(ThisError, Debug)]
pub enum IntakeError {
    #[error("request is not multipart/form-data")]
    NotMultipart(#[source] multer::Error),

    #[error("malformed multipart body")]
    Malformed(#[source] multer::Error),

    #[error("part {index} exceeds the maximum size of {limit} bytes")]
    PartTooLarge { index: usize, limit: u64 },

    #[error("request exceeds the maximum size of {limit} bytes")]
    RequestTooLarge { limit: u64 },

    #[error("could not buffer part {index}")]
    Spool {
        index: usize,
        #[source]
        source: io::Error,
    },
}

impl IntakeError {
    /// Size-limit violations are rejected with a client error instead of a rendered failure.
    pub fn is_size_limit(&self) -> bool {
        matches!(self, IntakeError::PartTooLarge { .. } | IntakeError::RequestTooLarge { .. })
    }
}

/// Everything that can abort an upload. All variants collapse into the single failure message.
///
/// Display text never repeats the `#[source]`; render the whole chain with
/// [`super::log::Chain`].
#[derive(ThisError, Debug)]
pub enum UploadError {
    #[error("could not create upload directory {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("part has no content-disposition header")]
    MissingContentDisposition,

    /// The `filename` segment is too short for the quote-stripping slice
    #[error("filename segment {segment:?} cannot be sliced from {begin} to {end}")]
    MalformedFilename { segment: String, begin: i64, end: i64 },

    #[error("could not write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Intake(#[from] IntakeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::log::Chain;

    #[test]
    fn test_chain_names_each_cause_once() {
        let err = UploadError::Write {
            path: PathBuf::from("/srv/webapp/a.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        };

        assert_eq!(Chain(&err).to_string(), "could not write /srv/webapp/a.txt: Permission denied");
    }

    #[test]
    fn test_intake_errors_chain_through_transparent_wrapper() {
        let err = UploadError::from(IntakeError::Spool {
            index: 2,
            source: io::Error::other("disk full"),
        });

        assert_eq!(Chain(&err).to_string(), "could not buffer part 2: disk full");
    }
}
