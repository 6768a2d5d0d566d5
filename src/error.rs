//! @ai:module:intent Define error types for the CDSSpec compiler
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::{Path, PathBuf};
use thiserror::Error;

/// @ai:intent Unified error type for all extraction and generation operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a valid directory")]
    NotADirectory(PathBuf),

    /// A malformed annotation. Always fatal for the whole run.
    #[error("Spec error in file \"{}\", line {line}: {message}", display_name(.file))]
    Annotation {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Spec error: there should be exactly one @DeclareState annotation")]
    MissingGlobalState,

    #[error("Invalid configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// @ai:intent Build a fatal annotation error anchored at a file and line
    /// @ai:effects pure
    pub fn annotation(file: &Path, line: usize, message: impl Into<String>) -> Self {
        Error::Annotation {
            file: file.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// @ai:intent Check whether this error was caused by a malformed annotation
    pub fn is_annotation_error(&self) -> bool {
        matches!(self, Error::Annotation { .. } | Error::MissingGlobalState)
    }
}

/// File name used in diagnostics; falls back to the full path.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_error_message() {
        let err = Error::annotation(Path::new("/tmp/bench/queue.h"), 12, "bad primitive");
        assert_eq!(
            err.to_string(),
            "Spec error in file \"queue.h\", line 12: bad primitive"
        );
        assert!(err.is_annotation_error());
    }
}
