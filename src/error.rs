//! Error types for scranwasm

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scranwasm operations
pub type Result<T> = std::result::Result<T, ScranError>;

/// Error types that can occur while building or reading matrices
#[derive(Debug, Error)]
pub enum ScranError {
    /// A buffer or vector does not have the length its dimensions require
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// What was being checked
        what: &'static str,
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Compressed sparse buffers are internally inconsistent
    #[error("Invalid sparse matrix: {0}")]
    InvalidSparse(String),

    /// A subsetting index lies outside the dimension being subset
    #[error("Subset index {index} out of range for {axis} of extent {extent}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Extent of the subset dimension
        extent: usize,
        /// "rows" or "columns"
        axis: &'static str,
    },

    /// Matrices cannot be combined because their shapes disagree
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Operator, function or format name was not recognized
    #[error("Unknown {kind} '{name}'")]
    UnknownOperation {
        /// Category of the name ("arithmetic operation", "math operation", "format")
        kind: &'static str,
        /// The name supplied by the caller
        name: String,
    },

    /// Argument value is not acceptable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A row identity has no counterpart in the reference matrix
    #[error("Row identity {identity} of matrix {matrix} is missing from the reference matrix")]
    MissingIdentity {
        /// Position of the offending matrix in the bind list
        matrix: usize,
        /// The identity that could not be matched
        identity: usize,
    },

    /// A row identity occurs more than once in the same matrix
    #[error("Row identity {identity} is duplicated in matrix {matrix}")]
    DuplicateIdentity {
        /// Position of the offending matrix in the bind list
        matrix: usize,
        /// The duplicated identity
        identity: usize,
    },

    /// Materialization index exceeds the matrix extent
    #[error("{axis} index {index} out of bounds for extent {extent}")]
    OutOfBounds {
        /// Requested index
        index: usize,
        /// Extent of the dimension
        extent: usize,
        /// "Row" or "Column"
        axis: &'static str,
    },

    /// Malformed file contents
    #[error("Parse error at line {line}: {msg}")]
    Parse {
        /// Line number where error occurred (1-based, 0 if unknown)
        line: usize,
        /// Error message
        msg: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised while reading a specific file
    #[error("{}: {source}", path.display())]
    File {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: Box<ScranError>,
    },
}

/// Coarse error classes reported across the foreign-function boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Mismatched buffer or permutation lengths, inconsistent sparse buffers
    Construction = 1,
    /// Bad indices, vector lengths, or names
    Validation = 2,
    /// Row identities could not be reconciled
    Reconciliation = 3,
    /// Malformed or unreadable files
    Io = 4,
    /// Row or column index beyond the extent at materialization time
    OutOfBounds = 5,
    /// The boundary received an id that does not name a live handle
    UnknownHandle = 6,
    /// A panic was caught at the boundary
    Panic = 7,
}

impl ScranError {
    /// Classify this error for status codes at the boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LengthMismatch { .. } | Self::InvalidSparse(_) => ErrorKind::Construction,
            Self::IndexOutOfRange { .. }
            | Self::DimensionMismatch(_)
            | Self::UnknownOperation { .. }
            | Self::InvalidArgument(_) => ErrorKind::Validation,
            Self::MissingIdentity { .. } | Self::DuplicateIdentity { .. } => {
                ErrorKind::Reconciliation
            }
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::Parse { .. } | Self::Io(_) => ErrorKind::Io,
            Self::File { .. } => ErrorKind::Io,
        }
    }

    /// Attach a file path to an error raised while reading that file
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::File { .. } => self,
            other => Self::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = ScranError::LengthMismatch {
            what: "dense buffer",
            expected: 6,
            actual: 5,
        };
        assert_eq!(err.kind(), ErrorKind::Construction);

        let err = ScranError::MissingIdentity {
            matrix: 1,
            identity: 7,
        };
        assert_eq!(err.kind(), ErrorKind::Reconciliation);

        let err = ScranError::Parse {
            line: 3,
            msg: "bad entry".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_file_context_message() {
        let err = ScranError::Parse {
            line: 2,
            msg: "expected 3 fields".to_string(),
        }
        .in_file("counts.mtx");
        assert_eq!(
            err.to_string(),
            "counts.mtx: Parse error at line 2: expected 3 fields"
        );
        assert_eq!(err.kind(), ErrorKind::Io);

        // Context is attached once
        let again = err.in_file("other.mtx");
        assert!(again.to_string().starts_with("counts.mtx"));
    }

    #[test]
    fn test_missing_identity_message() {
        let err = ScranError::MissingIdentity {
            matrix: 2,
            identity: 15,
        };
        assert_eq!(
            err.to_string(),
            "Row identity 15 of matrix 2 is missing from the reference matrix"
        );
    }
}
