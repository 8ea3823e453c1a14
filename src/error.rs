use srcml_xpath1::XPathError;
use std::path::PathBuf;
use thiserror::Error;

/// Returned by [`crate::count`] when an input is absent.
pub const INVALID_ARGUMENT: i32 = -2;
/// Returned by [`crate::count`] when any step of the evaluation fails.
pub const OPERATION_ERROR: i32 = -1;

/// The two ways a count can fail, as seen by callers of [`crate::count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Operation,
}

#[derive(Error, Debug)]
pub enum CountError {
    #[error("Missing required argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("Failed to register namespace prefix '{prefix}': {source}")]
    Namespace {
        prefix: &'static str,
        #[source]
        source: XPathError,
    },

    #[error("XPath evaluation error: {0}")]
    XPath(#[from] XPathError),

    #[error("Result {0} is not a non-negative integer count")]
    NotACount(f64),
}

impl CountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CountError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            _ => ErrorKind::Operation,
        }
    }

    /// The integer [`crate::count`] reports for this error.
    pub fn sentinel(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidArgument => INVALID_ARGUMENT,
            ErrorKind::Operation => OPERATION_ERROR,
        }
    }
}
