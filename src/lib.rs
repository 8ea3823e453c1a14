//! Counts matches of an XPath expression in a srcML document.
//!
//! [`count`] is the sentinel-returning entry point: a non-negative result is
//! the numeric value of the expression, `-1` means the evaluation failed and
//! `-2` means an input was missing. [`evaluate_count`] is the same pipeline
//! with a typed error.

pub mod document;
pub mod error;
pub mod namespaces;

pub use document::{XmlDocument, XmlNode};
pub use error::{CountError, ErrorKind, INVALID_ARGUMENT, OPERATION_ERROR};

use log::{debug, trace};
use namespaces::SRCML_NAMESPACES;
use srcml_xpath1::XPathContext;
use std::path::Path;

/// Evaluates `xpath` against the srcML document at `file_path`.
///
/// The expression sees the `src` and `cpp` prefixes bound to the srcML
/// namespaces. A negative result is indistinguishable from a failure: both
/// come back as `-1`.
pub fn count(file_path: Option<&str>, xpath: Option<&str>) -> i32 {
    match evaluate_count(file_path.map(Path::new), xpath) {
        Ok(n) => n,
        Err(e) => e.sentinel(),
    }
}

/// Like [`count`], but reports why an evaluation failed.
///
/// Missing inputs are rejected before the file is opened.
pub fn evaluate_count(file_path: Option<&Path>, xpath: Option<&str>) -> Result<i32, CountError> {
    let Some(path) = file_path else {
        debug!("count called without a file path");
        return Err(CountError::InvalidArgument("file path"));
    };
    let Some(xpath) = xpath else {
        debug!("count called without an XPath expression");
        return Err(CountError::InvalidArgument("xpath"));
    };

    let text = std::fs::read_to_string(path).map_err(|source| {
        debug!("Could not read '{}': {}", path.display(), source);
        CountError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    trace!("Read {} bytes from '{}'", text.len(), path.display());

    count_in_str(&text, xpath)
}

/// Evaluates `xpath` against an in-memory srcML document.
pub fn count_in_str(xml: &str, xpath: &str) -> Result<i32, CountError> {
    srcml_xpath1::init();

    let document = XmlDocument::parse(xml).map_err(|e| {
        debug!("Document is not well-formed XML: {}", e);
        e
    })?;

    let mut context = XPathContext::new(document.root_node());
    for (prefix, uri) in SRCML_NAMESPACES {
        context
            .register_namespace(prefix, uri)
            .map_err(|source| {
                debug!("Could not bind '{}' to '{}': {}", prefix, uri, source);
                CountError::Namespace { prefix, source }
            })?;
    }

    let value = context.evaluate(xpath).map_err(|e| {
        debug!("Evaluating '{}' failed: {}", xpath, e);
        e
    })?;
    let number = value.to_number();
    trace!("'{}' evaluated to {:?}, as a number {}", xpath, value, number);

    to_count(number)
}

/// Truncates toward zero; NaN, negative and out-of-range values are not counts.
fn to_count(number: f64) -> Result<i32, CountError> {
    let truncated = number.trunc();
    if truncated.is_nan() || truncated < 0.0 || truncated > f64::from(i32::MAX) {
        debug!("Result {} cannot be reported as a count", number);
        return Err(CountError::NotACount(number));
    }
    Ok(truncated as i32)
}
