//! The namespace bindings every srcML query is evaluated with.

pub const SRC_PREFIX: &str = "src";
pub const SRC_NS_URI: &str = "http://www.srcML.org/srcML/src";

/// Preprocessor markup such as `cpp:define` and `cpp:include`.
pub const CPP_PREFIX: &str = "cpp";
pub const CPP_NS_URI: &str = "http://www.srcML.org/srcML/cpp";

/// `(prefix, uri)` pairs in registration order.
pub const SRCML_NAMESPACES: [(&str, &str); 2] = [(SRC_PREFIX, SRC_NS_URI), (CPP_PREFIX, CPP_NS_URI)];
