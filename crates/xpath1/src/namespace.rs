//! Prefix-to-URI bindings used to resolve prefixed name tests such as `src:unit`.

use crate::error::XPathError;
use crate::parser::is_nc_name;
use std::collections::HashMap;

/// The namespace every XML processor binds to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace bindings in effect while an expression is evaluated.
///
/// Prefixes in an XPath expression are resolved against these bindings, never
/// against the declarations inside the queried document. The `xml` prefix is
/// always bound.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    bindings: HashMap<String, String>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri`, replacing any earlier binding for the prefix.
    pub fn register(&mut self, prefix: &str, uri: &str) -> Result<(), XPathError> {
        let reject = |message: &str| {
            Err(XPathError::InvalidNamespace {
                prefix: prefix.to_string(),
                message: message.to_string(),
            })
        };
        if prefix.is_empty() {
            return reject("prefix must not be empty");
        }
        if prefix == "xmlns" {
            return reject("the 'xmlns' prefix is reserved");
        }
        if !is_nc_name(prefix) {
            return reject("prefix is not a valid NCName");
        }
        if uri.is_empty() {
            return reject("namespace URI must not be empty");
        }
        if prefix == "xml" && uri != XML_NAMESPACE {
            return reject("the 'xml' prefix cannot be rebound");
        }
        log::trace!("Binding namespace prefix '{}' to '{}'", prefix, uri);
        self.bindings.insert(prefix.to_string(), uri.to_string());
        Ok(())
    }

    /// Looks up the URI bound to `prefix`.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        match self.bindings.get(prefix) {
            Some(uri) => Some(uri.as_str()),
            None if prefix == "xml" => Some(XML_NAMESPACE),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
