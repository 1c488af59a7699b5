//! Qualified names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace URI of the XML Schema types
pub const XS_URI: &str = "http://www.w3.org/2001/XMLSchema";
/// Namespace URI of the standard function library
pub const FN_URI: &str = "http://www.w3.org/2005/xpath-functions";
/// Namespace URI bound to the `xml` prefix
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name
///
/// Two names are equal if their namespace URIs and local parts are equal; the
/// prefix is only kept for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    prefix: Option<String>,
    uri: Option<String>,
    local: String,
}

impl QName {
    pub fn new(prefix: Option<&str>, uri: Option<&str>, local: impl Into<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.filter(|u| !u.is_empty()).map(str::to_string),
            local: local.into(),
        }
    }

    /// Name in no namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(None, None, local)
    }

    /// Name in a namespace, without prefix
    pub fn with_uri(uri: &str, local: impl Into<String>) -> Self {
        Self::new(None, Some(uri), local)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.uri) {
            (Some(prefix), _) => write!(f, "{}:{}", prefix, self.local),
            (None, Some(uri)) => write!(f, "Q{{{}}}{}", uri, self.local),
            (None, None) => f.write_str(&self.local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_prefix() {
        let a = QName::new(Some("a"), Some("urn:x"), "foo");
        let b = QName::new(Some("b"), Some("urn:x"), "foo");
        assert_eq!(a, b);
        assert_ne!(a, QName::local("foo"));
    }

    #[test]
    fn test_empty_uri_is_no_namespace() {
        assert_eq!(QName::new(None, Some(""), "foo"), QName::local("foo"));
    }

    #[test]
    fn test_display() {
        assert_eq!(QName::new(Some("xs"), Some(XS_URI), "integer").to_string(), "xs:integer");
        assert_eq!(QName::with_uri("urn:x", "foo").to_string(), "Q{urn:x}foo");
        assert_eq!(QName::local("foo").to_string(), "foo");
    }
}
