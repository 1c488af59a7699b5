//! Static context consulted by casts and promotions

use crate::cast::is_ncname;
use crate::{FN_URI, QName, XML_URI, XS_URI};
use indexmap::IndexMap;
use xq_diagnostics::{DEFAULT_MAX_OPERAND_CHARS, ErrorBuilder, ErrorKind, XqResult};

/// Conversion context
///
/// Holds the in-scope namespaces needed to build namespace-sensitive values
/// and the rendering limit for error operands.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Prefix to URI bindings, in declaration order
    namespaces: IndexMap<String, String>,
    default_element_namespace: Option<String>,
    max_operand_chars: usize,
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionContext {
    /// Create a context with the predeclared `xs`, `fn` and `xml` prefixes
    pub fn new() -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert("xs".to_string(), XS_URI.to_string());
        namespaces.insert("fn".to_string(), FN_URI.to_string());
        namespaces.insert("xml".to_string(), XML_URI.to_string());
        Self {
            namespaces,
            default_element_namespace: None,
            max_operand_chars: DEFAULT_MAX_OPERAND_CHARS,
        }
    }

    /// Bind a prefix, replacing an existing binding
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_default_element_namespace(mut self, uri: impl Into<String>) -> Self {
        self.default_element_namespace = Some(uri.into());
        self
    }

    /// Set the truncation limit for values rendered into error messages
    pub fn with_max_operand_chars(mut self, max: usize) -> Self {
        self.max_operand_chars = max;
        self
    }

    /// Get the URI bound to a prefix
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    pub fn namespaces(&self) -> &IndexMap<String, String> {
        &self.namespaces
    }

    pub fn default_element_namespace(&self) -> Option<&str> {
        self.default_element_namespace.as_deref()
    }

    pub fn max_operand_chars(&self) -> usize {
        self.max_operand_chars
    }

    /// Start an error of the given kind using this context's rendering limit
    pub fn error(&self, kind: ErrorKind) -> ErrorBuilder {
        ErrorBuilder::new(kind).limit(self.max_operand_chars)
    }

    /// Resolve a lexical QName against the in-scope namespaces
    ///
    /// Unprefixed names are placed in the default element namespace.
    pub fn resolve_qname(&self, lexical: &str) -> XqResult<QName> {
        let (prefix, local) = match lexical.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, lexical),
        };
        if !is_ncname(local) || prefix.is_some_and(|p| !is_ncname(p)) {
            return Err(self.error(ErrorKind::CastImpossible).operand("xs:QName").operand(lexical).build());
        }
        match prefix {
            Some(prefix) => {
                let uri = self
                    .namespace(prefix)
                    .ok_or_else(|| self.error(ErrorKind::UnknownPrefix).operand(prefix).build())?;
                Ok(QName::new(Some(prefix), Some(uri), local))
            }
            None => Ok(QName::new(None, self.default_element_namespace(), local)),
        }
    }
}

/// Options of a promotion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromoteOptions {
    /// Return function items unchanged when they already match the target
    /// function type instead of wrapping them
    pub optimize: bool,
}

impl PromoteOptions {
    pub const fn optimized() -> Self {
        Self { optimize: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predeclared_prefixes() {
        let ctx = ConversionContext::new();
        assert_eq!(ctx.namespace("xs"), Some(XS_URI));
        assert_eq!(ctx.namespace("xml"), Some(XML_URI));
        assert_eq!(ctx.namespace("foo"), None);
        assert_eq!(ctx.max_operand_chars(), DEFAULT_MAX_OPERAND_CHARS);
    }

    #[test]
    fn test_resolve_qname() {
        let ctx = ConversionContext::new()
            .with_namespace("a", "urn:a")
            .with_default_element_namespace("urn:default");

        let name = ctx.resolve_qname("a:foo").unwrap();
        assert_eq!(name, QName::with_uri("urn:a", "foo"));
        assert_eq!(name.to_string(), "a:foo");
        assert_eq!(ctx.resolve_qname("foo").unwrap(), QName::with_uri("urn:default", "foo"));

        let err = ctx.resolve_qname("b:foo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPrefix);
        assert_eq!(err.message(), "No namespace declared for prefix 'b'.");

        let err = ctx.resolve_qname("1foo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CastImpossible);
    }

    #[test]
    fn test_namespace_order_is_kept() {
        let ctx = ConversionContext::new().with_namespace("z", "urn:z").with_namespace("a", "urn:a");
        let prefixes: Vec<&str> = ctx.namespaces().keys().map(String::as_str).collect();
        assert_eq!(prefixes, vec!["xs", "fn", "xml", "z", "a"]);
    }
}
