//! Structured errors raised by the type system

use crate::{ErrorCode, ErrorKind, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default limit for the rendering of a single error operand
pub const DEFAULT_MAX_OPERAND_CHARS: usize = 64;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Evaluation cannot proceed
    Error,
    /// Potential issue, evaluation can continue
    Warning,
    /// Informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A reportable message with location and context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    pub location: Option<SourceLocation>,
    /// Additional help
    pub help: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
            help: None,
            related: Vec::new(),
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add related information
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Related diagnostic information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedInfo {
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }
}

/// Main error type of the query runtime
///
/// The variant reflects the category of the error code; the [`ErrorKind`]
/// identifies the failure independently of its rendering.
#[derive(Debug, Clone, Error)]
pub enum XqError {
    /// Static error, detectable without evaluating
    #[error("{code}: {message}")]
    Static {
        kind: ErrorKind,
        code: ErrorCode,
        message: String,
        location: Option<SourceLocation>,
        context: Option<String>,
    },

    /// Type error
    #[error("{code}: {message}")]
    Type {
        kind: ErrorKind,
        code: ErrorCode,
        message: String,
        location: Option<SourceLocation>,
        context: Option<String>,
    },

    /// Dynamic error
    #[error("{code}: {message}")]
    Dynamic {
        kind: ErrorKind,
        code: ErrorCode,
        message: String,
        location: Option<SourceLocation>,
        context: Option<String>,
    },
}

impl XqError {
    /// Raise an error of the given kind
    ///
    /// The operands are rendered into the registered message template of the kind.
    pub fn raise(kind: ErrorKind, operands: &[&dyn fmt::Display]) -> Self {
        operands
            .iter()
            .fold(ErrorBuilder::new(kind), |builder, op| builder.operand(op))
            .build()
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Static { kind, .. } | Self::Type { kind, .. } | Self::Dynamic { kind, .. } => *kind,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Static { code, .. } | Self::Type { code, .. } | Self::Dynamic { code, .. } => *code,
        }
    }

    /// Get the rendered message
    pub fn message(&self) -> &str {
        match self {
            Self::Static { message, .. }
            | Self::Type { message, .. }
            | Self::Dynamic { message, .. } => message,
        }
    }

    /// Get the location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Static { location, .. }
            | Self::Type { location, .. }
            | Self::Dynamic { location, .. } => location.as_ref(),
        }
    }

    /// Get the context (usually the name of the binding that failed)
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Static { context, .. }
            | Self::Type { context, .. }
            | Self::Dynamic { context, .. } => context.as_deref(),
        }
    }

    /// Attach a source location, keeping an existing one
    pub fn at(mut self, loc: SourceLocation) -> Self {
        match &mut self {
            Self::Static { location, .. }
            | Self::Type { location, .. }
            | Self::Dynamic { location, .. } => {
                location.get_or_insert(loc);
            }
        }
        self
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.message());
        if let Some(loc) = self.location() {
            diag = diag.with_location(loc.clone());
        }
        if let Some(help) = self.kind().info().help {
            diag = diag.with_help(help);
        }
        if let Some(ctx) = self.context() {
            diag = diag.with_related(RelatedInfo::new(format!("while binding {}", ctx)));
        }
        diag
    }
}

/// Builder for raising errors with a fluent API
pub struct ErrorBuilder {
    kind: ErrorKind,
    operands: Vec<String>,
    max_operand_chars: usize,
    location: Option<SourceLocation>,
    context: Option<String>,
}

impl ErrorBuilder {
    /// Create a new error builder
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            operands: Vec::new(),
            max_operand_chars: DEFAULT_MAX_OPERAND_CHARS,
            location: None,
            context: None,
        }
    }

    /// Set the truncation limit for operands added afterwards
    pub fn limit(mut self, max_operand_chars: usize) -> Self {
        self.max_operand_chars = max_operand_chars;
        self
    }

    /// Add the next template operand
    pub fn operand(mut self, operand: impl fmt::Display) -> Self {
        self.operands.push(chop(&operand.to_string(), self.max_operand_chars));
        self
    }

    /// Add the next template operand without truncating it
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.operands.push(text.into());
        self
    }

    /// Set the source location
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add context information
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Build the error
    pub fn build(self) -> XqError {
        let info = self.kind.info();
        let message = info.format(&self.operands);
        let (kind, code, location, context) = (self.kind, info.code, self.location, self.context);
        if code.is_static_error() {
            XqError::Static { kind, code, message, location, context }
        } else if code.is_type_error() {
            XqError::Type { kind, code, message, location, context }
        } else {
            XqError::Dynamic { kind, code, message, location, context }
        }
    }
}

/// Shorten a string to at most `max` characters, marking the cut with `...`
pub fn chop(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut chopped: String = text.chars().take(max.saturating_sub(3)).collect();
    chopped.push_str("...");
    chopped
}
