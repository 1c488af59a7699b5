//! Error codes and the error-kind registry
//!
//! Error codes follow the W3C naming scheme: a four letter class followed by a
//! four digit number (`XPTY0004`, `FORG0001`, ...).
//!
//! Each [`ErrorKind`] the type system can raise is mapped to its code and a
//! message template in a static registry. Templates contain `%` placeholders
//! that are filled positionally with the operands of the raised error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error class (the alphabetic prefix of an error code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Static errors
    XPST,
    /// Type errors
    XPTY,
    /// Dynamic errors
    XPDY,
    /// General function errors
    FORG,
    /// Casting errors
    FOCA,
    /// Namespace errors
    FONS,
    /// Function and type errors
    FOTY,
}

impl ErrorClass {
    /// Get the class prefix
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::XPST => "XPST",
            Self::XPTY => "XPTY",
            Self::XPDY => "XPDY",
            Self::FORG => "FORG",
            Self::FOCA => "FOCA",
            Self::FONS => "FONS",
            Self::FOTY => "FOTY",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    class: ErrorClass,
    number: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(class: ErrorClass, number: u16) -> Self {
        Self { class, number }
    }

    /// Get the error class
    pub const fn class(&self) -> ErrorClass {
        self.class
    }

    /// Get the numeric part of the code
    pub const fn number(&self) -> u16 {
        self.number
    }

    /// Check if this is a static error
    pub const fn is_static_error(&self) -> bool {
        matches!(self.class, ErrorClass::XPST)
    }

    /// Check if this is a type error
    pub const fn is_type_error(&self) -> bool {
        matches!(self.class, ErrorClass::XPTY)
    }

    /// Check if this is a dynamic error (raised while evaluating)
    pub const fn is_dynamic_error(&self) -> bool {
        !self.is_static_error() && !self.is_type_error()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.class, self.number)
    }
}

pub const XPST0080: ErrorCode = ErrorCode::new(ErrorClass::XPST, 80);
pub const XPTY0004: ErrorCode = ErrorCode::new(ErrorClass::XPTY, 4);
pub const XPTY0117: ErrorCode = ErrorCode::new(ErrorClass::XPTY, 117);
pub const FORG0001: ErrorCode = ErrorCode::new(ErrorClass::FORG, 1);
pub const FOCA0002: ErrorCode = ErrorCode::new(ErrorClass::FOCA, 2);
pub const FOCA0003: ErrorCode = ErrorCode::new(ErrorClass::FOCA, 3);
pub const FONS0004: ErrorCode = ErrorCode::new(ErrorClass::FONS, 4);
pub const FOTY0013: ErrorCode = ErrorCode::new(ErrorClass::FOTY, 13);

/// The kinds of failure raised by the sequence type system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A value's item count falls outside the allowed occurrence range
    CardinalityViolation,
    /// An item does not match the required item type or refining test
    TypeMismatch,
    /// No cast is defined between the source and the target type
    InvalidCast,
    /// The source value has no valid representation in the target type
    CastImpossible,
    /// The source value exceeds the value space of the target type
    ValueOutOfRange,
    /// An untyped value was promoted towards a namespace-sensitive type
    NamespaceSensitivePromotion,
    /// No function conversion rule applies to the source item
    PromotionImpossible,
    /// Casting to an abstract type such as `xs:anyAtomicType`
    AbstractCastTarget,
    /// A lexical QName uses a prefix without namespace binding
    UnknownPrefix,
    /// A function, map or array was atomized
    FunctionAtomization,
}

impl ErrorKind {
    /// Get the registry entry for this kind
    pub fn info(&self) -> &'static ErrorInfo {
        // every kind is registered below
        ERROR_INFO.get(self).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Get the error code raised for this kind
    pub fn code(&self) -> ErrorCode {
        self.info().code
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CardinalityViolation => "cardinality-violation",
            Self::TypeMismatch => "type-mismatch",
            Self::InvalidCast => "invalid-cast",
            Self::CastImpossible => "cast-impossible",
            Self::ValueOutOfRange => "value-out-of-range",
            Self::NamespaceSensitivePromotion => "namespace-sensitive-promotion",
            Self::PromotionImpossible => "promotion-impossible",
            Self::AbstractCastTarget => "abstract-cast-target",
            Self::UnknownPrefix => "unknown-prefix",
            Self::FunctionAtomization => "function-atomization",
        };
        f.write_str(name)
    }
}

/// Registry entry of an error kind
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Code reported for the error
    pub code: ErrorCode,
    /// Message template with `%` placeholders
    pub template: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(code: ErrorCode, template: &'static str) -> Self {
        Self {
            code,
            template,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Fill the template placeholders with the given operands
    ///
    /// Surplus placeholders are rendered empty, surplus operands are ignored.
    pub fn format<S: AsRef<str>>(&self, operands: &[S]) -> String {
        let mut message = String::with_capacity(self.template.len() + 32);
        let mut operands = operands.iter();
        for ch in self.template.chars() {
            if ch == '%' {
                if let Some(op) = operands.next() {
                    message.push_str(op.as_ref());
                }
            } else {
                message.push(ch);
            }
        }
        message
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new(XPTY0004, "%: %.");

static ERROR_INFO: LazyLock<HashMap<ErrorKind, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    map.insert(ErrorKind::CardinalityViolation, ErrorInfo::new(XPTY0004, "%: %.")
        .with_help("Check the occurrence indicator of the declared type"));
    map.insert(ErrorKind::TypeMismatch, ErrorInfo::new(XPTY0004, "%: %."));
    map.insert(ErrorKind::PromotionImpossible, ErrorInfo::new(XPTY0004, "%: %.")
        .with_help("Only subtype substitution, untyped casting, numeric and URI promotion and function coercion are applied implicitly"));
    map.insert(ErrorKind::InvalidCast, ErrorInfo::new(XPTY0004, "Cannot cast % to %: %."));
    map.insert(ErrorKind::CastImpossible, ErrorInfo::new(FORG0001, "Cannot cast to %: \"%\"."));
    map.insert(ErrorKind::ValueOutOfRange, ErrorInfo::new(FOCA0003, "Value out of range for %: %."));
    map.insert(ErrorKind::NamespaceSensitivePromotion, ErrorInfo::new(XPTY0117, "Cannot promote % to %.")
        .with_help("Untyped data must be cast explicitly to namespace-sensitive types"));
    map.insert(ErrorKind::AbstractCastTarget, ErrorInfo::new(XPST0080, "Cannot cast to abstract type %."));
    map.insert(ErrorKind::UnknownPrefix, ErrorInfo::new(FONS0004, "No namespace declared for prefix '%'."));
    map.insert(ErrorKind::FunctionAtomization, ErrorInfo::new(FOTY0013, "Items of type % cannot be atomized: %."));

    map
});
