//! Built-in atomic types
//!
//! The atomic types form a tree rooted at `xs:anyAtomicType`. Subtyping is
//! derivation along the tree, the union of two types is their closest common
//! ancestor, and two types only intersect if one is derived from the other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in atomic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    /// Root of all atomic types
    AnyAtomic,
    /// Data without type annotation
    UntypedAtomic,

    // === String types ===
    String,
    NormalizedString,
    Token,
    Language,
    NmToken,
    Name,
    NcName,
    /// Whitespace separated list of `xs:NMTOKEN`s
    NmTokens,

    // === Name and URI types ===
    AnyUri,
    QName,
    Notation,

    Boolean,

    // === Numeric types ===
    /// Union of the primitive numeric types
    Numeric,
    Double,
    Float,
    Decimal,
    Integer,
    NonNegativeInteger,
    Long,
    Int,

    // === Temporal types ===
    Date,
    DateTime,
    Time,
}

impl AtomType {
    /// All built-in atomic types
    pub const ALL: [AtomType; 25] = [
        AtomType::AnyAtomic,
        AtomType::UntypedAtomic,
        AtomType::String,
        AtomType::NormalizedString,
        AtomType::Token,
        AtomType::Language,
        AtomType::NmToken,
        AtomType::Name,
        AtomType::NcName,
        AtomType::NmTokens,
        AtomType::AnyUri,
        AtomType::QName,
        AtomType::Notation,
        AtomType::Boolean,
        AtomType::Numeric,
        AtomType::Double,
        AtomType::Float,
        AtomType::Decimal,
        AtomType::Integer,
        AtomType::NonNegativeInteger,
        AtomType::Long,
        AtomType::Int,
        AtomType::Date,
        AtomType::DateTime,
        AtomType::Time,
    ];

    /// Type this type is derived from
    ///
    /// `xs:anyAtomicType` has no parent. `xs:NMTOKENS` is a list type and does
    /// not take part in the atomic hierarchy either.
    pub const fn parent(self) -> Option<AtomType> {
        use AtomType::*;
        match self {
            AnyAtomic | NmTokens => None,
            UntypedAtomic | String | AnyUri | QName | Notation | Boolean | Numeric | Date
            | DateTime | Time => Some(AnyAtomic),
            NormalizedString => Some(String),
            Token => Some(NormalizedString),
            Language | NmToken | Name => Some(Token),
            NcName => Some(Name),
            Double | Float | Decimal => Some(Numeric),
            Integer => Some(Decimal),
            NonNegativeInteger | Long => Some(Integer),
            Int => Some(Long),
        }
    }

    /// Type name with the `xs` prefix
    pub const fn name(self) -> &'static str {
        use AtomType::*;
        match self {
            AnyAtomic => "xs:anyAtomicType",
            UntypedAtomic => "xs:untypedAtomic",
            String => "xs:string",
            NormalizedString => "xs:normalizedString",
            Token => "xs:token",
            Language => "xs:language",
            NmToken => "xs:NMTOKEN",
            Name => "xs:Name",
            NcName => "xs:NCName",
            NmTokens => "xs:NMTOKENS",
            AnyUri => "xs:anyURI",
            QName => "xs:QName",
            Notation => "xs:NOTATION",
            Boolean => "xs:boolean",
            Numeric => "xs:numeric",
            Double => "xs:double",
            Float => "xs:float",
            Decimal => "xs:decimal",
            Integer => "xs:integer",
            NonNegativeInteger => "xs:nonNegativeInteger",
            Long => "xs:long",
            Int => "xs:int",
            Date => "xs:date",
            DateTime => "xs:dateTime",
            Time => "xs:time",
        }
    }

    /// Look up a type by its prefixed name
    pub fn from_name(name: &str) -> Option<AtomType> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Iterate over this type and its ancestors, nearest first
    pub fn ancestors(self) -> impl Iterator<Item = AtomType> {
        std::iter::successors(Some(self), |t| t.parent())
    }

    pub fn subtype_of(self, other: AtomType) -> bool {
        self.ancestors().any(|t| t == other)
    }

    /// Closest common ancestor
    pub fn union(self, other: AtomType) -> Option<AtomType> {
        self.ancestors().find(|t| other.subtype_of(*t))
    }

    pub fn intersect(self, other: AtomType) -> Option<AtomType> {
        if self.subtype_of(other) {
            Some(self)
        } else if other.subtype_of(self) {
            Some(other)
        } else {
            None
        }
    }

    pub fn is_numeric(self) -> bool {
        self.subtype_of(AtomType::Numeric)
    }

    pub fn is_untyped(self) -> bool {
        self == AtomType::UntypedAtomic
    }

    /// Values of namespace-sensitive types can only be built with a set of
    /// in-scope namespaces
    pub fn is_namespace_sensitive(self) -> bool {
        self.subtype_of(AtomType::QName) || self.subtype_of(AtomType::Notation)
    }

    pub fn is_list_like(self) -> bool {
        self == AtomType::NmTokens
    }

    /// Abstract types have no instances of their own
    pub fn is_abstract(self) -> bool {
        matches!(self, AtomType::AnyAtomic | AtomType::Notation)
    }

    pub fn is_string_like(self) -> bool {
        self.subtype_of(AtomType::String)
    }

    pub fn is_integer_like(self) -> bool {
        self.subtype_of(AtomType::Integer)
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_chain() {
        assert!(AtomType::Int.subtype_of(AtomType::Decimal));
        assert!(AtomType::Int.subtype_of(AtomType::Numeric));
        assert!(AtomType::NcName.subtype_of(AtomType::String));
        assert!(AtomType::Date.subtype_of(AtomType::AnyAtomic));
        assert!(!AtomType::Double.subtype_of(AtomType::Decimal));
        assert!(!AtomType::NmTokens.subtype_of(AtomType::AnyAtomic));
    }

    #[test]
    fn test_union() {
        assert_eq!(AtomType::Int.union(AtomType::NonNegativeInteger), Some(AtomType::Integer));
        assert_eq!(AtomType::Double.union(AtomType::Integer), Some(AtomType::Numeric));
        assert_eq!(AtomType::String.union(AtomType::Boolean), Some(AtomType::AnyAtomic));
        assert_eq!(AtomType::Token.union(AtomType::Token), Some(AtomType::Token));
        assert_eq!(AtomType::NmTokens.union(AtomType::String), None);
    }

    #[test]
    fn test_intersect() {
        assert_eq!(AtomType::Decimal.intersect(AtomType::Long), Some(AtomType::Long));
        assert_eq!(AtomType::Numeric.intersect(AtomType::Float), Some(AtomType::Float));
        assert_eq!(AtomType::Float.intersect(AtomType::Decimal), None);
    }

    #[test]
    fn test_predicates() {
        assert!(AtomType::QName.is_namespace_sensitive());
        assert!(AtomType::Notation.is_namespace_sensitive());
        assert!(!AtomType::String.is_namespace_sensitive());
        assert!(AtomType::AnyAtomic.is_abstract());
        assert!(!AtomType::Numeric.is_abstract());
        assert!(AtomType::Long.is_integer_like());
        assert!(AtomType::Language.is_string_like());
        assert!(!AtomType::AnyUri.is_string_like());
    }

    #[test]
    fn test_names_round_trip() {
        for t in AtomType::ALL {
            assert_eq!(AtomType::from_name(t.name()), Some(t));
        }
        assert_eq!(AtomType::from_name("xs:unknown"), None);
    }
}
