//! Item types
//!
//! [`ItemType`] is the lattice the sequence types are built on: `item()` is its
//! top, atomic and node types form trees below it, and the function family
//! (function, map and array types) is ordered structurally. Maps and arrays are
//! functions too: `map(K, V)` behaves like `function(xs:anyAtomicType) as V?`
//! and `array(M)` like `function(xs:integer) as M`.

use crate::{AtomType, Occ, SeqType};
use std::fmt;

/// Kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Any kind (`node()`)
    Any,
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

impl NodeKind {
    /// Keyword of the kind test, without parentheses
    pub const fn keyword(self) -> &'static str {
        match self {
            NodeKind::Any => "node",
            NodeKind::Document => "document-node",
            NodeKind::Element => "element",
            NodeKind::Attribute => "attribute",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::ProcessingInstruction => "processing-instruction",
            NodeKind::Namespace => "namespace-node",
        }
    }

    /// Whether atomizing a node of this kind may yield untyped data
    ///
    /// Comments, processing instructions and namespace nodes atomize to
    /// `xs:string`.
    pub const fn atomizes_untyped(self) -> bool {
        !matches!(
            self,
            NodeKind::Comment | NodeKind::ProcessingInstruction | NodeKind::Namespace
        )
    }

    pub fn subtype_of(self, other: NodeKind) -> bool {
        other == NodeKind::Any || self == other
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.keyword())
    }
}

/// Parameter and return types of a function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<SeqType>,
    pub ret: SeqType,
}

/// Function type; `function(*)` if no signature is given
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncType {
    signature: Option<Signature>,
}

impl FuncType {
    /// Type of all functions
    pub const fn any() -> Self {
        Self { signature: None }
    }

    /// Create a function type with the given signature
    pub fn new(params: Vec<SeqType>, ret: SeqType) -> Self {
        Self {
            signature: Some(Signature { params, ret }),
        }
    }

    /// `None` for `function(*)`
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Number of parameters, unknown for `function(*)`
    pub fn arity(&self) -> Option<usize> {
        self.signature.as_ref().map(|sig| sig.params.len())
    }

    /// Parameters are contravariant, the return type is covariant
    pub fn subtype_of(&self, other: &FuncType) -> bool {
        match (&self.signature, &other.signature) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => {
                a.params.len() == b.params.len()
                    && a.params.iter().zip(&b.params).all(|(pa, pb)| pb.instance_of(pa))
                    && a.ret.instance_of(&b.ret)
            }
        }
    }

    fn union(&self, other: &FuncType) -> FuncType {
        let (Some(a), Some(b)) = (&self.signature, &other.signature) else {
            return FuncType::any();
        };
        if a.params.len() != b.params.len() {
            return FuncType::any();
        }
        let params: Option<Vec<SeqType>> = a
            .params
            .iter()
            .zip(&b.params)
            .map(|(pa, pb)| pa.intersect(pb))
            .collect();
        match params {
            Some(params) => FuncType::new(params, a.ret.union(&b.ret)),
            None => FuncType::any(),
        }
    }

    fn intersect(&self, other: &FuncType) -> Option<FuncType> {
        let (Some(a), Some(b)) = (&self.signature, &other.signature) else {
            return None;
        };
        if a.params.len() != b.params.len() {
            return None;
        }
        let params = a.params.iter().zip(&b.params).map(|(pa, pb)| pa.union(pb)).collect();
        Some(FuncType::new(params, a.ret.intersect(&b.ret)?))
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(sig) = &self.signature else {
            return f.write_str("function(*)");
        };
        f.write_str("function(")?;
        for (i, param) in sig.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") as {}", sig.ret)
    }
}

/// Map type with key and value types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    pub key: AtomType,
    pub value: SeqType,
}

impl MapType {
    pub fn new(key: AtomType, value: SeqType) -> Self {
        Self { key, value }
    }

    /// Type of all maps (`map(*)`)
    pub fn any() -> Self {
        Self::new(AtomType::AnyAtomic, SeqType::item_zm())
    }

    /// The map seen as a lookup function
    pub fn as_func_type(&self) -> FuncType {
        let ret = self.value.with_occ(self.value.occ().union(Occ::ZeroOne));
        FuncType::new(vec![SeqType::atomic()], ret)
    }

    pub fn subtype_of(&self, other: &MapType) -> bool {
        self.key.subtype_of(other.key) && self.value.instance_of(&other.value)
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == MapType::any() {
            f.write_str("map(*)")
        } else {
            write!(f, "map({}, {})", self.key, self.value)
        }
    }
}

/// Array type with its member type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub member: SeqType,
}

impl ArrayType {
    pub fn new(member: SeqType) -> Self {
        Self { member }
    }

    /// Type of all arrays (`array(*)`)
    pub fn any() -> Self {
        Self::new(SeqType::item_zm())
    }

    /// The array seen as a lookup function
    pub fn as_func_type(&self) -> FuncType {
        FuncType::new(vec![SeqType::integer()], self.member.clone())
    }

    pub fn subtype_of(&self, other: &ArrayType) -> bool {
        self.member.instance_of(&other.member)
    }
}

impl fmt::Display for ArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == ArrayType::any() {
            f.write_str("array(*)")
        } else {
            write!(f, "array({})", self.member)
        }
    }
}

/// Type of a single item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    /// Any item (`item()`)
    Item,
    Atomic(AtomType),
    Node(NodeKind),
    Function(FuncType),
    Map(MapType),
    Array(ArrayType),
}

impl ItemType {
    pub fn subtype_of(&self, other: &ItemType) -> bool {
        match (self, other) {
            (_, ItemType::Item) => true,
            (ItemType::Item, _) => false,
            (ItemType::Atomic(a), ItemType::Atomic(b)) => a.subtype_of(*b),
            (ItemType::Node(a), ItemType::Node(b)) => a.subtype_of(*b),
            (ItemType::Function(a), ItemType::Function(b)) => a.subtype_of(b),
            (ItemType::Map(a), ItemType::Map(b)) => a.subtype_of(b),
            (ItemType::Array(a), ItemType::Array(b)) => a.subtype_of(b),
            (ItemType::Map(a), ItemType::Function(b)) => a.as_func_type().subtype_of(b),
            (ItemType::Array(a), ItemType::Function(b)) => a.as_func_type().subtype_of(b),
            _ => false,
        }
    }

    /// Least item type covering both types
    pub fn union(&self, other: &ItemType) -> ItemType {
        if self.subtype_of(other) {
            return other.clone();
        }
        if other.subtype_of(self) {
            return self.clone();
        }
        match (self, other) {
            (ItemType::Atomic(a), ItemType::Atomic(b)) => {
                a.union(*b).map_or(ItemType::Item, ItemType::Atomic)
            }
            (ItemType::Node(_), ItemType::Node(_)) => ItemType::Node(NodeKind::Any),
            (ItemType::Map(a), ItemType::Map(b)) => ItemType::Map(MapType::new(
                a.key.union(b.key).unwrap_or(AtomType::AnyAtomic),
                a.value.union(&b.value),
            )),
            (ItemType::Array(a), ItemType::Array(b)) => {
                ItemType::Array(ArrayType::new(a.member.union(&b.member)))
            }
            (ItemType::Function(a), ItemType::Function(b)) => ItemType::Function(a.union(b)),
            (a, b) if a.is_function() && b.is_function() => ItemType::Function(FuncType::any()),
            _ => ItemType::Item,
        }
    }

    /// Greatest item type covered by both types, `None` if they are disjoint
    pub fn intersect(&self, other: &ItemType) -> Option<ItemType> {
        if self.subtype_of(other) {
            return Some(self.clone());
        }
        if other.subtype_of(self) {
            return Some(other.clone());
        }
        match (self, other) {
            (ItemType::Atomic(a), ItemType::Atomic(b)) => a.intersect(*b).map(ItemType::Atomic),
            (ItemType::Function(a), ItemType::Function(b)) => a.intersect(b).map(ItemType::Function),
            (ItemType::Map(a), ItemType::Map(b)) => Some(ItemType::Map(MapType::new(
                a.key.intersect(b.key)?,
                a.value.intersect(&b.value)?,
            ))),
            (ItemType::Array(a), ItemType::Array(b)) => {
                Some(ItemType::Array(ArrayType::new(a.member.intersect(&b.member)?)))
            }
            // a single-argument function may still be a map or an array
            (ItemType::Map(_) | ItemType::Array(_), ItemType::Function(f))
                if f.arity() == Some(1) =>
            {
                Some(self.clone())
            }
            (ItemType::Function(f), ItemType::Map(_) | ItemType::Array(_))
                if f.arity() == Some(1) =>
            {
                Some(other.clone())
            }
            _ => None,
        }
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, ItemType::Item)
    }

    pub fn as_atomic(&self) -> Option<AtomType> {
        match self {
            ItemType::Atomic(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, ItemType::Atomic(_))
    }

    pub fn is_numeric(&self) -> bool {
        self.as_atomic().is_some_and(AtomType::is_numeric)
    }

    /// Whether instances are, or atomize to, untyped data
    pub fn is_untyped(&self) -> bool {
        match self {
            ItemType::Atomic(t) => t.is_untyped(),
            ItemType::Node(kind) => kind.atomizes_untyped(),
            _ => false,
        }
    }

    pub fn is_namespace_sensitive(&self) -> bool {
        self.as_atomic().is_some_and(AtomType::is_namespace_sensitive)
    }

    pub fn is_list_like(&self) -> bool {
        self.as_atomic().is_some_and(AtomType::is_list_like)
    }

    pub fn is_node(&self) -> bool {
        matches!(self, ItemType::Node(_))
    }

    /// Functions, maps and arrays
    pub fn is_function(&self) -> bool {
        matches!(self, ItemType::Function(_) | ItemType::Map(_) | ItemType::Array(_))
    }

    /// Sequence type with exactly one item of this type
    pub fn seq_type(&self) -> SeqType {
        SeqType::get(self.clone(), Occ::One)
    }
}

impl From<AtomType> for ItemType {
    fn from(t: AtomType) -> Self {
        ItemType::Atomic(t)
    }
}

impl From<NodeKind> for ItemType {
    fn from(kind: NodeKind) -> Self {
        ItemType::Node(kind)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Item => f.write_str("item()"),
            ItemType::Atomic(t) => write!(f, "{}", t),
            ItemType::Node(kind) => write!(f, "{}", kind),
            ItemType::Function(t) => write!(f, "{}", t),
            ItemType::Map(t) => write!(f, "{}", t),
            ItemType::Array(t) => write!(f, "{}", t),
        }
    }
}
