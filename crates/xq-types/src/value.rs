//! Runtime values
//!
//! A [`Value`] is an ordered sequence of [`Item`]s. Items are atomic values,
//! nodes, function items, maps or arrays; each one reports its runtime
//! [`ItemType`], which is what sequence types are checked against.

use crate::{ArrayType, AtomType, FuncType, ItemType, MapType, NodeKind, Occ, QName, SeqType};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Index;
use xq_diagnostics::{ErrorBuilder, ErrorKind, XqResult};

/// An atomic value
#[derive(Debug, Clone, PartialEq)]
pub enum Atomic {
    /// Untyped data, e.g. the content of an element
    Untyped(String),
    /// `xs:string` or one of its derived types
    Str { ty: AtomType, value: String },
    AnyUri(String),
    QName(QName),
    Boolean(bool),

    // === Numeric values ===
    Double(f64),
    Float(f32),
    Decimal(Decimal),
    /// `xs:integer` or one of its derived types
    Integer { ty: AtomType, value: i64 },

    // === Temporal values ===
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl Atomic {
    /// Create an `xs:untypedAtomic` value
    pub fn untyped(value: impl Into<String>) -> Self {
        Atomic::Untyped(value.into())
    }

    /// Create an `xs:string` value
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed_string(AtomType::String, value)
    }

    /// Create a string value of a derived string type
    ///
    /// The lexical form is taken as is; use the cast primitive to check facets.
    pub fn typed_string(ty: AtomType, value: impl Into<String>) -> Self {
        Atomic::Str { ty, value: value.into() }
    }

    /// Create an `xs:integer` value
    pub fn integer(value: i64) -> Self {
        Self::typed_integer(AtomType::Integer, value)
    }

    /// Create an integer value of a derived integer type
    pub fn typed_integer(ty: AtomType, value: i64) -> Self {
        Atomic::Integer { ty, value }
    }

    /// Create an `xs:anyURI` value
    pub fn any_uri(value: impl Into<String>) -> Self {
        Atomic::AnyUri(value.into())
    }

    /// Runtime type of the value
    pub fn ty(&self) -> AtomType {
        match self {
            Atomic::Untyped(_) => AtomType::UntypedAtomic,
            Atomic::Str { ty, .. } | Atomic::Integer { ty, .. } => *ty,
            Atomic::AnyUri(_) => AtomType::AnyUri,
            Atomic::QName(_) => AtomType::QName,
            Atomic::Boolean(_) => AtomType::Boolean,
            Atomic::Double(_) => AtomType::Double,
            Atomic::Float(_) => AtomType::Float,
            Atomic::Decimal(_) => AtomType::Decimal,
            Atomic::Date(_) => AtomType::Date,
            Atomic::DateTime(_) => AtomType::DateTime,
            Atomic::Time(_) => AtomType::Time,
        }
    }

    /// Canonical lexical representation
    pub fn string_value(&self) -> String {
        match self {
            Atomic::Untyped(s) | Atomic::Str { value: s, .. } | Atomic::AnyUri(s) => s.clone(),
            Atomic::QName(name) => name.to_string(),
            Atomic::Boolean(b) => b.to_string(),
            Atomic::Double(d) => format_floating(*d),
            Atomic::Float(f) => format_floating(*f),
            Atomic::Decimal(d) => d.normalize().to_string(),
            Atomic::Integer { value, .. } => value.to_string(),
            Atomic::Date(d) => d.format("%Y-%m-%d").to_string(),
            Atomic::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Atomic::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        }
    }

    /// Numeric value as `xs:double`, `None` for non-numeric values
    pub fn to_double(&self) -> Option<f64> {
        match self {
            Atomic::Double(d) => Some(*d),
            Atomic::Float(f) => Some(f64::from(*f)),
            Atomic::Decimal(d) => d.to_f64(),
            Atomic::Integer { value, .. } => value.to_f64(),
            _ => None,
        }
    }

    /// Numeric value as `xs:float`, `None` for non-numeric values
    pub fn to_float(&self) -> Option<f32> {
        match self {
            Atomic::Double(d) => Some(*d as f32),
            Atomic::Float(f) => Some(*f),
            Atomic::Decimal(d) => d.to_f32(),
            Atomic::Integer { value, .. } => value.to_f32(),
            _ => None,
        }
    }
}

/// Renders a double or float the way the `xs:double` canonical form reads
fn format_floating<T>(value: T) -> String
where
    T: Into<f64> + fmt::Display + fmt::UpperExp + Copy,
{
    let as_double: f64 = value.into();
    if as_double.is_nan() {
        return "NaN".to_string();
    }
    if as_double.is_infinite() {
        return if as_double > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if as_double == 0.0 {
        return if as_double.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    if (1e-6..1e6).contains(&as_double.abs()) {
        return value.to_string();
    }
    let scientific = format!("{:E}", value);
    match scientific.split_once('E') {
        Some((mantissa, exp)) if !mantissa.contains('.') => format!("{}.0E{}", mantissa, exp),
        _ => scientific,
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl fmt::Display for Atomic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atomic::Untyped(s) => f.write_str(&quote(s)),
            Atomic::Str { ty: AtomType::String, value } => f.write_str(&quote(value)),
            Atomic::Integer { ty: AtomType::Integer, value } => write!(f, "{}", value),
            Atomic::Boolean(b) => write!(f, "{}()", b),
            Atomic::Decimal(_) => {
                let lexical = self.string_value();
                if lexical.contains('.') {
                    f.write_str(&lexical)
                } else {
                    write!(f, "{}.0", lexical)
                }
            }
            _ => write!(f, "{}({})", self.ty(), quote(&self.string_value())),
        }
    }
}

/// A node
///
/// Only the properties the type system looks at are kept: the kind, the name
/// and the string value.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    name: Option<QName>,
    content: String,
}

impl Node {
    fn new(kind: NodeKind, name: Option<QName>, content: impl Into<String>) -> Self {
        Self {
            kind,
            name,
            content: content.into(),
        }
    }

    pub fn document(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Document, None, content)
    }

    pub fn element(name: QName, content: impl Into<String>) -> Self {
        Self::new(NodeKind::Element, Some(name), content)
    }

    pub fn attribute(name: QName, value: impl Into<String>) -> Self {
        Self::new(NodeKind::Attribute, Some(name), value)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, None, content)
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Comment, None, content)
    }

    pub fn processing_instruction(target: &str, content: impl Into<String>) -> Self {
        Self::new(NodeKind::ProcessingInstruction, Some(QName::local(target)), content)
    }

    pub fn namespace(prefix: &str, uri: impl Into<String>) -> Self {
        Self::new(NodeKind::Namespace, Some(QName::local(prefix)), uri)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    pub fn string_value(&self) -> &str {
        &self.content
    }

    /// Typed value of the node
    pub fn atomize(&self) -> Atomic {
        if self.kind.atomizes_untyped() {
            Atomic::Untyped(self.content.clone())
        } else {
            Atomic::string(self.content.clone())
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_ref().map(ToString::to_string).unwrap_or_default();
        match self.kind {
            NodeKind::Element => write!(f, "<{}>{}</{}>", name, self.content, name),
            NodeKind::Attribute => write!(f, "{}={}", name, quote(&self.content)),
            NodeKind::Comment => write!(f, "<!--{}-->", self.content),
            NodeKind::ProcessingInstruction => write!(f, "<?{} {}?>", name, self.content),
            NodeKind::Namespace => write!(f, "xmlns:{}={}", name, quote(&self.content)),
            NodeKind::Document => write!(f, "document {{ {} }}", quote(&self.content)),
            NodeKind::Text | NodeKind::Any => f.write_str(&self.content),
        }
    }
}

/// A function item
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionItem {
    name: Option<QName>,
    ty: FuncType,
    coerced_from: Option<Box<Item>>,
}

impl FunctionItem {
    pub fn new(name: Option<QName>, params: Vec<SeqType>, ret: SeqType) -> Self {
        Self {
            name,
            ty: FuncType::new(params, ret),
            coerced_from: None,
        }
    }

    /// Wrap a function-like item so that it is seen with another signature
    pub fn coerced(source: Item, ty: FuncType) -> Self {
        let name = match &source {
            Item::Function(f) => f.name.clone(),
            _ => None,
        };
        Self {
            name,
            ty,
            coerced_from: Some(Box::new(source)),
        }
    }

    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    pub fn arity(&self) -> usize {
        self.ty.arity().unwrap_or_default()
    }

    /// Item this function was coerced from
    pub fn coerced_from(&self) -> Option<&Item> {
        self.coerced_from.as_deref()
    }
}

impl fmt::Display for FunctionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}#{}", name, self.arity()),
            None => write!(f, "(anonymous-function)#{}", self.arity()),
        }
    }
}

/// A map item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapItem {
    entries: Vec<(Atomic, Value)>,
}

impl MapItem {
    pub fn new(entries: Vec<(Atomic, Value)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(Atomic, Value)] {
        &self.entries
    }

    /// Most specific map type describing the entries
    pub fn content_type(&self) -> MapType {
        let key = self
            .entries
            .iter()
            .map(|(k, _)| k.ty())
            .reduce(|a, b| a.union(b).unwrap_or(AtomType::AnyAtomic))
            .unwrap_or(AtomType::AnyAtomic);
        let value = self
            .entries
            .iter()
            .map(|(_, v)| v.static_type())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(SeqType::empty);
        MapType::new(key, value)
    }
}

impl fmt::Display for MapItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("map{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", key, value)?;
        }
        f.write_str("}")
    }
}

/// An array item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayItem {
    members: Vec<Value>,
}

impl ArrayItem {
    pub fn new(members: Vec<Value>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Most specific array type describing the members
    pub fn content_type(&self) -> ArrayType {
        let member = self
            .members
            .iter()
            .map(Value::static_type)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(SeqType::empty);
        ArrayType::new(member)
    }
}

impl fmt::Display for ArrayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str("]")
    }
}

/// A single item of a sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Atomic(Atomic),
    Node(Node),
    Function(FunctionItem),
    Map(MapItem),
    Array(ArrayItem),
}

impl Item {
    /// Runtime type of the item
    ///
    /// Maps and arrays report `map(*)` and `array(*)`; their content is only
    /// inspected by [`Item::instance_of`].
    pub fn runtime_type(&self) -> ItemType {
        match self {
            Item::Atomic(a) => ItemType::Atomic(a.ty()),
            Item::Node(n) => ItemType::Node(n.kind()),
            Item::Function(f) => ItemType::Function(f.ty().clone()),
            Item::Map(_) => ItemType::Map(MapType::any()),
            Item::Array(_) => ItemType::Array(ArrayType::any()),
        }
    }

    /// Check whether the item is an instance of an item type
    pub fn instance_of(&self, ty: &ItemType) -> bool {
        match (self, ty) {
            (_, ItemType::Item) => true,
            (Item::Map(m), ItemType::Map(mt)) => m
                .entries()
                .iter()
                .all(|(k, v)| k.ty().subtype_of(mt.key) && mt.value.instance(v)),
            (Item::Array(a), ItemType::Array(at)) => a.members().iter().all(|m| at.member.instance(m)),
            (Item::Map(m), _) => ItemType::Map(m.content_type()).subtype_of(ty),
            (Item::Array(a), _) => ItemType::Array(a.content_type()).subtype_of(ty),
            _ => self.runtime_type().subtype_of(ty),
        }
    }

    /// Functions, maps and arrays
    pub fn is_function(&self) -> bool {
        matches!(self, Item::Function(_) | Item::Map(_) | Item::Array(_))
    }

    /// Atomize the item
    ///
    /// Arrays are atomized member by member; function items and maps cannot be
    /// atomized.
    pub fn atomize(&self) -> XqResult<Vec<Atomic>> {
        match self {
            Item::Atomic(a) => Ok(vec![a.clone()]),
            Item::Node(n) => Ok(vec![n.atomize()]),
            Item::Array(a) => {
                let mut atoms = Vec::new();
                for member in a.members() {
                    for item in member.iter() {
                        atoms.extend(item.atomize()?);
                    }
                }
                Ok(atoms)
            }
            Item::Function(_) | Item::Map(_) => Err(ErrorBuilder::new(ErrorKind::FunctionAtomization)
                .operand(self.runtime_type())
                .operand(self)
                .build()),
        }
    }

    /// Coerce a function-like item to a function type
    ///
    /// With `optimize` set, items already matching the target type are
    /// returned unchanged instead of being wrapped.
    pub fn coerce_to(&self, target: &FuncType, optimize: bool) -> XqResult<Item> {
        let arity = match self {
            Item::Function(f) => f.arity(),
            Item::Map(_) | Item::Array(_) => 1,
            _ => return Err(self.coercion_error(target)),
        };
        let Some(expected) = target.arity() else {
            return Ok(self.clone());
        };
        if arity != expected {
            return Err(self.coercion_error(target));
        }
        if optimize && self.instance_of(&ItemType::Function(target.clone())) {
            return Ok(self.clone());
        }
        Ok(Item::Function(FunctionItem::coerced(self.clone(), target.clone())))
    }

    fn coercion_error(&self, target: &FuncType) -> xq_diagnostics::XqError {
        ErrorBuilder::new(ErrorKind::PromotionImpossible)
            .text(format!("Cannot coerce {} to {}", self.runtime_type(), target))
            .operand(self)
            .build()
    }

    /// Lexical form used in cast error messages
    pub fn lexical(&self) -> String {
        match self {
            Item::Atomic(a) => a.string_value(),
            Item::Node(n) => n.string_value().to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<Atomic> for Item {
    fn from(atomic: Atomic) -> Self {
        Item::Atomic(atomic)
    }
}

impl From<Node> for Item {
    fn from(node: Node) -> Self {
        Item::Node(node)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Atomic(a) => write!(f, "{}", a),
            Item::Node(n) => write!(f, "{}", n),
            Item::Function(func) => write!(f, "{}", func),
            Item::Map(m) => write!(f, "{}", m),
            Item::Array(a) => write!(f, "{}", a),
        }
    }
}

/// A sequence of items
///
/// A value is homogeneous if it is non-empty and all its items are atomic
/// values of the same type; checking the first item then answers type
/// questions for the whole sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value {
    items: SmallVec<[Item; 1]>,
    homogeneous: bool,
}

impl Value {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self::from_smallvec(items.into_iter().collect())
    }

    fn from_smallvec(items: SmallVec<[Item; 1]>) -> Self {
        let homogeneous = match items.first() {
            Some(Item::Atomic(first)) => {
                let ty = first.ty();
                items.iter().all(|item| matches!(item, Item::Atomic(a) if a.ty() == ty))
            }
            _ => false,
        };
        Self { items, homogeneous }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn into_items(self) -> SmallVec<[Item; 1]> {
        self.items
    }

    /// Most specific sequence type describing this value
    pub fn static_type(&self) -> SeqType {
        let ty = match (self.first(), self.homogeneous) {
            (None, _) => return SeqType::empty(),
            (Some(first), true) => first.runtime_type(),
            (Some(first), false) => self
                .iter()
                .skip(1)
                .fold(first.runtime_type(), |ty, item| ty.union(&item.runtime_type())),
        };
        SeqType::get(ty, Occ::from_size(Some(self.len() as u64)))
    }
}

impl Index<usize> for Value {
    type Output = Item;

    fn index(&self, index: usize) -> &Item {
        &self.items[index]
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        Self::from_smallvec(smallvec::smallvec![item])
    }
}

impl From<Atomic> for Value {
    fn from(atomic: Atomic) -> Self {
        Self::from(Item::Atomic(atomic))
    }
}

impl FromIterator<Item> for Value {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<'a> IntoIterator for &'a Value {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.as_slice() {
            [] => f.write_str("()"),
            [item] => write!(f, "{}", item),
            items => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Collects items into a new [`Value`]
#[derive(Debug, Default)]
pub struct ValueBuilder {
    items: SmallVec<[Item; 1]>,
}

impl ValueBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: SmallVec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Append all items of a value
    pub fn extend_value(&mut self, value: Value) {
        self.items.extend(value.into_items());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn build(self) -> Value {
        Value::from_smallvec(self.items)
    }
}
