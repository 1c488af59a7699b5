//! Sequence types
//!
//! A [`SeqType`] pairs an [`ItemType`] with an occurrence indicator and an
//! optional refining [`KindTest`]. Sequence types are immutable and cheap to
//! clone. The empty-sequence type and the single-occurrence type of every item
//! type are canonical instances shared by all callers.

use crate::{ArrayType, AtomType, FuncType, ItemType, Item, KindTest, MapType, NodeKind, Occ, Value};
use log::trace;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

static EMPTY: Lazy<SeqType> = Lazy::new(|| SeqType::build(ItemType::Item, Occ::Zero, None));

/// Canonical single-occurrence instances, keyed by item type
static SINGLES: Lazy<RwLock<HashMap<ItemType, SeqType>>> = Lazy::new(Default::default);

#[derive(Debug)]
struct SeqTypeData {
    item_type: ItemType,
    occ: Occ,
    test: Option<KindTest>,
}

/// A sequence type
#[derive(Clone)]
pub struct SeqType(Arc<SeqTypeData>);

impl SeqType {
    fn build(item_type: ItemType, occ: Occ, test: Option<KindTest>) -> Self {
        SeqType(Arc::new(SeqTypeData { item_type, occ, test }))
    }

    /// Get the sequence type for an item type and occurrence
    ///
    /// `Occ::One` yields the canonical instance of the item type and
    /// `Occ::Zero` the shared empty-sequence type, whatever the item type.
    pub fn get(item_type: ItemType, occ: Occ) -> Self {
        match occ {
            Occ::Zero => Self::empty(),
            Occ::One => Self::single(item_type),
            _ => Self::build(item_type, occ, None),
        }
    }

    /// Get a sequence type with a refining test
    pub fn get_tested(item_type: ItemType, occ: Occ, test: Option<KindTest>) -> Self {
        match test {
            Some(test) if occ != Occ::Zero => Self::build(item_type, occ, Some(test)),
            _ => Self::get(item_type, occ),
        }
    }

    fn single(item_type: ItemType) -> Self {
        if let Some(found) = SINGLES.read().get(&item_type) {
            return found.clone();
        }
        SINGLES
            .write()
            .entry(item_type)
            .or_insert_with_key(|item_type| {
                trace!("interning sequence type {}", item_type);
                Self::build(item_type.clone(), Occ::One, None)
            })
            .clone()
    }

    /// Check whether two handles share the same instance
    pub fn ptr_eq(a: &SeqType, b: &SeqType) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Item type shared by all items of an instance
    pub fn item_type(&self) -> &ItemType {
        &self.0.item_type
    }

    /// Occurrence indicator
    pub fn occ(&self) -> Occ {
        self.0.occ
    }

    /// Refining name test, if any
    pub fn test(&self) -> Option<&KindTest> {
        self.0.test.as_ref()
    }

    /// Same type with another occurrence indicator
    ///
    /// An empty-sequence type stays what it is when the new indicator admits
    /// zero items.
    pub fn with_occ(&self, occ: Occ) -> SeqType {
        if occ == self.occ() || (self.occ().max() == 0 && occ.min() == 0) {
            return self.clone();
        }
        Self::get_tested(self.item_type().clone(), occ, self.0.test.clone())
    }

    /// Same type with the occurrence of a sequence of the given size
    ///
    /// `None` stands for an unknown size.
    pub fn with_size(&self, size: Option<u64>) -> SeqType {
        self.with_occ(Occ::from_size(size))
    }

    // === Lattice operations ===

    /// Least sequence type covering both types
    pub fn union(&self, other: &SeqType) -> SeqType {
        let occ = self.occ().union(other.occ());
        // the empty sequence contributes no item type
        let (item_type, test) = if self.zero() {
            (other.item_type().clone(), other.0.test.clone())
        } else if other.zero() {
            (self.item_type().clone(), self.0.test.clone())
        } else if self.item_type() == other.item_type() {
            let test = match (self.test(), other.test()) {
                (Some(a), Some(b)) if a.same_as(b) => Some(a.clone()),
                _ => None,
            };
            (self.item_type().clone(), test)
        } else {
            (self.item_type().union(other.item_type()), None)
        };
        Self::get_tested(item_type, occ, test)
    }

    /// Greatest sequence type covered by both types, `None` if they share no
    /// instances
    pub fn intersect(&self, other: &SeqType) -> Option<SeqType> {
        let occ = self.occ().intersect(other.occ())?;
        let item_type = self.item_type().intersect(other.item_type())?;
        let test = match (self.test(), other.test()) {
            (None, test) | (test, None) => test.cloned(),
            (Some(a), Some(b)) if a.same_as(b) => Some(a.clone()),
            (Some(a), Some(b)) => Some(a.intersect(b)?),
        };
        Some(Self::get_tested(item_type, occ, test))
    }

    /// Static subtype check
    ///
    /// Refining tests are only compared for overlap: `element(a)` counts as a
    /// subtype of `element(*:a)` and vice versa.
    pub fn instance_of(&self, other: &SeqType) -> bool {
        if self.zero() {
            return other.may_be_zero();
        }
        (other.item_type().is_universal() || self.item_type().subtype_of(other.item_type()))
            && self.occ().subtype_of(other.occ())
            && match (other.test(), self.test()) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(expected), Some(own)) => own.intersect(expected).is_some(),
            }
    }

    // === Instance checks ===

    /// Check whether a value is an instance of this type
    pub fn instance(&self, value: &Value) -> bool {
        if !self.occ().admits(value.len() as u64) {
            return false;
        }
        match value.first() {
            None => true,
            Some(first) if value.is_homogeneous() => self.instance_item(first),
            Some(_) => value.iter().all(|item| self.instance_item(item)),
        }
    }

    /// Check a single item against the item type and the refining test
    pub fn instance_item(&self, item: &Item) -> bool {
        item.instance_of(self.item_type()) && self.test().is_none_or(|test| test.matches(item))
    }

    // === Cardinality predicates ===

    /// `Some(0)` for the empty-sequence type, `Some(1)` for exactly one item,
    /// `None` otherwise
    pub fn occ_count(&self) -> Option<u64> {
        match self.occ() {
            Occ::Zero => Some(0),
            Occ::One => Some(1),
            _ => None,
        }
    }

    /// Only the empty sequence is an instance
    pub fn zero(&self) -> bool {
        self.occ() == Occ::Zero
    }

    /// Exactly one item
    pub fn one(&self) -> bool {
        self.occ() == Occ::One
    }

    /// At most one item
    pub fn zero_or_one(&self) -> bool {
        self.occ().max() <= 1
    }

    /// At least one item
    pub fn one_or_more(&self) -> bool {
        self.occ().min() >= 1
    }

    /// Whether the empty sequence is an instance
    pub fn may_be_zero(&self) -> bool {
        self.occ().min() == 0
    }

    /// Whether instances may contain numbers
    pub fn may_be_number(&self) -> bool {
        !self.zero()
            && (self.item_type().is_numeric()
                || ItemType::Atomic(AtomType::AnyAtomic).subtype_of(self.item_type()))
    }

    /// Whether instances may contain arrays
    pub fn may_be_array(&self) -> bool {
        !self.zero()
            && (matches!(self.item_type(), ItemType::Array(_))
                || ItemType::Array(ArrayType::any()).subtype_of(self.item_type()))
    }

    // === Rendering ===

    /// Type without occurrence indicator
    pub fn type_string(&self) -> String {
        if self.zero() {
            return "empty-sequence()".to_string();
        }
        match self.test() {
            Some(test) => {
                let kind = match (self.item_type(), test.kind()) {
                    (ItemType::Node(kind), NodeKind::Any) => *kind,
                    (_, kind) => kind,
                };
                format!("{}({})", kind.keyword(), test)
            }
            None => self.item_type().to_string(),
        }
    }

    // === Named types ===

    /// `empty-sequence()`
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    /// `item()`
    pub fn item() -> Self {
        Self::get(ItemType::Item, Occ::One)
    }

    /// `item()?`
    pub fn item_zo() -> Self {
        Self::get(ItemType::Item, Occ::ZeroOne)
    }

    /// `item()*`
    pub fn item_zm() -> Self {
        Self::get(ItemType::Item, Occ::ZeroMore)
    }

    /// `item()+`
    pub fn item_om() -> Self {
        Self::get(ItemType::Item, Occ::OneMore)
    }

    /// `xs:anyAtomicType`
    pub fn atomic() -> Self {
        Self::get(ItemType::Atomic(AtomType::AnyAtomic), Occ::One)
    }

    /// `xs:anyAtomicType?`
    pub fn atomic_zo() -> Self {
        Self::get(ItemType::Atomic(AtomType::AnyAtomic), Occ::ZeroOne)
    }

    /// `xs:anyAtomicType*`
    pub fn atomic_zm() -> Self {
        Self::get(ItemType::Atomic(AtomType::AnyAtomic), Occ::ZeroMore)
    }

    /// `xs:string`
    pub fn string() -> Self {
        Self::get(ItemType::Atomic(AtomType::String), Occ::One)
    }

    /// `xs:string?`
    pub fn string_zo() -> Self {
        Self::get(ItemType::Atomic(AtomType::String), Occ::ZeroOne)
    }

    /// `xs:string*`
    pub fn string_zm() -> Self {
        Self::get(ItemType::Atomic(AtomType::String), Occ::ZeroMore)
    }

    /// `xs:boolean`
    pub fn boolean() -> Self {
        Self::get(ItemType::Atomic(AtomType::Boolean), Occ::One)
    }

    /// `xs:integer`
    pub fn integer() -> Self {
        Self::get(ItemType::Atomic(AtomType::Integer), Occ::One)
    }

    /// `xs:integer?`
    pub fn integer_zo() -> Self {
        Self::get(ItemType::Atomic(AtomType::Integer), Occ::ZeroOne)
    }

    /// `xs:integer*`
    pub fn integer_zm() -> Self {
        Self::get(ItemType::Atomic(AtomType::Integer), Occ::ZeroMore)
    }

    /// `xs:decimal`
    pub fn decimal() -> Self {
        Self::get(ItemType::Atomic(AtomType::Decimal), Occ::One)
    }

    /// `xs:double`
    pub fn double() -> Self {
        Self::get(ItemType::Atomic(AtomType::Double), Occ::One)
    }

    /// `xs:double?`
    pub fn double_zo() -> Self {
        Self::get(ItemType::Atomic(AtomType::Double), Occ::ZeroOne)
    }

    /// `node()`
    pub fn node() -> Self {
        Self::get(ItemType::Node(NodeKind::Any), Occ::One)
    }

    /// `node()?`
    pub fn node_zo() -> Self {
        Self::get(ItemType::Node(NodeKind::Any), Occ::ZeroOne)
    }

    /// `node()*`
    pub fn node_zm() -> Self {
        Self::get(ItemType::Node(NodeKind::Any), Occ::ZeroMore)
    }

    /// `element()*`
    pub fn element_zm() -> Self {
        Self::get(ItemType::Node(NodeKind::Element), Occ::ZeroMore)
    }

    /// `function(*)?`
    pub fn function_zo() -> Self {
        Self::get(ItemType::Function(FuncType::any()), Occ::ZeroOne)
    }

    /// `map(*)?`
    pub fn map_zo() -> Self {
        Self::get(ItemType::Map(MapType::any()), Occ::ZeroOne)
    }

    /// `array(*)?`
    pub fn array_zo() -> Self {
        Self::get(ItemType::Array(ArrayType::any()), Occ::ZeroOne)
    }
}

impl PartialEq for SeqType {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) || (self.zero() && other.zero()) {
            return true;
        }
        self.occ() == other.occ()
            && self.item_type() == other.item_type()
            && match (self.test(), other.test()) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_as(b),
                _ => false,
            }
    }
}

impl Eq for SeqType {}

impl Hash for SeqType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.occ().hash(state);
        if !self.zero() {
            self.item_type().hash(state);
            self.test().hash(state);
        }
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // list types already denote a sequence of tokens
        if self.item_type().is_list_like() {
            return f.write_str(&self.type_string());
        }
        // `function() as xs:int?` would be ambiguous
        if !self.one() && !self.zero() && self.item_type().is_function() {
            write!(f, "({}){}", self.type_string(), self.occ())
        } else {
            write!(f, "{}{}", self.type_string(), self.occ())
        }
    }
}

impl fmt::Debug for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqType({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QName;

    fn atomic(t: AtomType, occ: Occ) -> SeqType {
        SeqType::get(ItemType::Atomic(t), occ)
    }

    #[test]
    fn test_canonical_instances() {
        let a = SeqType::get(ItemType::Atomic(AtomType::Token), Occ::One);
        let b = SeqType::get(ItemType::Atomic(AtomType::Token), Occ::One);
        assert!(SeqType::ptr_eq(&a, &b));

        let empty = SeqType::get(ItemType::Atomic(AtomType::Date), Occ::Zero);
        assert!(SeqType::ptr_eq(&empty, &SeqType::empty()));
        assert_eq!(empty.to_string(), "empty-sequence()");
    }

    #[test]
    fn test_with_occ() {
        let int = SeqType::integer();
        let many = int.with_occ(Occ::ZeroMore);
        assert_eq!(many.to_string(), "xs:integer*");
        assert!(SeqType::ptr_eq(&many.with_occ(Occ::One), &int));

        let empty = SeqType::empty();
        assert!(SeqType::ptr_eq(&empty.with_occ(Occ::ZeroOne), &empty));
        assert_eq!(empty.with_occ(Occ::OneMore).to_string(), "item()+");
    }

    #[test]
    fn test_with_size() {
        let int = SeqType::integer();
        assert_eq!(int.with_size(Some(0)), SeqType::empty());
        assert_eq!(int.with_size(Some(1)), int);
        assert_eq!(int.with_size(Some(5)).occ(), Occ::OneMore);
        assert_eq!(int.with_size(None).occ(), Occ::ZeroMore);
    }

    #[test]
    fn test_union() {
        let u = atomic(AtomType::Integer, Occ::One).union(&atomic(AtomType::Double, Occ::ZeroOne));
        assert_eq!(u.to_string(), "xs:numeric?");
        let u = SeqType::empty().union(&SeqType::string());
        assert_eq!(u, SeqType::string_zo());
    }

    #[test]
    fn test_intersect() {
        let i = SeqType::item_zm().intersect(&atomic(AtomType::Integer, Occ::OneMore));
        assert_eq!(i, Some(atomic(AtomType::Integer, Occ::OneMore)));
        assert_eq!(SeqType::string().intersect(&SeqType::integer()), None);
        assert_eq!(SeqType::empty().intersect(&SeqType::integer()), None);
    }

    #[test]
    fn test_tests_in_lattice() {
        let foo = SeqType::get_tested(
            ItemType::Node(NodeKind::Element),
            Occ::One,
            Some(KindTest::local_name(NodeKind::Element, "foo")),
        );
        let bar = SeqType::get_tested(
            ItemType::Node(NodeKind::Element),
            Occ::One,
            Some(KindTest::local_name(NodeKind::Element, "bar")),
        );
        assert_eq!(foo.intersect(&bar), None);
        assert_eq!(foo.intersect(&SeqType::element_zm()), Some(foo.clone()));
        assert!(foo.instance_of(&SeqType::element_zm()));
        assert!(!SeqType::element_zm().instance_of(&foo.with_occ(Occ::ZeroMore)));
        assert_eq!(foo.union(&bar).to_string(), "element()");
        assert_ne!(foo, bar);
    }

    #[test]
    fn test_instance_of() {
        assert!(SeqType::integer().instance_of(&atomic(AtomType::Decimal, Occ::ZeroMore)));
        assert!(!SeqType::integer_zm().instance_of(&SeqType::integer()));
        assert!(SeqType::string().instance_of(&SeqType::item()));
        assert!(SeqType::empty().instance_of(&SeqType::integer_zo()));
        assert!(!SeqType::empty().instance_of(&SeqType::integer()));
    }

    #[test]
    fn test_instance() {
        let ints: Value = (1..=3).map(|i| Item::from(crate::Atomic::integer(i))).collect();
        assert!(SeqType::integer_zm().instance(&ints));
        assert!(!SeqType::integer_zo().instance(&ints));
        assert!(SeqType::item_zm().instance(&Value::empty()));
        assert!(!SeqType::integer().instance(&Value::empty()));
    }

    #[test]
    fn test_predicates() {
        assert_eq!(SeqType::empty().occ_count(), Some(0));
        assert_eq!(SeqType::integer().occ_count(), Some(1));
        assert_eq!(SeqType::integer_zm().occ_count(), None);
        assert!(SeqType::item_zm().may_be_number());
        assert!(SeqType::atomic().may_be_number());
        assert!(!SeqType::string().may_be_number());
        assert!(SeqType::item().may_be_array());
        assert!(SeqType::function_zo().may_be_array());
        assert!(!SeqType::map_zo().may_be_array());
        assert!(SeqType::integer_zo().zero_or_one());
        assert!(SeqType::item_om().one_or_more());
    }

    #[test]
    fn test_display() {
        assert_eq!(SeqType::function_zo().to_string(), "(function(*))?");
        assert_eq!(SeqType::item_om().to_string(), "item()+");
        let named = SeqType::get_tested(
            ItemType::Node(NodeKind::Element),
            Occ::ZeroOne,
            Some(KindTest::name(NodeKind::Element, QName::local("foo"))),
        );
        assert_eq!(named.type_string(), "element(foo)");
        assert_eq!(named.to_string(), "element(foo)?");
        let any_ns = SeqType::get_tested(
            ItemType::Node(NodeKind::Attribute),
            Occ::One,
            Some(KindTest::namespace(NodeKind::Attribute, "urn:x")),
        );
        assert_eq!(any_ns.to_string(), "attribute(Q{urn:x}*)");
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(SeqType::empty());
        set.insert(SeqType::get_tested(ItemType::Atomic(AtomType::String), Occ::Zero, None));
        set.insert(atomic(AtomType::Integer, Occ::ZeroMore));
        set.insert(SeqType::integer_zm());
        assert_eq!(set.len(), 2);
    }
}
