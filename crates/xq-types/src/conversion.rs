//! Runtime checks and conversions of values against sequence types
//!
//! - `treat` asserts that a value matches a type and never changes it
//! - `cast` converts every item explicitly to the target type
//! - `promote` applies the implicit function conversion rules used when
//!   binding arguments and returning function results
//!
//! Failures are raised as [`XqError`]s without location; callers attach one
//! with [`XqError::at`].

use crate::{
    AtomType, Atomic, ConversionContext, Item, ItemType, Occ, PromoteOptions, QName, SeqType, Value, ValueBuilder,
};
use log::{debug, trace};
use xq_diagnostics::{ErrorBuilder, ErrorKind, XqError, XqResult};

impl SeqType {
    /// Check that a value is an instance of this type
    pub fn treat(&self, value: &Value, binding: Option<&QName>) -> XqResult<()> {
        if value.static_type().instance_of(self) {
            return Ok(());
        }
        if !self.occ().admits(value.len() as u64) {
            return Err(self.type_error(ErrorKind::CardinalityViolation, value, binding, ErrorBuilder::new));
        }
        if self.instance(value) {
            Ok(())
        } else {
            Err(self.type_error(ErrorKind::TypeMismatch, value, binding, ErrorBuilder::new))
        }
    }

    /// Cast a single item to the item type
    ///
    /// Items whose runtime type already equals the item type are returned
    /// unchanged. Every item produced by the cast must pass the refining test.
    pub fn cast_item(&self, item: &Item, ctx: &ConversionContext) -> XqResult<Value> {
        if item.runtime_type() == *self.item_type() {
            return Ok(Value::from(item.clone()));
        }
        let value = self.item_type().cast(item, ctx)?;
        if let Some(test) = self.test() {
            if value.iter().any(|result| !test.matches(result)) {
                return Err(ctx
                    .error(ErrorKind::CastImpossible)
                    .operand(self.type_string())
                    .operand(item.lexical())
                    .build());
            }
        }
        Ok(value)
    }

    /// Speculative cast of a single item, `None` if the cast fails
    pub fn try_cast_item(&self, item: &Item, ctx: &ConversionContext) -> Option<Value> {
        self.cast_item(item, ctx).ok()
    }

    /// Cast a value to this type
    pub fn cast(&self, value: &Value, ctx: &ConversionContext) -> XqResult<Value> {
        if !self.occ().admits(value.len() as u64) {
            return Err(ctx
                .error(ErrorKind::CardinalityViolation)
                .text(format!("Cannot cast {} to {}", value.static_type(), self))
                .operand(value)
                .build());
        }
        match value.len() {
            0 => Ok(Value::empty()),
            1 => self.cast_item(&value[0], ctx),
            size => {
                let mut builder = ValueBuilder::with_capacity(size);
                for item in value {
                    builder.extend_value(self.cast_item(item, ctx)?);
                }
                Ok(builder.build())
            }
        }
    }

    /// Check whether a value can be cast to this type
    pub fn castable(&self, value: &Value, ctx: &ConversionContext) -> bool {
        self.cast(value, ctx).is_ok()
    }

    /// Promote a value to this type
    ///
    /// Items that already match are kept; the others are converted by the
    /// function conversion rules. The value is returned as is if no item
    /// needed a conversion.
    pub fn promote(
        &self,
        value: Value,
        binding: Option<&QName>,
        ctx: &ConversionContext,
        opts: PromoteOptions,
    ) -> XqResult<Value> {
        let size = value.len();
        if !self.occ().admits(size as u64) {
            return Err(self.type_error(ErrorKind::CardinalityViolation, &value, binding, |kind| ctx.error(kind)));
        }
        if size == 0 {
            return Ok(value);
        }

        let mut builder: Option<ValueBuilder> = None;
        for i in 0..size {
            let item = &value[i];
            if self.instance_item(item) {
                // a homogeneous value matches as a whole
                if i == 0 && value.is_homogeneous() {
                    return Ok(value);
                }
                if let Some(builder) = builder.as_mut() {
                    builder.push(item.clone());
                }
            } else {
                let builder = builder.get_or_insert_with(|| {
                    let mut builder = ValueBuilder::with_capacity(size);
                    value.iter().take(i).for_each(|prev| builder.push(prev.clone()));
                    builder
                });
                self.promote_item(item, binding, builder, ctx, opts)?;
            }
        }

        match builder {
            // atomization may change the number of items
            Some(builder) if !self.occ().admits(builder.len() as u64) => {
                Err(self.type_error(ErrorKind::CardinalityViolation, &value, binding, |kind| ctx.error(kind)))
            }
            Some(builder) => {
                debug!("promoted {} items to {}", size, self);
                Ok(builder.build())
            }
            None => Ok(value),
        }
    }

    fn promote_item(
        &self,
        item: &Item,
        binding: Option<&QName>,
        out: &mut ValueBuilder,
        ctx: &ConversionContext,
        opts: PromoteOptions,
    ) -> XqResult<()> {
        match self.item_type() {
            ItemType::Atomic(target) => {
                for atom in item.atomize()? {
                    let source = atom.ty();
                    if source.subtype_of(*target) {
                        out.push(Item::Atomic(atom));
                    } else if source.is_untyped() {
                        if target.is_namespace_sensitive() {
                            return Err(ctx
                                .error(ErrorKind::NamespaceSensitivePromotion)
                                .operand(item.runtime_type())
                                .operand(target)
                                .build());
                        }
                        trace!("promoting untyped value to {}", target);
                        out.extend_value(target.cast(&atom, ctx)?);
                    } else if let Some(promoted) = promote_atomic(&atom, *target) {
                        trace!("promoting {} to {}", source, target);
                        out.push(Item::Atomic(promoted));
                    } else {
                        return Err(self.item_error(item, binding, ctx));
                    }
                }
                Ok(())
            }
            ItemType::Function(target) if item.is_function() => {
                trace!("coercing {} to {}", item.runtime_type(), target);
                out.push(item.coerce_to(target, opts.optimize)?);
                Ok(())
            }
            _ => Err(self.item_error(item, binding, ctx)),
        }
    }

    /// Check whether instances of this type may be promoted to `target`
    pub fn promotable(&self, target: &SeqType) -> bool {
        if self.intersect(target).is_some() {
            return true;
        }
        if self.occ().intersect(target.occ()).is_none() {
            return false;
        }
        match target.item_type() {
            ItemType::Atomic(to) => {
                if self.item_type().is_untyped() {
                    return !to.is_namespace_sensitive();
                }
                match to {
                    AtomType::Double => self.could_be(AtomType::Float) || self.could_be(AtomType::Decimal),
                    AtomType::Float => self.could_be(AtomType::Decimal),
                    AtomType::String => self.could_be(AtomType::AnyUri),
                    _ => false,
                }
            }
            to => to.is_function() && self.item_type().is_function(),
        }
    }

    fn could_be(&self, ty: AtomType) -> bool {
        self.item_type().intersect(&ItemType::Atomic(ty)).is_some()
    }

    /// Error for a value failing this type
    ///
    /// Mentions the binding the value was meant for when there is one.
    fn type_error(
        &self,
        kind: ErrorKind,
        value: &Value,
        binding: Option<&QName>,
        start: impl FnOnce(ErrorKind) -> ErrorBuilder,
    ) -> XqError {
        let found = value.static_type();
        let text = match binding {
            Some(name) => format!("Cannot promote {} to ${} as {}", found, name, self),
            None => format!("Cannot return {} as {}", found, self),
        };
        let builder = start(kind).text(text).operand(value);
        match binding {
            Some(name) => builder.context(format!("${}", name)).build(),
            None => builder.build(),
        }
    }

    /// Error for a single item no conversion rule applies to
    fn item_error(&self, item: &Item, binding: Option<&QName>, ctx: &ConversionContext) -> XqError {
        self.with_occ(Occ::One).type_error(
            ErrorKind::PromotionImpossible,
            &Value::from(item.clone()),
            binding,
            |kind| ctx.error(kind),
        )
    }
}

/// Numeric and URI promotion of an atomic value
fn promote_atomic(atom: &Atomic, target: AtomType) -> Option<Atomic> {
    let source = atom.ty();
    match target {
        AtomType::Double if source == AtomType::Float || source.subtype_of(AtomType::Decimal) => {
            atom.to_double().map(Atomic::Double)
        }
        AtomType::Float if source.subtype_of(AtomType::Decimal) => atom.to_float().map(Atomic::Float),
        AtomType::String if source == AtomType::AnyUri => Some(Atomic::string(atom.string_value())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FuncType, FunctionItem, Node, Occ};
    use pretty_assertions::assert_eq;

    fn ctx() -> ConversionContext {
        ConversionContext::new()
    }

    fn ints(values: &[i64]) -> Value {
        values.iter().map(|v| Item::from(Atomic::integer(*v))).collect()
    }

    #[test]
    fn test_treat() {
        assert!(SeqType::integer_zm().treat(&ints(&[1, 2]), None).is_ok());
        assert!(SeqType::integer_zo().treat(&Value::empty(), None).is_ok());

        let err = SeqType::integer().treat(&ints(&[1, 2]), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CardinalityViolation);
        assert_eq!(err.message(), "Cannot return xs:integer+ as xs:integer: (1, 2).");

        let err = SeqType::string().treat(&ints(&[1]), Some(&QName::local("x"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.message(), "Cannot promote xs:integer to $x as xs:string: 1.");
        assert_eq!(err.context(), Some("$x"));
    }

    #[test]
    fn test_treat_never_converts() {
        let untyped = Value::from(Atomic::untyped("1"));
        let err = SeqType::integer().treat(&untyped, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_cast() {
        let strings = Value::from_items([Item::from(Atomic::string("1")), Item::from(Atomic::untyped("2"))]);
        let cast = SeqType::integer_zm().cast(&strings, &ctx()).unwrap();
        assert_eq!(cast, ints(&[1, 2]));

        let err = SeqType::integer().cast(&ints(&[1, 2]), &ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CardinalityViolation);
        assert_eq!(err.message(), "Cannot cast xs:integer+ to xs:integer: (1, 2).");

        assert_eq!(SeqType::integer_zo().cast(&Value::empty(), &ctx()).unwrap(), Value::empty());
    }

    #[test]
    fn test_cast_item_identity() {
        let item = Item::from(Atomic::integer(3));
        assert_eq!(SeqType::integer().cast_item(&item, &ctx()).unwrap(), Value::from(item));
    }

    #[test]
    fn test_speculative_cast() {
        let item = Item::from(Atomic::string("abc"));
        assert_eq!(SeqType::integer().try_cast_item(&item, &ctx()), None);
        assert!(SeqType::string().try_cast_item(&item, &ctx()).is_some());
        assert!(!SeqType::integer().castable(&Value::from(item), &ctx()));
        assert!(SeqType::double().castable(&Value::from(Atomic::string("INF")), &ctx()));
    }

    #[test]
    fn test_promote_keeps_matching_value() {
        let value = ints(&[1, 2, 3]);
        let promoted = SeqType::get(ItemType::Atomic(AtomType::Decimal), Occ::ZeroMore)
            .promote(value.clone(), None, &ctx(), PromoteOptions::default())
            .unwrap();
        assert_eq!(promoted, value);
    }

    #[test]
    fn test_promote_mixed_value() {
        let value = Value::from_items([
            Item::from(Atomic::Double(1.5)),
            Item::from(Atomic::integer(2)),
            Item::from(Atomic::untyped("3")),
        ]);
        let promoted = SeqType::get(ItemType::Atomic(AtomType::Double), Occ::ZeroMore)
            .promote(value, None, &ctx(), PromoteOptions::default())
            .unwrap();
        assert_eq!(
            promoted,
            Value::from_items([
                Item::from(Atomic::Double(1.5)),
                Item::from(Atomic::Double(2.0)),
                Item::from(Atomic::Double(3.0)),
            ])
        );
        assert!(promoted.is_homogeneous());
    }

    #[test]
    fn test_promote_atomizes_nodes() {
        let value = Value::from(Item::from(Node::attribute(QName::local("n"), "5")));
        let promoted = SeqType::integer()
            .promote(value, None, &ctx(), PromoteOptions::default())
            .unwrap();
        assert_eq!(promoted, ints(&[5]));
    }

    #[test]
    fn test_promote_failures() {
        let err = SeqType::get(ItemType::Atomic(AtomType::Float), Occ::One)
            .promote(Value::from(Atomic::Double(1.0)), Some(&QName::local("f")), &ctx(), PromoteOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PromotionImpossible);
        assert_eq!(err.message(), "Cannot promote xs:double to $f as xs:float: xs:double(\"1\").");

        let err = SeqType::get(ItemType::Atomic(AtomType::QName), Occ::One)
            .promote(Value::from(Atomic::untyped("a:b")), None, &ctx(), PromoteOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NamespaceSensitivePromotion);
        assert_eq!(err.code().to_string(), "XPTY0117");

        let err = SeqType::integer_zm()
            .promote(Value::from(Item::Function(FunctionItem::new(None, vec![], SeqType::integer()))), None, &ctx(), PromoteOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FunctionAtomization);
    }

    #[test]
    fn test_promote_coerces_functions() {
        let f = Item::Function(FunctionItem::new(Some(QName::local("f")), vec![SeqType::decimal()], SeqType::integer()));
        let target = FuncType::new(vec![SeqType::decimal()], SeqType::integer_zm());
        let ty = SeqType::get(ItemType::Function(target.clone()), Occ::One);
        // already an instance: no conversion needed
        let kept = ty.promote(Value::from(f.clone()), None, &ctx(), PromoteOptions::default()).unwrap();
        assert_eq!(kept, Value::from(f.clone()));

        // xs:double parameters are not accepted by the source function
        let other = FuncType::new(vec![SeqType::double()], SeqType::integer());
        let ty = SeqType::get(ItemType::Function(other.clone()), Occ::One);
        let promoted = ty.promote(Value::from(f), None, &ctx(), PromoteOptions::default()).unwrap();
        match &promoted[0] {
            Item::Function(coerced) => {
                assert_eq!(coerced.ty(), &other);
                assert!(coerced.coerced_from().is_some());
            }
            other => panic!("expected a function item, got {}", other),
        }
    }

    #[test]
    fn test_promotable() {
        let untyped = SeqType::get(ItemType::Atomic(AtomType::UntypedAtomic), Occ::One);
        assert!(untyped.promotable(&SeqType::integer()));
        assert!(!untyped.promotable(&SeqType::get(ItemType::Atomic(AtomType::QName), Occ::One)));
        assert!(SeqType::decimal().promotable(&SeqType::double()));
        assert!(SeqType::get(ItemType::Atomic(AtomType::AnyUri), Occ::One).promotable(&SeqType::string()));
        assert!(!SeqType::double().promotable(&SeqType::get(ItemType::Atomic(AtomType::Float), Occ::One)));
        assert!(!SeqType::integer_zm().promotable(&SeqType::string()));
        assert!(SeqType::node().promotable(&SeqType::double()));
        assert!(SeqType::map_zo().promotable(&SeqType::function_zo()));
        assert!(!SeqType::integer_zm().promotable(&SeqType::get(ItemType::Atomic(AtomType::Boolean), Occ::OneMore)));
    }
}
