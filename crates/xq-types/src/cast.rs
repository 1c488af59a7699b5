//! Casting between atomic types
//!
//! Implements the XML Schema casting rules for the built-in atomic types:
//! textual sources are parsed from their lexical form, numeric values are
//! converted between the numeric types, and derived string types are checked
//! against their facets.

use crate::{AtomType, Atomic, ConversionContext, Item, ItemType, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::fmt::Display;
use std::str::FromStr;
use xq_diagnostics::{ErrorKind, XqError, XqResult};

type Pattern = Lazy<Result<Regex, regex::Error>>;

static NCNAME: Pattern = Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}\p{M}_.\-]*$"));
static NAME: Pattern = Lazy::new(|| Regex::new(r"^[\p{L}_:][\p{L}\p{N}\p{M}_.:\-]*$"));
static NMTOKEN: Pattern = Lazy::new(|| Regex::new(r"^[\p{L}\p{N}\p{M}_.:\-]+$"));
static LANGUAGE: Pattern = Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$"));
static DOUBLE: Pattern = Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$"));
static DECIMAL: Pattern = Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$"));
static INTEGER: Pattern = Lazy::new(|| Regex::new(r"^[+-]?\d+$"));

fn is_match(pattern: &Pattern, text: &str) -> bool {
    pattern.as_ref().is_ok_and(|re| re.is_match(text))
}

pub(crate) fn is_ncname(text: &str) -> bool {
    is_match(&NCNAME, text)
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Whitespace facet `collapse`
fn collapse(text: &str) -> String {
    text.split(is_xml_space).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Whitespace facet `replace`
fn replace_whitespace(text: &str) -> String {
    text.chars().map(|c| if is_xml_space(c) { ' ' } else { c }).collect()
}

fn is_textual(atomic: &Atomic) -> bool {
    matches!(atomic, Atomic::Untyped(_) | Atomic::Str { .. })
}

fn invalid_cast(from: impl Display, to: impl Display, value: impl Display, ctx: &ConversionContext) -> XqError {
    ctx.error(ErrorKind::InvalidCast).operand(from).operand(to).operand(value).build()
}

fn cast_impossible(target: AtomType, text: &str, ctx: &ConversionContext) -> XqError {
    ctx.error(ErrorKind::CastImpossible).operand(target).operand(text).build()
}

fn out_of_range(target: AtomType, text: &str, ctx: &ConversionContext) -> XqError {
    ctx.error(ErrorKind::ValueOutOfRange).operand(target).operand(text).build()
}

impl ItemType {
    /// Cast an item to this type
    ///
    /// The item is atomized first; only atomic targets can be cast to.
    pub fn cast(&self, item: &Item, ctx: &ConversionContext) -> XqResult<Value> {
        let ItemType::Atomic(target) = self else {
            return Err(invalid_cast(item.runtime_type(), self, item, ctx));
        };
        match item.atomize()?.as_slice() {
            [atom] => target.cast(atom, ctx),
            _ => Err(invalid_cast(item.runtime_type(), self, item, ctx)),
        }
    }
}

impl AtomType {
    /// Cast an atomic value to this type
    ///
    /// The result holds a single item, except for list types which yield one
    /// item per token.
    pub fn cast(self, atomic: &Atomic, ctx: &ConversionContext) -> XqResult<Value> {
        let source = atomic.ty();
        if source == self {
            return Ok(Value::from(atomic.clone()));
        }
        if self.is_abstract() {
            return Err(ctx.error(ErrorKind::AbstractCastTarget).operand(self).build());
        }
        trace!("casting {} to {}", source, self);
        if self.is_list_like() {
            return cast_to_list(self, atomic, ctx);
        }
        cast_atomic(self, atomic, ctx).map(Value::from)
    }
}

fn cast_to_list(target: AtomType, atomic: &Atomic, ctx: &ConversionContext) -> XqResult<Value> {
    if !is_textual(atomic) {
        return Err(invalid_cast(atomic.ty(), target, atomic, ctx));
    }
    let text = atomic.string_value();
    let tokens: Vec<&str> = text.split(is_xml_space).filter(|s| !s.is_empty()).collect();
    if tokens.is_empty() {
        return Err(cast_impossible(target, &text, ctx));
    }
    tokens
        .into_iter()
        .map(|token| cast_atomic(AtomType::NmToken, &Atomic::string(token), ctx).map(Item::Atomic))
        .collect()
}

fn cast_atomic(target: AtomType, atomic: &Atomic, ctx: &ConversionContext) -> XqResult<Atomic> {
    let source = atomic.ty();
    let text = atomic.string_value();
    let textual = is_textual(atomic);
    match target {
        AtomType::UntypedAtomic => Ok(Atomic::Untyped(text)),
        AtomType::String => Ok(Atomic::string(text)),
        AtomType::NormalizedString
        | AtomType::Token
        | AtomType::Language
        | AtomType::NmToken
        | AtomType::Name
        | AtomType::NcName => cast_to_derived_string(target, &text, ctx),
        AtomType::AnyUri if textual => Ok(Atomic::AnyUri(collapse(&text))),
        AtomType::QName if textual => ctx.resolve_qname(&collapse(&text)).map(Atomic::QName),
        AtomType::Boolean => match atomic {
            _ if source.is_numeric() => {
                let value = atomic.to_double().unwrap_or(f64::NAN);
                Ok(Atomic::Boolean(value != 0.0 && !value.is_nan()))
            }
            _ if textual => match collapse(&text).as_str() {
                "true" | "1" => Ok(Atomic::Boolean(true)),
                "false" | "0" => Ok(Atomic::Boolean(false)),
                _ => Err(cast_impossible(target, &text, ctx)),
            },
            _ => Err(invalid_cast(source, target, atomic, ctx)),
        },
        // a value of the numeric union type keeps its own type
        AtomType::Numeric if source.is_numeric() => Ok(atomic.clone()),
        AtomType::Double | AtomType::Numeric => match atomic {
            Atomic::Boolean(b) => Ok(Atomic::Double(if *b { 1.0 } else { 0.0 })),
            _ if textual => parse_double(&text)
                .map(Atomic::Double)
                .ok_or_else(|| cast_impossible(target, &text, ctx)),
            _ => atomic
                .to_double()
                .map(Atomic::Double)
                .ok_or_else(|| invalid_cast(source, target, atomic, ctx)),
        },
        AtomType::Float => match atomic {
            Atomic::Boolean(b) => Ok(Atomic::Float(if *b { 1.0 } else { 0.0 })),
            _ if textual => parse_double(&text)
                .map(|d| Atomic::Float(d as f32))
                .ok_or_else(|| cast_impossible(target, &text, ctx)),
            _ => atomic
                .to_float()
                .map(Atomic::Float)
                .ok_or_else(|| invalid_cast(source, target, atomic, ctx)),
        },
        AtomType::Decimal => cast_to_decimal(atomic, &text, ctx).map(Atomic::Decimal),
        AtomType::Integer | AtomType::NonNegativeInteger | AtomType::Long | AtomType::Int => {
            let value = cast_to_integer(target, atomic, &text, ctx)?;
            let in_range = match target {
                AtomType::NonNegativeInteger => value >= 0,
                AtomType::Int => i32::try_from(value).is_ok(),
                _ => true,
            };
            if in_range {
                Ok(Atomic::typed_integer(target, value))
            } else {
                Err(cast_impossible(target, &text, ctx))
            }
        }
        AtomType::Date => match atomic {
            Atomic::DateTime(dt) => Ok(Atomic::Date(dt.date())),
            _ if textual => NaiveDate::parse_from_str(&collapse(&text), "%Y-%m-%d")
                .map(Atomic::Date)
                .map_err(|_| cast_impossible(target, &text, ctx)),
            _ => Err(invalid_cast(source, target, atomic, ctx)),
        },
        AtomType::DateTime => match atomic {
            Atomic::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(Atomic::DateTime)
                .ok_or_else(|| out_of_range(target, &text, ctx)),
            _ if textual => NaiveDateTime::parse_from_str(&collapse(&text), "%Y-%m-%dT%H:%M:%S%.f")
                .map(Atomic::DateTime)
                .map_err(|_| cast_impossible(target, &text, ctx)),
            _ => Err(invalid_cast(source, target, atomic, ctx)),
        },
        AtomType::Time => match atomic {
            Atomic::DateTime(dt) => Ok(Atomic::Time(dt.time())),
            _ if textual => NaiveTime::parse_from_str(&collapse(&text), "%H:%M:%S%.f")
                .map(Atomic::Time)
                .map_err(|_| cast_impossible(target, &text, ctx)),
            _ => Err(invalid_cast(source, target, atomic, ctx)),
        },
        _ => Err(invalid_cast(source, target, atomic, ctx)),
    }
}

fn cast_to_derived_string(target: AtomType, text: &str, ctx: &ConversionContext) -> XqResult<Atomic> {
    let normalized = if target == AtomType::NormalizedString {
        replace_whitespace(text)
    } else {
        collapse(text)
    };
    let valid = match target {
        AtomType::Language => is_match(&LANGUAGE, &normalized),
        AtomType::NmToken => is_match(&NMTOKEN, &normalized),
        AtomType::Name => is_match(&NAME, &normalized),
        AtomType::NcName => is_match(&NCNAME, &normalized),
        _ => true,
    };
    if valid {
        Ok(Atomic::typed_string(target, normalized))
    } else {
        Err(cast_impossible(target, text, ctx))
    }
}

/// Parse the lexical form of an `xs:double`
fn parse_double(text: &str) -> Option<f64> {
    let text = collapse(text);
    match text.as_str() {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ if is_match(&DOUBLE, &text) => text.parse().ok(),
        _ => None,
    }
}

fn cast_to_decimal(atomic: &Atomic, text: &str, ctx: &ConversionContext) -> XqResult<Decimal> {
    let target = AtomType::Decimal;
    match atomic {
        Atomic::Boolean(b) => Ok(Decimal::from(u8::from(*b))),
        Atomic::Integer { value, .. } => Ok(Decimal::from(*value)),
        Atomic::Double(_) | Atomic::Float(_) => {
            let value = atomic.to_double().unwrap_or(f64::NAN);
            if !value.is_finite() {
                return Err(cast_impossible(target, text, ctx));
            }
            Decimal::from_f64(value).ok_or_else(|| out_of_range(target, text, ctx))
        }
        _ if is_textual(atomic) => {
            let lexical = collapse(text);
            if !is_match(&DECIMAL, &lexical) {
                return Err(cast_impossible(target, text, ctx));
            }
            let (sign, digits) = match lexical.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", lexical.trim_start_matches('+')),
            };
            let digits = match (digits.starts_with('.'), digits.ends_with('.')) {
                (true, _) => format!("0{}", digits),
                (_, true) => format!("{}0", digits),
                _ => digits.to_string(),
            };
            Decimal::from_str(&format!("{}{}", sign, digits)).map_err(|_| out_of_range(target, text, ctx))
        }
        _ => Err(invalid_cast(atomic.ty(), target, atomic, ctx)),
    }
}

fn cast_to_integer(target: AtomType, atomic: &Atomic, text: &str, ctx: &ConversionContext) -> XqResult<i64> {
    let from_double = |value: f64| {
        if !value.is_finite() {
            return Err(cast_impossible(target, text, ctx));
        }
        value.trunc().to_i64().ok_or_else(|| out_of_range(target, text, ctx))
    };
    match atomic {
        Atomic::Boolean(b) => Ok(i64::from(*b)),
        Atomic::Integer { value, .. } => Ok(*value),
        Atomic::Decimal(d) => d.trunc().to_i64().ok_or_else(|| out_of_range(target, text, ctx)),
        Atomic::Double(d) => from_double(*d),
        Atomic::Float(f) => from_double(f64::from(*f)),
        _ if is_textual(atomic) => {
            let lexical = collapse(text);
            if !is_match(&INTEGER, &lexical) {
                return Err(cast_impossible(target, text, ctx));
            }
            lexical.parse().map_err(|_| out_of_range(target, text, ctx))
        }
        _ => Err(invalid_cast(atomic.ty(), target, atomic, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, QName};

    fn cast(target: AtomType, atomic: Atomic) -> XqResult<Atomic> {
        let value = target.cast(&atomic, &ConversionContext::new())?;
        Ok(match value.first() {
            Some(Item::Atomic(a)) => a.clone(),
            other => panic!("unexpected cast result {:?}", other),
        })
    }

    #[test]
    fn test_textual_to_numeric() {
        assert_eq!(cast(AtomType::Integer, Atomic::untyped(" 42 ")).unwrap(), Atomic::integer(42));
        assert_eq!(cast(AtomType::Double, Atomic::string("1.5e1")).unwrap(), Atomic::Double(15.0));
        assert_eq!(cast(AtomType::Double, Atomic::string("-INF")).unwrap(), Atomic::Double(f64::NEG_INFINITY));
        assert_eq!(cast(AtomType::Decimal, Atomic::string(".5")).unwrap(), Atomic::Decimal(Decimal::new(5, 1)));
        assert_eq!(cast(AtomType::Float, Atomic::untyped("2")).unwrap(), Atomic::Float(2.0));

        let err = cast(AtomType::Integer, Atomic::string("abc")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CastImpossible);
        assert_eq!(err.message(), "Cannot cast to xs:integer: \"abc\".");

        let err = cast(AtomType::Double, Atomic::string("infinity")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CastImpossible);
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(cast(AtomType::Integer, Atomic::Double(3.9)).unwrap(), Atomic::integer(3));
        assert_eq!(cast(AtomType::Double, Atomic::integer(2)).unwrap(), Atomic::Double(2.0));
        assert_eq!(cast(AtomType::Boolean, Atomic::Double(f64::NAN)).unwrap(), Atomic::Boolean(false));
        assert_eq!(cast(AtomType::Numeric, Atomic::integer(2)).unwrap(), Atomic::integer(2));
        assert_eq!(cast(AtomType::Numeric, Atomic::untyped("2")).unwrap(), Atomic::Double(2.0));

        let err = cast(AtomType::Integer, Atomic::Double(f64::INFINITY)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CastImpossible);
        let err = cast(AtomType::Integer, Atomic::Double(1e30)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
    }

    #[test]
    fn test_integer_facets() {
        assert_eq!(cast(AtomType::Int, Atomic::integer(7)).unwrap(), Atomic::typed_integer(AtomType::Int, 7));
        assert_eq!(cast(AtomType::Int, Atomic::integer(1 << 40)).unwrap_err().kind(), ErrorKind::CastImpossible);
        assert_eq!(
            cast(AtomType::NonNegativeInteger, Atomic::integer(-1)).unwrap_err().kind(),
            ErrorKind::CastImpossible
        );
        assert_eq!(
            cast(AtomType::Long, Atomic::string("99999999999999999999")).unwrap_err().kind(),
            ErrorKind::ValueOutOfRange
        );
    }

    #[test]
    fn test_boolean() {
        assert_eq!(cast(AtomType::Boolean, Atomic::untyped("1")).unwrap(), Atomic::Boolean(true));
        assert_eq!(cast(AtomType::Boolean, Atomic::string("false")).unwrap(), Atomic::Boolean(false));
        assert_eq!(cast(AtomType::Boolean, Atomic::string("yes")).unwrap_err().kind(), ErrorKind::CastImpossible);
        assert_eq!(cast(AtomType::Double, Atomic::Boolean(true)).unwrap(), Atomic::Double(1.0));
    }

    #[test]
    fn test_derived_strings() {
        assert_eq!(
            cast(AtomType::Token, Atomic::string("  a \t b ")).unwrap(),
            Atomic::typed_string(AtomType::Token, "a b")
        );
        assert_eq!(
            cast(AtomType::NormalizedString, Atomic::string("a\tb")).unwrap(),
            Atomic::typed_string(AtomType::NormalizedString, "a b")
        );
        assert_eq!(
            cast(AtomType::Language, Atomic::string("en-US")).unwrap(),
            Atomic::typed_string(AtomType::Language, "en-US")
        );
        assert_eq!(cast(AtomType::NcName, Atomic::string("a:b")).unwrap_err().kind(), ErrorKind::CastImpossible);
        assert_eq!(
            cast(AtomType::Name, Atomic::string("a:b")).unwrap(),
            Atomic::typed_string(AtomType::Name, "a:b")
        );
        assert_eq!(
            cast(AtomType::String, Atomic::integer(5)).unwrap(),
            Atomic::string("5")
        );
    }

    #[test]
    fn test_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(cast(AtomType::Date, Atomic::untyped("2024-02-29")).unwrap(), Atomic::Date(date));
        assert_eq!(
            cast(AtomType::DateTime, Atomic::Date(date)).unwrap(),
            Atomic::DateTime(date.and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(cast(AtomType::Date, Atomic::string("2023-02-29")).unwrap_err().kind(), ErrorKind::CastImpossible);
        assert_eq!(
            cast(AtomType::Time, Atomic::string("10:30:00")).unwrap(),
            Atomic::Time(NaiveTime::from_hms_opt(10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_pairs() {
        let err = cast(AtomType::Date, Atomic::Boolean(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCast);
        assert_eq!(err.message(), "Cannot cast xs:boolean to xs:date: true().");
        assert_eq!(cast(AtomType::AnyUri, Atomic::integer(1)).unwrap_err().kind(), ErrorKind::InvalidCast);
    }

    #[test]
    fn test_abstract_target() {
        let err = cast(AtomType::AnyAtomic, Atomic::string("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AbstractCastTarget);
        assert!(err.code().is_static_error());
    }

    #[test]
    fn test_qname() {
        let ctx = ConversionContext::new().with_namespace("p", "urn:p");
        let value = AtomType::QName.cast(&Atomic::string("p:local"), &ctx).unwrap();
        assert_eq!(value.first(), Some(&Item::Atomic(Atomic::QName(QName::with_uri("urn:p", "local")))));
        let err = AtomType::QName.cast(&Atomic::string("q:local"), &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPrefix);
    }

    #[test]
    fn test_list_type() {
        let value = AtomType::NmTokens
            .cast(&Atomic::string(" a  b c "), &ConversionContext::new())
            .unwrap();
        assert_eq!(value.len(), 3);
        assert_eq!(value[1], Item::Atomic(Atomic::typed_string(AtomType::NmToken, "b")));
        let err = AtomType::NmTokens.cast(&Atomic::string("   "), &ConversionContext::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CastImpossible);
    }

    #[test]
    fn test_item_cast_atomizes() {
        let ctx = ConversionContext::new();
        let node = Item::Node(Node::element(QName::local("n"), "12"));
        let value = ItemType::Atomic(AtomType::Integer).cast(&node, &ctx).unwrap();
        assert_eq!(value, Value::from(Atomic::integer(12)));

        let err = ItemType::Node(crate::NodeKind::Element)
            .cast(&Item::Atomic(Atomic::string("x")), &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCast);
    }
}
