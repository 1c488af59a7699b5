//! XQ sequence types
//!
//! This crate provides the type system of the query runtime:
//!
//! - **Occurrence indicators**: the cardinality ranges `?`, `*`, `+`, exactly one and empty
//! - **Atomic types**: the `xs:` type tree with subtyping, union and intersection
//! - **Item types**: atomic, node, function, map and array types forming a lattice
//! - **Sequence types**: interned item type, occurrence and optional kind test
//! - **Conversions**: `treat`, `cast` and the function conversion rules of `promote`
//!
//! # Example
//!
//! ```ignore
//! use xq_types::{ConversionContext, PromoteOptions, SeqType, Value, Atomic};
//!
//! let ctx = ConversionContext::new();
//! let value = Value::from(Atomic::untyped("42"));
//! let promoted = SeqType::integer().promote(value, None, &ctx, PromoteOptions::default())?;
//! ```
//!
//! Sequence types are interned: two calls to [`SeqType::get`] with the same
//! single-occurrence item type return the same shared instance, and every
//! type with zero occurrence is the canonical empty sequence type.

mod atom_type;
mod cast;
mod context;
mod conversion;
mod item_type;
mod occurrence;
mod qname;
mod seq_type;
mod value;

pub use atom_type::*;
pub use context::*;
pub use item_type::*;
pub use kind_test::*;
pub use occurrence::*;
pub use qname::*;
pub use seq_type::*;
pub use value::*;
