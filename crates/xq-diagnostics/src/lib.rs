//! XQ diagnostics and error handling
//!
//! This crate provides the error infrastructure shared by the query runtime:
//! error kinds and their code registry, the structured [`XqError`], source
//! locations and diagnostic records.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for XQ operations
pub type XqResult<T> = std::result::Result<T, XqError>;
