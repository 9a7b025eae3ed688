//! Structural equality for tree values.
//!
//! [`DeepEqual`] compares values recursively and memoizes results for
//! container pairs in a bounded cache keyed by allocation identity. When the
//! cache reaches capacity it is cleared wholesale.

mod deep_equal;

pub use deep_equal::{deep_equal, deep_equal_opt, DeepEqual};
