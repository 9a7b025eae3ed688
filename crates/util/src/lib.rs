//! dentata-util - value model and structural equality for dentata.
//!
//! This crate provides the tree [`Value`] type shared by every dentata crate,
//! path [`Key`]s, and the [`DeepEqual`] engine used to decide whether a write
//! changed anything.

pub mod json_clone;
pub mod json_equal;
pub mod key;
pub mod value;

// Re-exports for convenience
pub use json_clone::deep_clone;
pub use json_equal::{deep_equal, deep_equal_opt, DeepEqual};
pub use key::{Key, Symbol};
pub use value::{Array, Function, Object, Value, ValueKind};
