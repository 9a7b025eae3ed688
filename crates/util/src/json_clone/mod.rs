//! Deep cloning of tree values.

mod clone;

pub use clone::deep_clone;
