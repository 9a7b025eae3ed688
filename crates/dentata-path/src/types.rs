//! Type definitions for paths.

use std::fmt;
use std::ops::Deref;

use dentata_util::Key;

/// An owned path from the root of a value tree.
///
/// Displays as a pointer string (`/a/0/b`), with `~` and `/` escaped as in
/// RFC 6901.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Key>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a pointer string such as `/a/0/b`. See [`crate::parse_path`].
    pub fn parse(pointer: &str) -> Self {
        crate::parse_path(pointer)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path one step deeper.
    pub fn child(&self, key: impl Into<Key>) -> Path {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend_from_slice(&self.0);
        steps.push(key.into());
        Path(steps)
    }

    /// The path without its last step, or `None` at the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(parent.to_vec()))
    }

    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    pub fn as_slice(&self) -> &[Key] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Key> {
        self.0
    }
}

impl Deref for Path {
    type Target = [Key];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[Key]> for Path {
    fn as_ref(&self) -> &[Key] {
        &self.0
    }
}

impl From<Vec<Key>> for Path {
    fn from(steps: Vec<Key>) -> Self {
        Path(steps)
    }
}

impl From<&[Key]> for Path {
    fn from(steps: &[Key]) -> Self {
        Path(steps.to_vec())
    }
}

impl From<&str> for Path {
    fn from(pointer: &str) -> Self {
        Path::parse(pointer)
    }
}

impl<K: Into<Key>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format_path(&self.0))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.to_string())
    }
}
