//! Repository paths as component tuples.
//!
//! A [`TreePath`] is a sequence of non-empty path components; the empty
//! sequence is the root of whatever subtree is under consideration. The
//! `/`-separated rendering is a display convention — identity is the
//! component sequence itself, which is what makes paths cheap to extend one
//! level at a time while descending trees.

use std::fmt;

/// A path inside a repository, as a tuple of components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// The empty path: the root of the subtree.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a `/`-separated path. Empty components (leading, trailing, or
    /// doubled separators) are dropped.
    #[must_use]
    pub fn from_slash(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|c| !c.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )
    }

    /// The path components, outermost first.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// `true` for the empty path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one more component.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut components = Vec::with_capacity(self.0.len() + 1);
        components.extend(self.0.iter().cloned());
        components.push(name.to_owned());
        Self(components)
    }

    /// Split into the directory prefix and the final component.
    ///
    /// `None` for the root path.
    #[must_use]
    pub fn split_last(&self) -> Option<(Self, &str)> {
        let (last, dir) = self.0.split_last()?;
        Some((Self(dir.to_vec()), last))
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            f.write_str(component)?;
            first = false;
        }
        Ok(())
    }
}
