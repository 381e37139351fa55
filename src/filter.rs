//! Glob-based selection of which tracked paths get a timestamp.
//!
//! All patterns match against the path *relative to the considered subtree*.
//! Precedence, most binding first: anything outside the subtree (a relative
//! form starting with `../`) is always dropped; `timestamps_for` patterns,
//! when given, must match; `exclude` beats `include`; `include`, when given,
//! is a whitelist.

use glob::Pattern;

use crate::error::Error;

/// Compiled include/exclude/timestamps-for patterns.
#[derive(Debug)]
pub struct PathFilter {
    timestamps_for: Vec<Pattern>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    /// Compile the three pattern lists. An empty list means "no constraint".
    pub fn new(
        timestamps_for: &[String],
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, Error> {
        Ok(Self {
            timestamps_for: compile(timestamps_for)?,
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Should this subtree-relative path be dropped?
    #[must_use]
    pub fn is_filtered(&self, relpath: &str) -> bool {
        if relpath.starts_with("../") {
            return true;
        }
        if !self.timestamps_for.is_empty()
            && !self.timestamps_for.iter().any(|p| p.matches(relpath))
        {
            return true;
        }
        if self.exclude.iter().any(|p| p.matches(relpath)) {
            return true;
        }
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(relpath)) {
            return true;
        }
        false
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, Error> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| Error::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}
