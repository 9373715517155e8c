//! Shell-glob matching on leaf names

use globset::{Glob, GlobBuilder, GlobMatcher};

use crate::error::FsError;

/// Only `*` and `?` are wildcards; brackets and braces match themselves.
fn escape_brackets(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A `*`/`?` pattern matched case-insensitively against an entry's file name only.
#[derive(Debug, Clone)]
pub struct LeafPattern {
    matcher: Option<GlobMatcher>,
}

impl LeafPattern {
    pub fn new(pattern: &str) -> Result<Self, FsError> {
        if pattern.is_empty() || pattern == "*" {
            return Ok(Self { matcher: None });
        }
        let glob: Glob = GlobBuilder::new(&escape_brackets(pattern))
            .literal_separator(true)
            .backslash_escape(false)
            .case_insensitive(true)
            .build()
            .map_err(|e| FsError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            matcher: Some(glob.compile_matcher()),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            None => true,
            Some(m) => m.is_match(name),
        }
    }
}
