//! Block-list of sinkholed names.
//!
//! Loaded once at startup from a plain text file, one name per line.

use std::path::Path;

use rustc_hash::FxHashSet;

use crate::dns::normalize;

/// A set of blocked names, matched exactly against normalized query names.
#[derive(Debug, Default)]
pub struct Blocklist {
    names: FxHashSet<String>,
}

impl Blocklist {
    /// Load names from a file; `#` and `!` lines are comments.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&content))
    }

    pub fn from_lines(content: &str) -> Self {
        let names = content
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    return None;
                }
                Some(normalize(line))
            })
            .collect();
        Self { names }
    }

    /// Exact membership test; `name` must already be in canonical form
    /// (lowercase, trailing dot).
    #[inline]
    pub fn is_blocked(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
