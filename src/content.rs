//! Content-retrieval gateway.
//!
//! Reconstruction needs the full before/after text of a file. Where that
//! comes from is the caller's business: any failure is reported as `None`
//! and the engine falls back to the hunk bodies.

use std::collections::HashMap;

/// Which revision of a file to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Before,
    After,
}

/// A file at one side of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobRef<'a> {
    pub side: Side,
    pub path: &'a str,
}

/// Source of full file contents.
///
/// Implementations must treat "not found", "too large" and any I/O failure
/// the same way: return `None`.
pub trait ContentSource: Sync {
    fn fetch_blob(&self, blob: BlobRef<'_>, max_bytes: u64) -> Option<String>;
}

/// A source with nothing in it, for raw diffs with no repository behind them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContent;

impl ContentSource for NoContent {
    fn fetch_blob(&self, _blob: BlobRef<'_>, _max_bytes: u64) -> Option<String> {
        None
    }
}

/// In-memory blobs keyed by side and path.
#[derive(Debug, Default, Clone)]
pub struct MemoryContent {
    blobs: HashMap<(Side, String), String>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, side: Side, path: impl Into<String>, content: impl Into<String>) {
        self.blobs.insert((side, path.into()), content.into());
    }

    /// Builder form of [`MemoryContent::insert`].
    #[must_use]
    pub fn with(mut self, side: Side, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(side, path, content);
        self
    }
}

impl ContentSource for MemoryContent {
    fn fetch_blob(&self, blob: BlobRef<'_>, max_bytes: u64) -> Option<String> {
        self.blobs
            .get(&(blob.side, blob.path.to_string()))
            .filter(|content| content.len() as u64 <= max_bytes)
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_content_respects_side_and_size() {
        let source = MemoryContent::new()
            .with(Side::Before, "a.txt", "old\n")
            .with(Side::After, "a.txt", "new content\n");

        let after = BlobRef {
            side: Side::After,
            path: "a.txt",
        };
        assert_eq!(source.fetch_blob(after, 100).unwrap(), "new content\n");
        assert_eq!(source.fetch_blob(after, 4), None);
        assert_eq!(
            source.fetch_blob(
                BlobRef {
                    side: Side::Before,
                    path: "missing.txt"
                },
                100
            ),
            None
        );
    }

    #[test]
    fn no_content_is_always_unavailable() {
        let blob = BlobRef {
            side: Side::After,
            path: "anything",
        };
        assert_eq!(NoContent.fetch_blob(blob, u64::MAX), None);
    }
}
