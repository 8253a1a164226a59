//! Unified diff parsing.
//!
//! [`Diff::parse`] splits multi-file diff text on `diff --git` markers,
//! [`FileDiff::parse`] reads one block's headers and hunks, and [`Hunk`]
//! holds the tagged body lines of a single change region.

pub mod file;
pub mod full;
pub mod hunk;

pub use file::{ChangeCounts, FileDiff, FileStatus};
pub use full::{Diff, DiffStats};
pub use hunk::{ChangedLines, Hunk, HunkLine, LineRange, changed_line_numbers};

/// Split on `\n` only, so a `\r` before it stays part of the line.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
}
