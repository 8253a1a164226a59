//! Full-file reconstruction: merge a file's hunks with its before/after
//! contents into one annotated line sequence, bounded by a byte budget.

use crate::classify::{is_known_text, looks_binary};
use crate::diff::{FileDiff, FileStatus, Hunk, HunkLine, split_lines};
use crate::options::RenderOptions;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Change status of one reconstructed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Unchanged,
    Added,
    Removed,
    /// New text replacing old text in place; only produced when the hunk
    /// bodies are all there is to go on.
    Changed,
}

impl LineTag {
    pub fn marker(&self) -> char {
        match self {
            LineTag::Unchanged => ' ',
            LineTag::Added => '+',
            LineTag::Removed => '-',
            LineTag::Changed => '!',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedLine {
    /// After-file line number, or before-file line number for removals
    pub number: u32,
    pub tag: LineTag,
    pub text: String,
}

impl fmt::Display for AnnotatedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag.marker(), self.text)
    }
}

/// Where the annotated lines came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Merged with the complete file contents
    FullFile,
    /// Contents unavailable; hunk bodies replayed as declared
    HunkFallback,
    /// Binary file, nothing reconstructed
    BinaryOmitted,
}

/// Lines dropped once the byte budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// 1-based position of the first omitted line in the output
    pub at_line: usize,
    pub omitted: usize,
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "... (truncated at line {}, {} lines omitted)",
            self.at_line, self.omitted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstruction {
    pub origin: Origin,
    pub lines: Vec<AnnotatedLine>,
    pub truncation: Option<Truncation>,
}

impl Reconstruction {
    fn binary_omitted() -> Self {
        Reconstruction {
            origin: Origin::BinaryOmitted,
            lines: Vec::new(),
            truncation: None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}

/// Reconstruct `file` as a fully annotated line sequence.
///
/// `before`/`after` are the complete file contents when they could be
/// fetched. Added files only need `after`, deleted files only `before`, all
/// other statuses need both; otherwise the hunk bodies are replayed.
pub fn reconstruct(
    file: &FileDiff,
    before: Option<&str>,
    after: Option<&str>,
    options: &RenderOptions,
) -> Reconstruction {
    if is_binary(file, before, after, options.detect_binary) {
        debug!(path = file.path(), "binary file, reconstruction skipped");
        return Reconstruction::binary_omitted();
    }

    let mut budget = Budget::new(options.max_file_bytes);
    let origin = match (file.status, before, after) {
        (FileStatus::Added, _, Some(after)) => {
            for (number, text) in content_lines(after) {
                budget.push(number, LineTag::Added, text);
            }
            Origin::FullFile
        }
        (FileStatus::Deleted, Some(before), _) => {
            for (number, text) in content_lines(before) {
                budget.push(number, LineTag::Removed, text);
            }
            Origin::FullFile
        }
        (FileStatus::Modified | FileStatus::Renamed | FileStatus::Copied, Some(_), Some(after)) => {
            merge_hunks(&file.hunks, after, &mut budget);
            Origin::FullFile
        }
        _ => {
            debug!(path = file.path(), "content unavailable, replaying hunks");
            replay_hunks(&file.hunks, &mut budget);
            Origin::HunkFallback
        }
    };

    let reconstruction = budget.finish(origin);
    if let Some(truncation) = reconstruction.truncation {
        warn!(
            path = file.path(),
            omitted = truncation.omitted,
            "file output truncated by byte budget"
        );
    }
    reconstruction
}

/// Binary policy: declared binary files, and (with `detect_binary`) files
/// whose fetched content contains NUL, are skipped unless allow-listed.
pub fn is_binary(
    file: &FileDiff,
    before: Option<&str>,
    after: Option<&str>,
    detect_binary: bool,
) -> bool {
    if is_known_text(file.path()) {
        return false;
    }
    file.is_binary
        || (detect_binary && before.into_iter().chain(after).any(looks_binary))
}

/// Walk `after` line by line, emitting removals in front of the line they
/// were deleted before and tagging additions.
fn merge_hunks(hunks: &[Hunk], after: &str, budget: &mut Budget) {
    let mut added: HashSet<u32> = HashSet::new();
    let mut removed: BTreeMap<u32, Vec<(u32, &str)>> = BTreeMap::new();

    for numbered in hunks.iter().flat_map(Hunk::numbered_lines) {
        match numbered.line {
            HunkLine::Added(_) => {
                added.insert(numbered.new);
            }
            HunkLine::Removed(text) => removed
                .entry(numbered.new)
                .or_default()
                .push((numbered.old, text.as_str())),
            HunkLine::Context(_) => {}
        }
    }

    for (number, text) in content_lines(after) {
        for (old, removed_text) in removed.remove(&number).unwrap_or_default() {
            budget.push(old, LineTag::Removed, removed_text);
        }
        let tag = if added.contains(&number) {
            LineTag::Added
        } else {
            LineTag::Unchanged
        };
        budget.push(number, tag, text);
    }

    // Removals at end of file, plus anything a malformed hunk placed past it.
    for (old, removed_text) in removed.into_values().flatten() {
        budget.push(old, LineTag::Removed, removed_text);
    }
}

/// Emit hunk bodies as declared. Within a change run, added lines that line
/// up with removed ones are marked as changed in place.
fn replay_hunks(hunks: &[Hunk], budget: &mut Budget) {
    for hunk in hunks {
        let mut unpaired_removals = 0usize;
        let mut after_additions = false;

        for numbered in hunk.numbered_lines() {
            match numbered.line {
                HunkLine::Context(text) => {
                    unpaired_removals = 0;
                    after_additions = false;
                    budget.push(numbered.new, LineTag::Unchanged, text);
                }
                HunkLine::Removed(text) => {
                    if after_additions {
                        unpaired_removals = 0;
                        after_additions = false;
                    }
                    unpaired_removals += 1;
                    budget.push(numbered.old, LineTag::Removed, text);
                }
                HunkLine::Added(text) => {
                    after_additions = true;
                    let tag = if unpaired_removals > 0 {
                        unpaired_removals -= 1;
                        LineTag::Changed
                    } else {
                        LineTag::Added
                    };
                    budget.push(numbered.new, tag, text);
                }
            }
        }
    }
}

fn content_lines(content: &str) -> impl Iterator<Item = (u32, &str)> {
    (1u32..).zip(split_lines(content))
}

/// Accumulates lines until the byte budget is spent, then only counts.
struct Budget {
    max_bytes: u64,
    used: u64,
    lines: Vec<AnnotatedLine>,
    omitted: usize,
}

impl Budget {
    fn new(max_bytes: u64) -> Self {
        Budget {
            max_bytes,
            used: 0,
            lines: Vec::new(),
            omitted: 0,
        }
    }

    fn push(&mut self, number: u32, tag: LineTag, text: &str) {
        if self.omitted > 0 {
            self.omitted += 1;
            return;
        }
        // One extra byte for the line terminator.
        let cost = text.len() as u64 + 1;
        if self.used + cost > self.max_bytes {
            self.omitted = 1;
            return;
        }
        self.used += cost;
        self.lines.push(AnnotatedLine {
            number,
            tag,
            text: text.to_string(),
        });
    }

    fn finish(self, origin: Origin) -> Reconstruction {
        let truncation = (self.omitted > 0).then(|| Truncation {
            at_line: self.lines.len() + 1,
            omitted: self.omitted,
        });
        Reconstruction {
            origin,
            lines: self.lines,
            truncation,
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_lines() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-zA-Z0-9 ]{0,30}", 0..60)
    }

    fn added_file() -> FileDiff {
        FileDiff::parse("diff --git a/n.txt b/n.txt\nnew file mode 100644\n").unwrap()
    }

    proptest! {
        /// An added file with N lines reconstructs to N added lines numbered 1..=N
        #[test]
        fn added_file_lines_are_numbered(lines in arb_lines()) {
            let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
            let rec = reconstruct(&added_file(), None, Some(&content), &RenderOptions::default());

            prop_assert_eq!(rec.lines.len(), lines.len());
            for (i, line) in rec.lines.iter().enumerate() {
                prop_assert_eq!(line.number as usize, i + 1);
                prop_assert_eq!(line.tag, LineTag::Added);
            }
        }

        /// Same input and budget always truncate at the same point
        #[test]
        fn truncation_is_deterministic(lines in arb_lines(), max_bytes in 1..400u64) {
            let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
            let options = RenderOptions { max_file_bytes: max_bytes, ..RenderOptions::default() };
            let first = reconstruct(&added_file(), None, Some(&content), &options);
            let second = reconstruct(&added_file(), None, Some(&content), &options);
            prop_assert_eq!(&first, &second);

            let kept: u64 = first.lines.iter().map(|l| l.text.len() as u64 + 1).sum();
            prop_assert!(kept <= max_bytes);
            let omitted = first.truncation.map_or(0, |t| t.omitted);
            prop_assert_eq!(first.lines.len() + omitted, lines.len());
        }
    }
}
