use super::file::{ChangeCounts, FileDiff};
use super::split_lines;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Grouping key for files without an extension.
pub const NO_EXTENSION: &str = "(none)";

/// A complete diff containing changes for multiple files
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse a complete unified diff into file diffs.
    ///
    /// Never fails: content before the first `diff --git` line and blocks
    /// that cannot be parsed are dropped, the rest is kept in order.
    pub fn parse(text: &str) -> Self {
        let mut files = Vec::new();
        let mut current_file_text = String::new();
        let mut skipped_leading = 0usize;

        for line in split_lines(text) {
            if line.starts_with("diff --git ") {
                // Start of new file diff - save previous if exists
                if !current_file_text.is_empty() {
                    files.extend(parse_block(&current_file_text));
                }
                current_file_text = line.to_string();
                current_file_text.push('\n');
            } else if !current_file_text.is_empty() {
                current_file_text.push_str(line);
                current_file_text.push('\n');
            } else {
                skipped_leading += 1;
            }
        }

        if !current_file_text.is_empty() {
            files.extend(parse_block(&current_file_text));
        }
        if skipped_leading > 0 {
            debug!(lines = skipped_leading, "ignored content before first file marker");
        }

        Diff { files }
    }

    /// Total added and removed lines across all files.
    pub fn count_changes(&self) -> ChangeCounts {
        self.files.iter().map(FileDiff::changes).sum()
    }

    /// Files grouped by lower-cased extension, in diff order within a group.
    pub fn by_extension(&self) -> BTreeMap<String, Vec<&FileDiff>> {
        let mut groups: BTreeMap<String, Vec<&FileDiff>> = BTreeMap::new();
        for file in &self.files {
            let key = file
                .extension()
                .unwrap_or_else(|| NO_EXTENSION.to_string());
            groups.entry(key).or_default().push(file);
        }
        groups
    }

    /// Files ordered largest change first. Ties keep diff order.
    pub fn ranked_by_changes(&self) -> Vec<&FileDiff> {
        let mut ranked: Vec<&FileDiff> = self.files.iter().collect();
        ranked.sort_by_key(|file| std::cmp::Reverse(file.changes().total()));
        ranked
    }

    /// Totals, per-extension counts and the ranking in one report.
    pub fn stats(&self) -> DiffStats<'_> {
        DiffStats {
            files: self.files.len(),
            totals: self.count_changes(),
            by_extension: self
                .by_extension()
                .into_iter()
                .map(|(ext, files)| {
                    let counts: ChangeCounts = files.iter().map(|f| f.changes()).sum();
                    (ext, (files.len(), counts))
                })
                .collect(),
            ranked: self.ranked_by_changes(),
        }
    }
}

/// Report produced by [`Diff::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStats<'a> {
    pub files: usize,
    pub totals: ChangeCounts,
    /// File count and change totals per extension
    pub by_extension: BTreeMap<String, (usize, ChangeCounts)>,
    pub ranked: Vec<&'a FileDiff>,
}

impl fmt::Display for DiffStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files changed: {}", self.files)?;
        writeln!(f, "Lines: {}", self.totals)?;
        writeln!(f, "By extension:")?;
        for (ext, (files, counts)) in &self.by_extension {
            writeln!(f, "  {ext}: {files} file(s), {counts}")?;
        }
        writeln!(f, "Largest changes:")?;
        for file in &self.ranked {
            writeln!(f, "  {} {}", file.path(), file.changes())?;
        }
        Ok(())
    }
}

fn parse_block(text: &str) -> Option<FileDiff> {
    let parsed = FileDiff::parse(text);
    if parsed.is_none() {
        debug!(
            header = text.lines().next().unwrap_or_default(),
            "skipping unparseable file block"
        );
    }
    parsed
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Generate line content
    fn arb_line_content() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::char::range(' ', '~'), 0..20)
            .prop_map(|chars| chars.into_iter().collect())
    }

    /// A body line tagged with one of ' ', '+', '-'
    fn arb_body_line() -> impl Strategy<Value = String> {
        (prop::sample::select(vec![' ', '+', '-']), arb_line_content())
            .prop_map(|(tag, text)| format!("{tag}{text}"))
    }

    /// Render a well-formed hunk whose header counts match its body
    fn arb_hunk() -> impl Strategy<Value = String> {
        (1..500u32, prop::collection::vec(arb_body_line(), 1..12)).prop_map(|(start, body)| {
            let old = body.iter().filter(|l| !l.starts_with('+')).count();
            let new = body.iter().filter(|l| !l.starts_with('-')).count();
            format!("@@ -{start},{old} +{start},{new} @@\n{}\n", body.join("\n"))
        })
    }

    fn arb_file_block() -> impl Strategy<Value = String> {
        ("[a-z]{1,8}", prop::collection::vec(arb_hunk(), 0..4)).prop_map(|(name, hunks)| {
            format!(
                "diff --git a/{name}.txt b/{name}.txt\nindex 1..2 100644\n--- a/{name}.txt\n+++ b/{name}.txt\n{}",
                hunks.concat()
            )
        })
    }

    /// Count `+`/`-` lines that sit inside hunk bodies
    fn count_tagged_lines(text: &str) -> (usize, usize) {
        let mut in_hunk = false;
        let (mut added, mut removed) = (0, 0);
        for line in text.lines() {
            if line.starts_with("diff --git ") {
                in_hunk = false;
            } else if line.starts_with("@@") {
                in_hunk = true;
            } else if in_hunk && line.starts_with('+') {
                added += 1;
            } else if in_hunk && line.starts_with('-') {
                removed += 1;
            }
        }
        (added, removed)
    }

    proptest! {
        /// Change counting agrees with a plain scan of the hunk bodies
        #[test]
        fn count_changes_matches_tagged_lines(blocks in prop::collection::vec(arb_file_block(), 0..5)) {
            let text = blocks.concat();
            let counts = Diff::parse(&text).count_changes();
            let (added, removed) = count_tagged_lines(&text);
            prop_assert_eq!(counts.additions, added);
            prop_assert_eq!(counts.deletions, removed);
        }

        /// Every file block survives parsing, in order
        #[test]
        fn every_block_is_parsed(blocks in prop::collection::vec(arb_file_block(), 0..5)) {
            let diff = Diff::parse(&blocks.concat());
            prop_assert_eq!(diff.files.len(), blocks.len());
        }
    }
}
