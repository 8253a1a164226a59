use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{self, char},
    combinator::opt,
    sequence::preceded,
};
use std::collections::BTreeSet;
use std::fmt;

/// One side of a hunk header: `<start>[,<count>]`.
///
/// A missing count means 1. A count of 0 means the side is empty and `start`
/// names the line *before* the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub count: u32,
}

impl LineRange {
    /// First line number the cursor visits when walking this side.
    fn cursor_start(self) -> u32 {
        if self.count == 0 {
            self.start.saturating_add(1)
        } else {
            self.start
        }
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.count {
            1 => write!(f, "{}", self.start),
            n => write!(f, "{},{}", self.start, n),
        }
    }
}

/// A body line of a hunk, tagged by its leading character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Added(String),
    Removed(String),
}

impl HunkLine {
    /// Classify a raw body line. Returns `None` for anything that is not a
    /// context, addition or removal (e.g. `\ No newline at end of file`).
    pub fn parse(line: &str) -> Option<Self> {
        if let Some(text) = line.strip_prefix(' ') {
            Some(HunkLine::Context(text.to_string()))
        } else if let Some(text) = line.strip_prefix('+') {
            Some(HunkLine::Added(text.to_string()))
        } else {
            line.strip_prefix('-')
                .map(|text| HunkLine::Removed(text.to_string()))
        }
    }

    pub fn text(&self) -> &str {
        match self {
            HunkLine::Context(text) | HunkLine::Added(text) | HunkLine::Removed(text) => text,
        }
    }

    pub fn marker(&self) -> char {
        match self {
            HunkLine::Context(_) => ' ',
            HunkLine::Added(_) => '+',
            HunkLine::Removed(_) => '-',
        }
    }
}

/// A body line together with the old/new cursor positions at which it sits.
///
/// - context: `old` and `new` are its line numbers in both files
/// - added: `new` is its after-file line number, `old` the next old line
/// - removed: `old` is its before-file line number, `new` is the after-file
///   line it was deleted in front of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedLine<'a> {
    pub old: u32,
    pub new: u32,
    pub line: &'a HunkLine,
}

/// A single hunk from a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old: LineRange,
    pub new: LineRange,
    /// Text after the closing `@@`, usually the enclosing function.
    pub section: Option<String>,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Parse a hunk from diff text (header + content lines)
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = super::split_lines(text);
        let mut hunk = Self::from_header(lines.next()?)?;
        for line in lines {
            hunk.push_line(line);
        }
        Some(hunk)
    }

    /// Start an empty hunk from a `@@ -a,b +c,d @@ section` header line.
    pub fn from_header(header: &str) -> Option<Self> {
        let (rest, (old, new)) = header_ranges(header).ok()?;
        let section = rest
            .strip_prefix(' ')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(Hunk {
            old,
            new,
            section,
            lines: Vec::new(),
        })
    }

    /// Accumulate one body line. Lines without a diff tag are ignored, except
    /// that a bare empty line counts as empty context while the hunk still
    /// expects lines (mail clients strip the lone space).
    pub fn push_line(&mut self, line: &str) {
        if let Some(parsed) = HunkLine::parse(line) {
            self.lines.push(parsed);
        } else if line.is_empty() && !self.is_complete() {
            self.lines.push(HunkLine::Context(String::new()));
        }
    }

    /// Whether the body already holds as many lines as the header declares.
    pub fn is_complete(&self) -> bool {
        let (old_seen, new_seen) =
            self.lines
                .iter()
                .fold((0u32, 0u32), |(old, new), line| match line {
                    HunkLine::Context(_) => (old + 1, new + 1),
                    HunkLine::Added(_) => (old, new + 1),
                    HunkLine::Removed(_) => (old + 1, new),
                });
        old_seen >= self.old.count && new_seen >= self.new.count
    }

    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Removed(_)))
            .count()
    }

    /// Walk the body with independent old/new cursors.
    ///
    /// Context advances both cursors, additions only the new one, removals
    /// only the old one. Cursors stop at `u32::MAX` rather than wrap.
    pub fn numbered_lines(&self) -> impl Iterator<Item = NumberedLine<'_>> {
        let mut old = self.old.cursor_start();
        let mut new = self.new.cursor_start();
        self.lines.iter().map(move |line| {
            let numbered = NumberedLine { old, new, line };
            match line {
                HunkLine::Context(_) => {
                    old = old.saturating_add(1);
                    new = new.saturating_add(1);
                }
                HunkLine::Added(_) => new = new.saturating_add(1),
                HunkLine::Removed(_) => old = old.saturating_add(1),
            }
            numbered
        })
    }

    /// Header line without the section heading.
    pub fn header(&self) -> String {
        format!("@@ -{} +{} @@", self.old, self.new)
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.section {
            Some(section) => writeln!(f, "{} {}", self.header(), section)?,
            None => writeln!(f, "{}", self.header())?,
        }

        for line in &self.lines {
            writeln!(f, "{}{}", line.marker(), line.text())?;
        }

        Ok(())
    }
}

/// Before/after line numbers touched by a sequence of hunks.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangedLines {
    /// Removed lines, numbered in the before file
    pub before: BTreeSet<u32>,
    /// Added lines, numbered in the after file
    pub after: BTreeSet<u32>,
}

/// Collect the changed line numbers of `hunks` on both sides.
pub fn changed_line_numbers<'a>(hunks: impl IntoIterator<Item = &'a Hunk>) -> ChangedLines {
    let mut changed = ChangedLines::default();
    for numbered in hunks.into_iter().flat_map(Hunk::numbered_lines) {
        match numbered.line {
            HunkLine::Added(_) => {
                changed.after.insert(numbered.new);
            }
            HunkLine::Removed(_) => {
                changed.before.insert(numbered.old);
            }
            HunkLine::Context(_) => {}
        }
    }
    changed
}

fn line_range(input: &str) -> IResult<&str, LineRange> {
    (complete::u32, opt(preceded(char(','), complete::u32)))
        .map(|(start, count)| LineRange {
            start,
            count: count.unwrap_or(1),
        })
        .parse(input)
}

fn header_ranges(input: &str) -> IResult<&str, (LineRange, LineRange)> {
    (
        preceded(tag("@@ -"), line_range),
        preceded(tag(" +"), line_range),
        tag(" @@"),
    )
        .map(|(old, new, _)| (old, new))
        .parse(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn parse_header_with_counts() {
        let hunk = Hunk::from_header("@@ -10,2 +10,3 @@").unwrap();
        assert_eq!(hunk.old, LineRange { start: 10, count: 2 });
        assert_eq!(hunk.new, LineRange { start: 10, count: 3 });
        assert_eq!(hunk.section, None);
    }

    #[test]
    fn parse_header_omitted_counts_default_to_one() {
        let hunk = Hunk::from_header("@@ -15 +14 @@").unwrap();
        assert_eq!(hunk.old, LineRange { start: 15, count: 1 });
        assert_eq!(hunk.new, LineRange { start: 14, count: 1 });
    }

    #[test]
    fn parse_header_keeps_section_heading() {
        let hunk = Hunk::from_header("@@ -38,0 +39,5 @@ fn main() {").unwrap();
        assert_eq!(hunk.section.as_deref(), Some("fn main() {"));
    }

    #[test]
    fn parse_header_rejects_garbage() {
        assert!(Hunk::from_header("@@ -x,1 +2 @@").is_none());
        assert!(Hunk::from_header("@@ -1,1 +2").is_none());
        assert!(Hunk::from_header("not a header").is_none());
    }

    #[test]
    fn parse_body_tags_lines() {
        let hunk = Hunk::parse("@@ -1,2 +1,3 @@\n line1\n+new line\n line2").unwrap();
        assert_eq!(
            hunk.lines,
            vec![
                HunkLine::Context("line1".to_string()),
                HunkLine::Added("new line".to_string()),
                HunkLine::Context("line2".to_string()),
            ]
        );
        assert_eq!(hunk.additions(), 1);
        assert_eq!(hunk.deletions(), 0);
    }

    #[test]
    fn parse_ignores_no_newline_marker() {
        let hunk =
            Hunk::parse("@@ -3 +3 @@\n-old version\n\\ No newline at end of file\n+new version")
                .unwrap();
        assert_eq!(hunk.lines.len(), 2);
    }

    #[test]
    fn parse_content_with_diff_markers() {
        let hunk = Hunk::parse("@@ -5,0 +6,3 @@\n++++ plus\n+--- minus\n+@@ header").unwrap();
        assert_eq!(
            hunk.lines,
            vec![
                HunkLine::Added("+++ plus".to_string()),
                HunkLine::Added("--- minus".to_string()),
                HunkLine::Added("@@ header".to_string()),
            ]
        );
    }

    #[test]
    fn empty_line_is_context_only_while_incomplete() {
        let hunk = Hunk::parse("@@ -1,3 +1,3 @@\n a\n\n c\n").unwrap();
        assert_eq!(hunk.lines.len(), 3);
        assert_eq!(hunk.lines[1], HunkLine::Context(String::new()));

        let mut complete = Hunk::parse("@@ -1 +1 @@\n a").unwrap();
        complete.push_line("");
        assert_eq!(complete.lines.len(), 1);
    }

    #[test]
    fn numbered_lines_advance_independent_cursors() {
        let hunk = Hunk::parse("@@ -10,3 +10,3 @@\n ctx\n-gone\n+here\n tail").unwrap();
        let positions: Vec<(u32, u32)> = hunk.numbered_lines().map(|n| (n.old, n.new)).collect();
        assert_eq!(positions, vec![(10, 10), (11, 11), (12, 11), (12, 12)]);
    }

    #[test]
    fn zero_count_side_starts_after_declared_line() {
        let hunk = Hunk::parse("@@ -15,2 +14,0 @@\n-one\n-two").unwrap();
        let removed: Vec<(u32, u32)> = hunk.numbered_lines().map(|n| (n.old, n.new)).collect();
        assert_eq!(removed, vec![(15, 15), (16, 15)]);
    }

    #[test]
    fn cursors_saturate_at_max_line_number() {
        let hunk = Hunk::parse("@@ -1 +4294967295 @@\n a\n b\n+c").unwrap();
        let positions: Vec<(u32, u32)> = hunk.numbered_lines().map(|n| (n.old, n.new)).collect();
        assert_eq!(
            positions,
            vec![(1, u32::MAX), (2, u32::MAX), (3, u32::MAX)]
        );

        let empty_side = Hunk::from_header(&format!("@@ -{},0 +1 @@", u32::MAX)).unwrap();
        assert_eq!(empty_side.old.cursor_start(), u32::MAX);
    }

    #[test]
    fn changed_line_numbers_across_hunks() {
        let first = Hunk::parse("@@ -2,0 +3 @@\n+inserted").unwrap();
        let second = Hunk::parse("@@ -8,2 +9,1 @@\n-a\n-b\n+c").unwrap();
        let changed = changed_line_numbers([&first, &second]);
        assert_eq!(changed.after.into_iter().collect::<Vec<_>>(), vec![3, 9]);
        assert_eq!(changed.before.into_iter().collect::<Vec<_>>(), vec![8, 9]);
    }

    #[test]
    fn render_header_collapses_single_counts() {
        let hunk = Hunk::parse("@@ -136,0 +137 @@\n+      debug = true;").unwrap();
        assert_eq!(hunk.to_string(), "@@ -136,0 +137 @@\n+      debug = true;\n");
    }

    #[test]
    fn render_keeps_section_heading() {
        let hunk = Hunk::parse("@@ -1,2 +1,2 @@ impl Foo\n-a\n+b").unwrap();
        assert_eq!(hunk.to_string(), "@@ -1,2 +1,2 @@ impl Foo\n-a\n+b\n");
    }
}
