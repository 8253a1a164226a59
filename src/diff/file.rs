use super::hunk::{ChangedLines, Hunk, changed_line_numbers};
use super::split_lines;
use std::fmt;
use tracing::debug;

/// How a file was changed, as declared by the diff headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Deleted => "deleted",
            FileStatus::Modified => "modified",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Added and removed line totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangeCounts {
    pub additions: usize,
    pub deletions: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.additions + self.deletions
    }
}

impl std::ops::Add for ChangeCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        ChangeCounts {
            additions: self.additions + rhs.additions,
            deletions: self.deletions + rhs.deletions,
        }
    }
}

impl std::iter::Sum for ChangeCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ChangeCounts::default(), |acc, c| acc + c)
    }
}

impl fmt::Display for ChangeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.additions, self.deletions)
    }
}

/// A complete diff for a single file.
///
/// `old_path` and `new_path` are always filled in: they are equal unless the
/// file was renamed or copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub status: FileStatus,
    pub old_path: String,
    pub new_path: String,
    /// Declared binary by the diff source
    pub is_binary: bool,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Parse a single-file block starting with `diff --git`.
    ///
    /// Returns `None` when the block lacks the marker or no path can be
    /// recovered from it. Unparseable hunk headers drop that hunk only.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = split_lines(text);
        let header = trim_cr(lines.next()?).strip_prefix("diff --git ")?;
        let (mut old_path, mut new_path) = split_header_paths(header).unwrap_or_default();

        let mut status = FileStatus::Modified;
        let mut is_binary = false;
        let mut hunks = Vec::new();
        let mut current: Option<Hunk> = None;
        let mut in_header = true;

        for line in lines {
            if line.starts_with("@@") {
                in_header = false;
                hunks.extend(current.take());
                current = Hunk::from_header(line);
                if current.is_none() {
                    debug!(line, "skipping hunk with unparseable header");
                }
            } else if in_header {
                let line = trim_cr(line);
                if line.starts_with("new file mode") {
                    status = FileStatus::Added;
                } else if line.starts_with("deleted file mode") {
                    status = FileStatus::Deleted;
                } else if let Some(from) = line.strip_prefix("rename from ") {
                    status = FileStatus::Renamed;
                    old_path = unquote(from);
                } else if let Some(to) = line.strip_prefix("rename to ") {
                    status = FileStatus::Renamed;
                    new_path = unquote(to);
                } else if let Some(from) = line.strip_prefix("copy from ") {
                    status = FileStatus::Copied;
                    old_path = unquote(from);
                } else if let Some(to) = line.strip_prefix("copy to ") {
                    status = FileStatus::Copied;
                    new_path = unquote(to);
                } else if line.starts_with("GIT binary patch")
                    || (line.starts_with("Binary files ") && line.ends_with(" differ"))
                {
                    is_binary = true;
                } else if let Some(path) = line.strip_prefix("--- ").and_then(side_path) {
                    old_path = path;
                } else if let Some(path) = line.strip_prefix("+++ ").and_then(side_path) {
                    new_path = path;
                }
            } else if let Some(hunk) = current.as_mut() {
                hunk.push_line(line);
            }
        }
        hunks.extend(current);

        // Added/deleted files name the same path on both sides.
        match status {
            FileStatus::Added if new_path.is_empty() => new_path = old_path.clone(),
            FileStatus::Added => old_path = new_path.clone(),
            FileStatus::Deleted if old_path.is_empty() => old_path = new_path.clone(),
            FileStatus::Deleted => new_path = old_path.clone(),
            _ => {}
        }
        if old_path.is_empty() && new_path.is_empty() {
            debug!(header, "skipping file block without a path");
            return None;
        }
        if old_path.is_empty() {
            old_path = new_path.clone();
        } else if new_path.is_empty() {
            new_path = old_path.clone();
        }

        Some(FileDiff {
            status,
            old_path,
            new_path,
            is_binary,
            hunks,
        })
    }

    /// Path to show for this file: the after path, which for deletions is
    /// the removed path.
    pub fn path(&self) -> &str {
        &self.new_path
    }

    /// `(from, to)` for renamed or copied files.
    pub fn rename(&self) -> Option<(&str, &str)> {
        match self.status {
            FileStatus::Renamed | FileStatus::Copied => {
                Some((self.old_path.as_str(), self.new_path.as_str()))
            }
            _ => None,
        }
    }

    /// Lower-cased extension of the display path, if any.
    pub fn extension(&self) -> Option<String> {
        let name = file_name(self.path());
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    pub fn changes(&self) -> ChangeCounts {
        ChangeCounts {
            additions: self.hunks.iter().map(Hunk::additions).sum(),
            deletions: self.hunks.iter().map(Hunk::deletions).sum(),
        }
    }

    pub fn changed_lines(&self) -> ChangedLines {
        changed_line_numbers(&self.hunks)
    }
}

/// Final path component.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Header lines are matched without a CRLF terminator's `\r`.
fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split `a/<old> b/<new>` from a `diff --git` header.
///
/// Paths may contain spaces, so prefer the split where both halves name the
/// same file and fall back to the first ` b/`. Either side may be quoted.
fn split_header_paths(header: &str) -> Option<(String, String)> {
    let header = header.trim();
    if let Some(rest) = header.strip_prefix('"') {
        let (old, rest) = parse_quoted(rest)?;
        let new = unquote(rest.trim_start());
        return Some((strip_side(&old, "a/"), strip_side(&new, "b/")));
    }
    if header.ends_with('"') {
        let at = header.rfind(" \"")?;
        let new = unquote(&header[at + 1..]);
        return Some((strip_side(&header[..at], "a/"), strip_side(&new, "b/")));
    }

    let splits: Vec<usize> = header.match_indices(" b/").map(|(i, _)| i).collect();
    let pick = splits
        .iter()
        .copied()
        .find(|&i| header[..i].strip_prefix("a/") == Some(&header[i + 3..]))
        .or_else(|| splits.first().copied())?;

    let old = header[..pick].strip_prefix("a/").unwrap_or(&header[..pick]);
    Some((unquote(old), unquote(&header[pick + 3..])))
}

/// Path from a `---`/`+++` line, `None` for `/dev/null`.
fn side_path(rest: &str) -> Option<String> {
    let rest = rest.split('\t').next().unwrap_or(rest);
    if rest == "/dev/null" {
        return None;
    }
    let rest = unquote(rest);
    Some(
        rest.strip_prefix("a/")
            .or_else(|| rest.strip_prefix("b/"))
            .unwrap_or(&rest)
            .to_string(),
    )
}

fn strip_side(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Decode a C-style quoted path as git writes it; plain paths pass through.
fn unquote(path: &str) -> String {
    match path.strip_prefix('"').and_then(parse_quoted) {
        Some((decoded, rest)) if rest.is_empty() => decoded,
        _ => path.to_string(),
    }
}

/// Decode the body of a quoted string up to its closing quote, returning the
/// text and whatever follows the quote. Octal escapes are raw bytes.
fn parse_quoted(body: &str) -> Option<(String, &str)> {
    let mut bytes = Vec::new();
    let mut iter = body.bytes().enumerate();
    while let Some((i, byte)) = iter.next() {
        match byte {
            b'"' => return Some((String::from_utf8_lossy(&bytes).into_owned(), &body[i + 1..])),
            b'\\' => {
                let (_, escaped) = iter.next()?;
                match escaped {
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            let (_, digit) = iter.next()?;
                            if !(b'0'..=b'7').contains(&digit) {
                                return None;
                            }
                            value = value * 8 + u32::from(digit - b'0');
                        }
                        bytes.push(u8::try_from(value).ok()?);
                    }
                    b'n' => bytes.push(b'\n'),
                    b't' => bytes.push(b'\t'),
                    b'r' => bytes.push(b'\r'),
                    b'a' => bytes.push(0x07),
                    b'b' => bytes.push(0x08),
                    b'f' => bytes.push(0x0c),
                    b'v' => bytes.push(0x0b),
                    other => bytes.push(other),
                }
            }
            other => bytes.push(other),
        }
    }
    None
}
