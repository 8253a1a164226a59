//! Text output in one of the three [`Mode`]s.
//!
//! Files are emitted in the order given; callers that want
//! largest-change-first ordering rank them before rendering.

mod full;
mod hunks;
mod supervisor;

use crate::content::ContentSource;
use crate::diff::{FileDiff, FileStatus};
use crate::options::{Mode, OptionsError, RenderOptions};
use tracing::info;

pub use supervisor::{RiskIndicator, notable_lines, risk_indicators};

/// Identifies the change set being rendered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitMeta {
    /// `None` for a pending (staged) change set
    pub hash: Option<String>,
    pub author: String,
    pub timestamp: String,
    /// First line of the commit message
    pub title: String,
}

impl CommitMeta {
    /// Short label: abbreviated hash, or `uncommitted`.
    pub fn label(&self) -> String {
        match &self.hash {
            Some(hash) => hash.chars().take(12).collect(),
            None => "uncommitted".to_string(),
        }
    }
}

/// Rendered text plus what the history wants to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Paths whose output hit the byte budget
    pub truncated: Vec<String>,
}

/// Render `files` for `commit`.
///
/// Fails only on invalid `options`, before any file is looked at. Problems
/// with individual files degrade that file's output and nothing else.
pub fn render<S>(
    commit: &CommitMeta,
    files: &[FileDiff],
    options: &RenderOptions,
    source: &S,
) -> Result<Rendered, OptionsError>
where
    S: ContentSource + ?Sized,
{
    options.validate()?;
    let _span = tracing::info_span!(
        "render",
        mode = %options.mode,
        commit = %commit.label()
    )
    .entered();

    let mut text = commit_header(commit);
    let truncated = match options.mode {
        Mode::Full => full::render(&mut text, files, options, source),
        Mode::Hunks => {
            hunks::render(&mut text, files);
            Vec::new()
        }
        Mode::Supervisor => {
            text.push('\n');
            supervisor::render(&mut text, files);
            Vec::new()
        }
    };

    info!(
        files = files.len(),
        truncated = truncated.len(),
        bytes = text.len(),
        "rendered"
    );
    Ok(Rendered { text, truncated })
}

fn commit_header(commit: &CommitMeta) -> String {
    let mut header = match &commit.hash {
        Some(hash) => format!("# Commit {hash}\n"),
        None => "# Uncommitted changes\n".to_string(),
    };
    for (label, value) in [
        ("Author", &commit.author),
        ("Date", &commit.timestamp),
        ("Subject", &commit.title),
    ] {
        if !value.is_empty() {
            header.push_str(&format!("{label}: {value}\n"));
        }
    }
    header
}

/// `Renamed: a -> b` / `Copied: a -> b` line, if the file has one.
fn rename_line(file: &FileDiff) -> Option<String> {
    let (from, to) = file.rename()?;
    let label = match file.status {
        FileStatus::Copied => "Copied",
        _ => "Renamed",
    };
    Some(format!("{label}: {from} -> {to}\n"))
}
