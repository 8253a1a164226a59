use error_set::error_set;
use std::path::PathBuf;

mod classify;
pub mod content;
pub mod diff;
pub mod git;
pub mod history;
pub mod options;
pub mod reconstruct;
pub mod render;

pub use content::{BlobRef, ContentSource, MemoryContent, NoContent, Side};
pub use diff::{Diff, DiffStats, FileDiff, FileStatus};
pub use git::{GitCommandError, GitRepo, Revision};
pub use history::{AnalysisHistory, AnalysisRecord};
pub use options::{Config, ConfigError, Mode, OptionsError, RenderOptions};
pub use render::{CommitMeta, Rendered, render};

error_set! {
    /// Top-level error for diff-annotate operations
    DiffAnnotateError := {
        OptionsError(OptionsError),
        ConfigError(ConfigError),
        GitCommandError(GitCommandError),
    }
}

/// Main interface: annotate the changes of a repository revision.
#[derive(Debug, Clone)]
pub struct Annotator {
    repo: GitRepo,
    options: RenderOptions,
    largest_first: bool,
}

impl Annotator {
    /// Create an annotator for the repository at `repo_path`.
    ///
    /// Options are validated here so a bad byte budget is reported before
    /// git is ever invoked.
    pub fn new(
        repo_path: impl Into<PathBuf>,
        options: RenderOptions,
    ) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self {
            repo: GitRepo::new(repo_path),
            options,
            largest_first: false,
        })
    }

    /// Emit files largest change first instead of in diff order.
    #[must_use]
    pub fn largest_first(mut self, largest_first: bool) -> Self {
        self.largest_first = largest_first;
        self
    }

    /// Parsed diff of `revision`.
    pub fn diff(&self, revision: &Revision) -> Result<Diff, GitCommandError> {
        Ok(Diff::parse(&self.repo.raw_diff(revision)?))
    }

    /// Render `revision` in the configured mode and record it in `history`.
    ///
    /// # Examples
    /// ```no_run
    /// # use diff_annotate::{AnalysisHistory, Annotator, Mode, RenderOptions, Revision};
    /// let options = RenderOptions { mode: Mode::Supervisor, ..RenderOptions::default() };
    /// let annotator = Annotator::new(".", options).unwrap();
    /// let mut history = AnalysisHistory::new(8);
    /// let text = annotator.annotate(&Revision::Staged, &mut history).unwrap();
    /// print!("{text}");
    /// ```
    pub fn annotate(
        &self,
        revision: &Revision,
        history: &mut AnalysisHistory,
    ) -> Result<String, DiffAnnotateError> {
        let diff = self.diff(revision)?;
        let commit = self.repo.commit_meta(revision)?;
        let source = self.repo.content(revision.clone());
        Ok(annotate_diff(
            &commit,
            &diff,
            &self.options,
            self.largest_first,
            &source,
            history,
        )?)
    }
}

/// Render raw diff text with no repository behind it.
///
/// Full mode falls back to hunk bodies for every file since no content can
/// be fetched.
pub fn annotate_text(
    raw: &str,
    options: &RenderOptions,
    largest_first: bool,
    history: &mut AnalysisHistory,
) -> Result<String, DiffAnnotateError> {
    Ok(annotate_diff(
        &CommitMeta::default(),
        &Diff::parse(raw),
        options,
        largest_first,
        &NoContent,
        history,
    )?)
}

fn annotate_diff<S>(
    commit: &CommitMeta,
    diff: &Diff,
    options: &RenderOptions,
    largest_first: bool,
    source: &S,
    history: &mut AnalysisHistory,
) -> Result<String, OptionsError>
where
    S: ContentSource + ?Sized,
{
    let ranked: Vec<FileDiff>;
    let files = if largest_first {
        ranked = diff.ranked_by_changes().into_iter().cloned().collect();
        &ranked
    } else {
        &diff.files
    };

    let rendered = render(commit, files, options, source)?;
    history.record(AnalysisRecord {
        commit: commit.hash.clone(),
        mode: options.mode,
        files: files.len(),
        changes: diff.count_changes(),
        truncated: rendered.truncated,
    });
    Ok(rendered.text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    const DIFF: &str = "diff --git a/small.txt b/small.txt\n--- a/small.txt\n+++ b/small.txt\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/big.txt b/big.txt\n--- a/big.txt\n+++ b/big.txt\n@@ -1,0 +2,3 @@\n+x\n+y\n+z\n";

    #[test]
    fn text_is_recorded_in_history() {
        let options = RenderOptions {
            mode: Mode::Supervisor,
            ..RenderOptions::default()
        };
        let mut history = AnalysisHistory::new(4);
        annotate_text(DIFF, &options, false, &mut history).unwrap();

        let record = history.latest().unwrap();
        assert_eq!(record.commit, None);
        assert_eq!(record.mode, Mode::Supervisor);
        assert_eq!(record.files, 2);
        assert_eq!(record.changes.to_string(), "+4 -1");
        assert!(record.truncated.is_empty());
    }

    #[test]
    fn largest_first_reorders_output() {
        let options = RenderOptions {
            mode: Mode::Hunks,
            ..RenderOptions::default()
        };
        let mut history = AnalysisHistory::new(4);
        let text = annotate_text(DIFF, &options, true, &mut history).unwrap();
        let big = text.find("## big.txt").unwrap();
        let small = text.find("## small.txt").unwrap();
        assert!(big < small);
    }

    #[test]
    fn zero_budget_is_rejected_up_front() {
        let options = RenderOptions {
            max_file_bytes: 0,
            ..RenderOptions::default()
        };
        assert!(matches!(
            Annotator::new(".", options),
            Err(OptionsError::ZeroByteBudget)
        ));

        let mut history = AnalysisHistory::new(4);
        let result = annotate_text(DIFF, &options, false, &mut history);
        assert!(matches!(result, Err(DiffAnnotateError::OptionsError(_))));
        assert!(history.is_empty());
    }
}
