//! Thin adapter over the `git` executable: raw diff text, commit metadata
//! and blobs for the content gateway.

use crate::content::{BlobRef, ContentSource, Side};
use crate::render::CommitMeta;
use error_set::error_set;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

error_set! {
    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
    }
}

/// The change set to look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A commit, compared with its first parent
    Commit(String),
    /// The index, compared with `HEAD`
    Staged,
}

impl Revision {
    /// Object spec naming `path` on one side of this change.
    fn blob_spec(&self, side: Side, path: &str) -> String {
        match (self, side) {
            (Revision::Commit(rev), Side::Before) => format!("{rev}^:{path}"),
            (Revision::Commit(rev), Side::After) => format!("{rev}:{path}"),
            (Revision::Staged, Side::Before) => format!("HEAD:{path}"),
            (Revision::Staged, Side::After) => format!(":{path}"),
        }
    }
}

/// A repository on disk, driven through the `git` command.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Raw unified diff text for `revision`, with rename detection.
    pub fn raw_diff(&self, revision: &Revision) -> Result<String, GitCommandError> {
        match revision {
            Revision::Commit(rev) => self.run_text(&[
                "diff-tree",
                "-p",
                "-M",
                "--root",
                "--no-commit-id",
                "--no-color",
                rev.as_str(),
            ]),
            Revision::Staged => self.run_text(&[
                "diff",
                "--cached",
                "-M",
                "--no-ext-diff",
                "--no-color",
            ]),
        }
    }

    /// Metadata for `revision`. Staged changes carry the configured author
    /// and no hash.
    pub fn commit_meta(&self, revision: &Revision) -> Result<CommitMeta, GitCommandError> {
        match revision {
            Revision::Commit(rev) => {
                let out = self.run_text(&[
                    "show",
                    "-s",
                    "--format=%H%x00%an%x00%aI%x00%s",
                    rev.as_str(),
                ])?;
                let mut fields = out.trim_end_matches('\n').splitn(4, '\0');
                let mut next = || fields.next().unwrap_or_default().to_string();
                Ok(CommitMeta {
                    hash: Some(next()),
                    author: next(),
                    timestamp: next(),
                    title: next(),
                })
            }
            Revision::Staged => {
                let author = self
                    .run_text(&["config", "user.name"])
                    .map(|name| name.trim().to_string())
                    .unwrap_or_default();
                Ok(CommitMeta {
                    hash: None,
                    author,
                    timestamp: String::new(),
                    title: String::new(),
                })
            }
        }
    }

    /// Content gateway for the two sides of `revision`.
    pub fn content(&self, revision: Revision) -> GitContent<'_> {
        GitContent {
            repo: self,
            revision,
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, GitCommandError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                command,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    fn run_text(&self, args: &[&str]) -> Result<String, GitCommandError> {
        let stdout = self.run(args)?;
        String::from_utf8(stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            command: args.first().copied().unwrap_or_default().to_string(),
            message: e.to_string(),
        })
    }
}

/// Blobs of one revision, fetched with `git cat-file`.
#[derive(Debug, Clone)]
pub struct GitContent<'a> {
    repo: &'a GitRepo,
    revision: Revision,
}

impl GitContent<'_> {
    fn fetch(&self, spec: &str, max_bytes: u64) -> Result<Option<String>, GitCommandError> {
        let size: u64 = self
            .repo
            .run_text(&["cat-file", "-s", spec])?
            .trim()
            .parse()
            .unwrap_or(u64::MAX);
        if size > max_bytes {
            debug!(spec, size, max_bytes, "blob over size limit");
            return Ok(None);
        }
        Ok(String::from_utf8(self.repo.run(&["cat-file", "blob", spec])?).ok())
    }
}

impl ContentSource for GitContent<'_> {
    fn fetch_blob(&self, blob: BlobRef<'_>, max_bytes: u64) -> Option<String> {
        let spec = self.revision.blob_spec(blob.side, blob.path);
        match self.fetch(&spec, max_bytes) {
            Ok(content) => content,
            Err(err) => {
                debug!(spec = %spec, %err, "blob unavailable");
                None
            }
        }
    }
}
