use super::rename_line;
use crate::classify::{is_known_text, language_for};
use crate::content::{BlobRef, ContentSource, Side};
use crate::diff::{FileDiff, FileStatus};
use crate::options::RenderOptions;
use crate::reconstruct::{Origin, Reconstruction, reconstruct};
use rayon::prelude::*;

/// Append every file in full, returning the paths that were truncated.
///
/// Fetch and reconstruction run in parallel; output keeps the input order.
pub(super) fn render<S>(
    out: &mut String,
    files: &[FileDiff],
    options: &RenderOptions,
    source: &S,
) -> Vec<String>
where
    S: ContentSource + ?Sized,
{
    let reconstructions: Vec<Reconstruction> = files
        .par_iter()
        .map(|file| reconstruct_file(file, options, source))
        .collect();

    let mut truncated = Vec::new();
    for (file, reconstruction) in files.iter().zip(&reconstructions) {
        render_file(out, file, reconstruction);
        if reconstruction.is_truncated() {
            truncated.push(file.path().to_string());
        }
    }
    truncated
}

fn reconstruct_file<S>(file: &FileDiff, options: &RenderOptions, source: &S) -> Reconstruction
where
    S: ContentSource + ?Sized,
{
    // Don't fetch what the binary policy will throw away anyway.
    let skip_fetch = file.is_binary && !is_known_text(file.path());
    let fetch = |side: Side, path: &str| {
        if skip_fetch {
            return None;
        }
        source.fetch_blob(BlobRef { side, path }, options.max_file_bytes)
    };

    let before = match file.status {
        FileStatus::Added => None,
        _ => fetch(Side::Before, &file.old_path),
    };
    let after = match file.status {
        FileStatus::Deleted => None,
        _ => fetch(Side::After, &file.new_path),
    };

    reconstruct(file, before.as_deref(), after.as_deref(), options)
}

fn render_file(out: &mut String, file: &FileDiff, reconstruction: &Reconstruction) {
    out.push_str(&format!("\n## {}\n", file.path()));
    out.push_str(&format!("Status: {}\n", file.status));
    if let Some(line) = rename_line(file) {
        out.push_str(&line);
    }
    out.push_str(&format!("Language: {}\n", language_for(file.path())));

    match reconstruction.origin {
        Origin::BinaryOmitted => {
            out.push_str("(binary file omitted)\n");
            return;
        }
        Origin::HunkFallback => out.push_str("Content: hunks only (full file unavailable)\n"),
        Origin::FullFile => {}
    }

    out.push_str("```diff\n");
    for line in &reconstruction.lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    if let Some(truncation) = reconstruction.truncation {
        out.push_str(&truncation.to_string());
        out.push('\n');
    }
    out.push_str("```\n");
}
