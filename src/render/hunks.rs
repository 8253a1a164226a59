use super::rename_line;
use crate::diff::{FileDiff, FileStatus, HunkLine};
use crate::reconstruct::is_binary;

/// Append changed lines only, hunk by hunk.
///
/// Added and deleted files get a synthetic header and a one-line summary
/// instead of their whole body.
pub(super) fn render(out: &mut String, files: &[FileDiff]) {
    for file in files {
        render_file(out, file);
    }
}

fn render_file(out: &mut String, file: &FileDiff) {
    let changes = file.changes();
    out.push_str(&format!("\n## {} ({})\n", file.path(), file.status));
    if let Some(line) = rename_line(file) {
        out.push_str(&line);
    }

    // Same policy as full mode, minus content sniffing: nothing is fetched.
    if is_binary(file, None, None, false) {
        out.push_str("(binary file)\n");
    } else {
        match file.status {
            FileStatus::Added => {
                let n = changes.additions;
                out.push_str(&format!("@@ -0,0 +1,{n} @@\n"));
                out.push_str(&format!("(new file, {n} lines)\n"));
            }
            FileStatus::Deleted => {
                let n = changes.deletions;
                out.push_str(&format!("@@ -1,{n} +0,0 @@\n"));
                out.push_str(&format!("(deleted file, {n} lines)\n"));
            }
            FileStatus::Modified | FileStatus::Renamed | FileStatus::Copied => {
                for hunk in &file.hunks {
                    match &hunk.section {
                        Some(section) => out.push_str(&format!("{} {section}\n", hunk.header())),
                        None => out.push_str(&format!("{}\n", hunk.header())),
                    }
                    for line in &hunk.lines {
                        if !matches!(line, HunkLine::Context(_)) {
                            out.push(line.marker());
                            out.push_str(line.text());
                            out.push('\n');
                        }
                    }
                }
            }
        }
    }

    out.push_str(&format!("{changes}\n"));
}
