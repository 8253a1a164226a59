use crate::classify::{LARGE_CHANGE_THRESHOLD, is_notable, sensitive_pattern};
use crate::diff::{ChangeCounts, FileDiff, HunkLine};

/// Notable added lines listed per file.
const NOTABLE_PER_FILE: usize = 3;

/// Something in the change set worth a reviewer's attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskIndicator {
    SensitivePath { path: String, pattern: &'static str },
    LargeChange { path: String, additions: usize },
}

impl std::fmt::Display for RiskIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskIndicator::SensitivePath { path, pattern } => {
                write!(f, "sensitive path ({pattern}): {path}")
            }
            RiskIndicator::LargeChange { path, additions } => {
                write!(f, "large change (+{additions}): {path}")
            }
        }
    }
}

/// Heuristic risk indicators, in file order.
pub fn risk_indicators(files: &[FileDiff]) -> Vec<RiskIndicator> {
    let mut risks = Vec::new();
    for file in files {
        if let Some(pattern) = sensitive_pattern(file.path()) {
            risks.push(RiskIndicator::SensitivePath {
                path: file.path().to_string(),
                pattern,
            });
        }
        let additions = file.changes().additions;
        if additions > LARGE_CHANGE_THRESHOLD {
            risks.push(RiskIndicator::LargeChange {
                path: file.path().to_string(),
                additions,
            });
        }
    }
    risks
}

/// Up to three added lines that look like declarations, imports or routes.
pub fn notable_lines(file: &FileDiff) -> Vec<&str> {
    file.hunks
        .iter()
        .flat_map(|hunk| &hunk.lines)
        .filter_map(|line| match line {
            HunkLine::Added(text) if is_notable(text) => Some(text.trim()),
            _ => None,
        })
        .take(NOTABLE_PER_FILE)
        .collect()
}

pub(super) fn render(out: &mut String, files: &[FileDiff]) {
    let totals: ChangeCounts = files.iter().map(FileDiff::changes).sum();
    out.push_str(&format!("Files changed: {}\n", files.len()));
    out.push_str(&format!("Lines: {totals}\n"));

    let risks = risk_indicators(files);
    if risks.is_empty() {
        out.push_str("Risk indicators: none\n");
    } else {
        out.push_str("Risk indicators:\n");
        for risk in &risks {
            out.push_str(&format!("- {risk}\n"));
        }
    }

    out.push_str("Files:\n");
    for file in files {
        out.push_str(&format!(
            "- {} ({}, {})\n",
            file.path(),
            file.status,
            file.changes()
        ));
        for line in notable_lines(file) {
            out.push_str(&format!("  > {line}\n"));
        }
    }
}
