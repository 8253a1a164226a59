//! Lookup tables for the heuristics layered on top of the diff model.
//!
//! Everything here is data: extend a table rather than adding branches to
//! the reconstruction or rendering code.

use crate::diff::file::file_name;
use regex::Regex;
use std::sync::LazyLock;

/// Language hint by extension, used to label rendered files.
const LANGUAGES_BY_EXTENSION: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("pyi", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("go", "go"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("swift", "swift"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("rb", "ruby"),
    ("php", "php"),
    ("sh", "bash"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("nix", "nix"),
    ("lua", "lua"),
    ("sql", "sql"),
    ("html", "html"),
    ("css", "css"),
    ("scss", "scss"),
    ("vue", "vue"),
    ("json", "json"),
    ("yaml", "yaml"),
    ("yml", "yaml"),
    ("toml", "toml"),
    ("xml", "xml"),
    ("md", "markdown"),
    ("txt", "text"),
];

const LANGUAGES_BY_NAME: &[(&str, &str)] = &[
    ("Dockerfile", "dockerfile"),
    ("Makefile", "makefile"),
    ("CMakeLists.txt", "cmake"),
    ("Gemfile", "ruby"),
    ("Rakefile", "ruby"),
];

/// Names of files that are text even when the diff tool calls them binary.
const TEXT_FILE_NAMES: &[&str] = &[
    "Dockerfile",
    "Makefile",
    "Gemfile",
    "Procfile",
    "Rakefile",
    "Jenkinsfile",
    "LICENSE",
    "README",
    "CODEOWNERS",
    ".gitignore",
    ".gitattributes",
    ".dockerignore",
    ".editorconfig",
    ".env",
    ".npmrc",
    ".prettierrc",
];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "csv", "lock", "svg",
    "xml", "env", "properties",
];

/// Path substrings that flag a change for a closer look.
const SENSITIVE_PATH_PATTERNS: &[&str] = &[
    ".env",
    "secret",
    "key",
    "credential",
    "password",
    "token",
    ".pem",
    "id_rsa",
];

/// Declaration-like constructs worth surfacing in summaries. Matched against
/// added lines with leading whitespace removed.
const NOTABLE_LINE_PATTERNS: &[&str] = &[
    r"^(pub(\([^)]*\))?\s+)?(export\s+)?(default\s+)?(async\s+)?(fn|def|function|func|class|struct|enum|trait|interface|impl|type|mod|module)\b",
    r"^(import|use|require|package|#include)\b",
    r"^from\s+\S+\s+import\b",
    r"^@[A-Za-z_][\w.]*",
    r"^#\[\w+",
    r"\b(app|router|server)\.(get|post|put|patch|delete|route)\s*\(",
];

/// Added lines above which a single file counts as a large change.
pub const LARGE_CHANGE_THRESHOLD: usize = 500;

/// How many leading bytes to sniff for NUL when detecting binary content.
const BINARY_SNIFF_BYTES: usize = 8000;

static NOTABLE_LINES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NOTABLE_LINE_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Language label for `path`, `"text"` when unknown.
pub fn language_for(path: &str) -> &'static str {
    let name = file_name(path);
    if let Some(&(_, lang)) = LANGUAGES_BY_NAME.iter().find(|&&(n, _)| n == name) {
        return lang;
    }
    extension(name)
        .and_then(|ext| {
            LANGUAGES_BY_EXTENSION
                .iter()
                .find(|&&(e, _)| e.eq_ignore_ascii_case(ext))
        })
        .map_or("text", |&(_, lang)| lang)
}

/// Whether `path` is on the allow-list of files that are always text.
pub fn is_known_text(path: &str) -> bool {
    let name = file_name(path);
    TEXT_FILE_NAMES.contains(&name)
        || name.starts_with(".env.")
        || extension(name)
            .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
}

/// Binary sniffing: a NUL byte near the start of the content.
pub fn looks_binary(content: &str) -> bool {
    content
        .as_bytes()
        .iter()
        .take(BINARY_SNIFF_BYTES)
        .any(|&b| b == 0)
}

/// First sensitive pattern found in `path`, case-insensitively.
pub fn sensitive_pattern(path: &str) -> Option<&'static str> {
    let lowered = path.to_ascii_lowercase();
    SENSITIVE_PATH_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}

pub fn is_notable(line: &str) -> bool {
    let line = line.trim_start();
    NOTABLE_LINES.iter().any(|re| re.is_match(line))
}

fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}
