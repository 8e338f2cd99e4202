//! Allowed Files enforcement.
//!
//! A task spec (`ai/features/<ID>-*.md`) may carry a `## Allowed Files`
//! section listing the paths an edit is permitted to touch. This module
//! extracts that list, matches paths against it, and infers which spec
//! applies from the current git branch.
//!
//! Everything here fails open: no spec, no section, or an unreadable file
//! means every path is allowed.

use globset::GlobBuilder;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::DEFAULT_ALWAYS_ALLOWED;
use crate::process::{CommandRunner, GIT_TIMEOUT};
use crate::rules::compile;

/// Directory holding task specs, relative to the project root
pub const FEATURES_DIR: &str = "ai/features";

/// `## Allowed Files` up to the next `##` heading or end of document
static SECTION: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?is)## Allowed Files\s*\n(.*?)(?:\n##|\z)"));

/// A path token: optional backtick/asterisk wrapping, a dot-extension,
/// optional `:line` or `:start-end` suffix
static PATH_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"[`*]*([a-zA-Z0-9_./-]+\.[a-zA-Z0-9]+(?::\d+(?:-\d+)?)?)[`*]*")
});

static LINE_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r":\d+(?:-\d+)?$"));

/// Task IDs recognized in branch names (feature/FTR-100, fix/BUG-200, ...)
static TASK_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)(?:FTR|BUG|TECH|ARCH|SEC)-\d+"));

/// Result of an allow-list lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListCheck {
    pub allowed: bool,
    /// Entries extracted from the task spec (empty when it wasn't consulted)
    pub allowed_files: Vec<String>,
}

impl AllowListCheck {
    fn allow_all() -> Self {
        Self {
            allowed: true,
            allowed_files: Vec::new(),
        }
    }
}

/// Lexically normalize a relative path.
///
/// Drops `.` segments and duplicate separators, folds `dir/..`, strips a
/// leading `./`. Empty input stays empty.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let path = if cfg!(windows) {
        path.replace('\\', "/")
    } else {
        path.to_string()
    };

    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// fnmatch-style glob: `*` and `?` may cross `/`, `[...]` classes, no escapes.
fn glob_matches(path: &str, pattern: &str) -> bool {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher().is_match(path))
        .unwrap_or(false)
}

/// Match a path against an always-allowed pattern.
///
/// A trailing `/*` means the whole subtree (nested files included), unlike
/// shell globbing where `*` stops at a separator.
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(dir) = pattern.strip_suffix('*') {
        if dir.ends_with('/') {
            return path.starts_with(dir);
        }
    }
    glob_matches(path, pattern)
}

/// Extract allowed paths from the `## Allowed Files` section of a spec.
///
/// Recognizes table rows, bullets and inline code:
/// ```text
/// | 1 | `src/main.py` | modify |
/// - `src/service.py` - main service
/// **src/models.py:10-40**
/// ```
pub fn extract_allowed_files(content: &str) -> Vec<String> {
    let (Some(section_re), Some(token_re), Some(suffix_re)) =
        (&*SECTION, &*PATH_TOKEN, &*LINE_SUFFIX)
    else {
        return Vec::new();
    };

    let Some(section) = section_re.captures(content).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    section
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| token_re.captures(line)?.get(1))
        .map(|token| suffix_re.replace(token.as_str(), "").into_owned())
        .filter(|path| !path.is_empty())
        .collect()
}

/// Read a spec file and extract its allowed paths. Unreadable → empty.
pub fn read_allowed_files(spec_path: &Path) -> Vec<String> {
    fs::read(spec_path)
        .map(|bytes| extract_allowed_files(&String::from_utf8_lossy(&bytes)))
        .unwrap_or_default()
}

/// Check a path against the default always-allowed set and the task spec.
pub fn is_allowed(file_path: &str, spec_path: Option<&Path>) -> AllowListCheck {
    let always: Vec<String> = DEFAULT_ALWAYS_ALLOWED.iter().map(|s| s.to_string()).collect();
    is_allowed_with(file_path, spec_path, &always)
}

/// Check a path against an explicit always-allowed set and the task spec.
pub fn is_allowed_with(
    file_path: &str,
    spec_path: Option<&Path>,
    always_allowed: &[String],
) -> AllowListCheck {
    let path = normalize_path(file_path);

    if always_allowed.iter().any(|p| matches_pattern(&path, p)) {
        return AllowListCheck::allow_all();
    }

    // No spec = allow all (graceful degradation)
    let Some(spec_path) = spec_path else {
        return AllowListCheck::allow_all();
    };

    let allowed_files = read_allowed_files(spec_path);
    if allowed_files.is_empty() {
        return AllowListCheck::allow_all();
    }

    let allowed = allowed_files.iter().any(|entry| entry_matches(&path, entry));

    AllowListCheck {
        allowed,
        allowed_files,
    }
}

/// Match a normalized path against one spec entry: exact, glob, then
/// subtree of an allowed directory (`dir`, `dir/` or `dir/*`).
fn entry_matches(path: &str, entry: &str) -> bool {
    let entry = normalize_path(entry);
    path == entry
        || glob_matches(path, &entry)
        || path.starts_with(&format!("{}/", entry.trim_end_matches(['/', '*'])))
}

/// Pull the task ID out of a branch name, uppercased.
pub fn task_id_from_branch(branch: &str) -> Option<String> {
    TASK_ID
        .as_ref()?
        .find(branch)
        .map(|m| m.as_str().to_uppercase())
}

/// Infer the task spec from the current git branch.
///
/// `feature/FTR-100` → first of `ai/features/FTR-100-*.md`. Any failure
/// (git missing, detached HEAD, no task ID, no file) yields `None`.
pub fn infer_spec_from_branch(runner: &dyn CommandRunner, project_root: &Path) -> Option<PathBuf> {
    let root = project_root.to_string_lossy();
    let output = runner
        .run("git", &["-C", &root, "branch", "--show-current"], GIT_TIMEOUT)
        .ok()?;
    if !output.success() {
        return None;
    }

    let task_id = task_id_from_branch(output.stdout.trim())?;
    let features = project_root.join(FEATURES_DIR);
    let pattern = format!(
        "{}/{}-*.md",
        glob::Pattern::escape(&features.to_string_lossy()),
        task_id
    );

    let mut matches: Vec<PathBuf> = glob::glob(&pattern).ok()?.filter_map(Result::ok).collect();
    matches.sort();
    matches.into_iter().next()
}
