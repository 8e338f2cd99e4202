//! File-edit gate.
//!
//! Checks, in order: allow-list (deny), protected paths (deny), size
//! ceiling (ask), template sync zone (ask).

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::allowlist::{self, normalize_path};
use crate::config::{EditPolicy, HooksConfig};
use crate::diagnostics::Trace;
use crate::error::{GateError, Result};
use crate::models::{Decision, HookInput};
use crate::process::CommandRunner;
use crate::rules::compile;

/// Allowed-file entries shown in a deny message
const LISTED_ENTRIES: usize = 10;

static TEST_FILE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(r"(?:_test\.|\.test\.|\.spec\.|(?:^|/)tests?/|__tests__/|(?:^|/)test_[^/]*\.py$)")
});

/// Path relative to the project root, normalized.
///
/// Paths outside the root are returned normalized but otherwise unchanged.
pub fn relative_path(file_path: &str, project_root: &Path) -> String {
    let path = Path::new(file_path);
    let rel = path
        .strip_prefix(project_root)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| file_path.to_string());
    normalize_path(&rel)
}

/// Test sources get the larger size ceiling
pub fn is_test_file(rel_path: &str) -> bool {
    TEST_FILE
        .as_ref()
        .is_some_and(|re| re.is_match(rel_path))
}

/// Count lines the way editors do: a trailing newline doesn't start a new one.
///
/// Streams through a buffer, so the size of the input doesn't matter.
pub fn count_lines<R: Read>(reader: R) -> io::Result<usize> {
    let mut reader = BufReader::new(reader);
    let mut newlines = 0;
    let mut last = None;
    loop {
        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if chunk.is_empty() {
            break;
        }
        newlines += chunk.iter().filter(|b| **b == b'\n').count();
        last = chunk.last().copied();
        let len = chunk.len();
        reader.consume(len);
    }
    Ok(match last {
        None => 0,
        Some(b'\n') => newlines,
        Some(_) => newlines + 1,
    })
}

/// Line count of the file at `path`, or `None` if it doesn't exist.
fn file_loc(path: &Path) -> Result<Option<usize>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GateError::io(path, e)),
    };
    count_lines(file)
        .map(Some)
        .map_err(|e| GateError::io(path, e))
}

/// Reminder for files mirrored under `template/`.
pub fn check_sync_zone(rel_path: &str, project_root: &Path, policy: &EditPolicy) -> Option<String> {
    if !policy.sync_zones.iter().any(|zone| rel_path.starts_with(zone.as_str())) {
        return None;
    }
    if policy.exclude_from_sync.iter().any(|p| p == rel_path) {
        return None;
    }
    if !project_root.join("template").join(rel_path).exists() {
        return None;
    }
    Some(format!(
        "SYNC ZONE: {rel_path}\n\n\
         This file exists in template/{rel_path}\n\
         Remember to sync changes bidirectionally.\n\n\
         See: .claude/rules/template-sync.md"
    ))
}

fn not_allowed_message(rel_path: &str, spec_path: Option<&Path>, allowed_files: &[String]) -> String {
    let spec = spec_path.map(|p| p.display().to_string());
    let listed: Vec<String> = allowed_files
        .iter()
        .take(LISTED_ENTRIES)
        .map(|f| format!("  - {f}"))
        .collect();
    format!(
        "File not in Allowed Files!\n\n\
         {rel_path}\n\n\
         Spec: {}\n\n\
         Allowed files:\n{}\n\n\
         To fix:\n\
         1. Edit {}\n\
         2. Find ## Allowed Files section\n\
         3. Add: `{rel_path}` - {{description}}\n\
         4. Save and retry\n\n\
         Or change approach to use only allowed files.",
        spec.as_deref().unwrap_or("(not found)"),
        listed.join("\n"),
        spec.as_deref().unwrap_or("(spec file)"),
    )
}

fn protected_message(rel_path: &str, policy: &EditPolicy) -> String {
    format!(
        "Protected test file!\n\n\
         {rel_path}\n\n\
         {} cannot be modified.\n\
         Fix the code, not the test.\n\n\
         See: CLAUDE.md -> Test Safety",
        policy.protected_paths.join(" and ")
    )
}

fn check_loc(
    rel_path: &str,
    loc: usize,
    max_loc: usize,
    policy: &EditPolicy,
    trace: &Trace,
) -> Option<Decision> {
    if loc >= max_loc {
        trace.event(
            "ask",
            serde_json::json!({"reason": "loc_exceeded", "file": rel_path, "loc": loc, "max": max_loc}),
        );
        return Some(Decision::Ask(format!(
            "File exceeds LOC limit!\n\n\
             {rel_path}: {loc} lines (limit: {max_loc})\n\n\
             Consider splitting the file.\n\
             See: CLAUDE.md -> File Limits\n\n\
             Proceed anyway?"
        )));
    }

    if loc >= policy.warn_at(max_loc) {
        trace.event(
            "ask",
            serde_json::json!({"reason": "loc_warning", "file": rel_path, "loc": loc, "max": max_loc}),
        );
        return Some(Decision::Ask(format!(
            "File approaching LOC limit\n\n\
             {rel_path}: {loc} lines (limit: {max_loc})\n\n\
             Proceed?"
        )));
    }

    None
}

/// Decide on an edit to `file_path` given an already-resolved spec.
pub fn evaluate(
    file_path: &str,
    config: &HooksConfig,
    spec_path: Option<&Path>,
    trace: &Trace,
) -> Result<Decision> {
    if file_path.is_empty() {
        return Ok(Decision::Allow);
    }

    let root = &config.project_root;
    let policy = &config.edit;
    let rel_path = relative_path(file_path, root);

    let check = allowlist::is_allowed_with(&rel_path, spec_path, &config.always_allowed);
    if !check.allowed {
        trace.event(
            "deny",
            serde_json::json!({"reason": "not_in_allowed_files", "file": rel_path}),
        );
        return Ok(Decision::Deny(not_allowed_message(
            &rel_path,
            spec_path,
            &check.allowed_files,
        )));
    }

    if policy
        .protected_paths
        .iter()
        .any(|p| rel_path.contains(p.as_str()))
    {
        trace.event(
            "deny",
            serde_json::json!({"reason": "protected_path", "file": rel_path}),
        );
        return Ok(Decision::Deny(protected_message(&rel_path, policy)));
    }

    let max_loc = if is_test_file(&rel_path) {
        policy.max_loc_test
    } else {
        policy.max_loc_code
    };

    let absolute = if Path::new(file_path).is_absolute() {
        PathBuf::from(file_path)
    } else {
        root.join(file_path)
    };

    // New files have nothing to measure
    if let Some(loc) = file_loc(&absolute)? {
        if let Some(decision) = check_loc(&rel_path, loc, max_loc, policy, trace) {
            return Ok(decision);
        }
    }

    if let Some(reminder) = check_sync_zone(&rel_path, root, policy) {
        trace.event("ask", serde_json::json!({"reason": "sync_zone", "file": rel_path}));
        return Ok(Decision::Ask(reminder));
    }

    Ok(Decision::Allow)
}

/// Spec for this invocation: explicit override, else inferred from the branch.
pub fn resolve_spec(config: &HooksConfig, runner: &dyn CommandRunner) -> Option<PathBuf> {
    match &config.spec_override {
        Some(path) if path.is_absolute() => Some(path.clone()),
        Some(path) => Some(config.project_root.join(path)),
        None => allowlist::infer_spec_from_branch(runner, &config.project_root),
    }
}

/// Hook entry: evaluate `tool_input.file_path`.
pub fn check(
    input: &HookInput,
    config: &HooksConfig,
    runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    let file_path = input.file_path();
    trace.event("input", serde_json::json!({"file": file_path}));
    if file_path.is_empty() {
        return Ok(Decision::Allow);
    }
    let spec = resolve_spec(config, runner);
    evaluate(file_path, config, spec.as_deref(), trace)
}
