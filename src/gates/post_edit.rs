//! Post-edit formatter: runs `ruff` on Python files after a write.
//!
//! Never blocks. The outcome is at most an informational message attached
//! to a `continue` response.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::HooksConfig;
use crate::diagnostics::Trace;
use crate::error::{GateError, Result};
use crate::models::{Decision, HookInput};
use crate::process::{CommandRunner, FORMAT_TIMEOUT, ProcessError};

/// Tools that write files
pub const FILE_WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Error, warning and pyflakes checks only
const LINT_SELECT: &str = "--select=E,W,F";

/// Cap on warning lines passed back to the host
const MAX_LINT_WARNINGS: usize = 5;

const FORMATTER: &str = "ruff";

/// What happened when the formatter ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Success,
    NotFound,
    TimedOut,
    Failed(String),
}

impl FormatOutcome {
    fn label(&self) -> &'static str {
        match self {
            FormatOutcome::Success => "success",
            FormatOutcome::NotFound => "not_found",
            FormatOutcome::TimedOut => "timed_out",
            FormatOutcome::Failed(_) => "failed",
        }
    }
}

/// Run `ruff format` on `path`.
pub fn format_python_file(runner: &dyn CommandRunner, path: &Path) -> FormatOutcome {
    let file = path.to_string_lossy();
    match runner.run(FORMATTER, &["format", &file], FORMAT_TIMEOUT) {
        Ok(output) if output.success() => FormatOutcome::Success,
        Ok(output) if output.stderr.trim().is_empty() => {
            FormatOutcome::Failed("format failed".to_string())
        }
        Ok(output) => FormatOutcome::Failed(output.stderr.trim().to_string()),
        Err(ProcessError::NotFound) => FormatOutcome::NotFound,
        Err(ProcessError::TimedOut(_)) => FormatOutcome::TimedOut,
        Err(source) => FormatOutcome::Failed(
            GateError::Process {
                program: FORMATTER.to_string(),
                source,
            }
            .to_string(),
        ),
    }
}

/// Lint warnings for `path`, at most `MAX_LINT_WARNINGS` lines.
///
/// The linter exits non-zero when it finds problems, so stdout is read
/// regardless of status. Any failure yields no warnings.
pub fn check_lint_warnings(runner: &dyn CommandRunner, path: &Path) -> Vec<String> {
    let file = path.to_string_lossy();
    let Ok(output) = runner.run(FORMATTER, &["check", &file, LINT_SELECT], FORMAT_TIMEOUT) else {
        return Vec::new();
    };
    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        return Vec::new();
    }
    stdout
        .lines()
        .take(MAX_LINT_WARNINGS)
        .map(String::from)
        .collect()
}

/// Absolute, existing path inside the project root, if this edit qualifies.
fn target_file(file_path: &str, project_root: &Path) -> Result<Option<PathBuf>> {
    if !file_path.ends_with(".py") {
        return Ok(None);
    }
    let path = if Path::new(file_path).is_absolute() {
        PathBuf::from(file_path)
    } else {
        project_root.join(file_path)
    };
    if !path.exists() {
        return Ok(None);
    }

    let path = fs::canonicalize(&path).map_err(|e| GateError::io(&path, e))?;
    let Ok(root) = fs::canonicalize(project_root) else {
        return Ok(None);
    };
    Ok(path.starts_with(&root).then_some(path))
}

/// Format and lint a just-written file.
pub fn evaluate(
    tool_name: &str,
    file_path: &str,
    project_root: &Path,
    runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    if !FILE_WRITE_TOOLS.contains(&tool_name) {
        return Ok(Decision::Continue(None));
    }
    let Some(path) = target_file(file_path, project_root)? else {
        return Ok(Decision::Continue(None));
    };

    let mut messages = Vec::new();

    let outcome = format_python_file(runner, &path);
    trace.event("format", serde_json::json!({"outcome": outcome.label()}));
    if outcome == FormatOutcome::Success {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        messages.push(format!("ruff format: {name}"));
    }

    let warnings = check_lint_warnings(runner, &path);
    if !warnings.is_empty() {
        messages.push(format!("lint warnings ({}):", warnings.len()));
        messages.extend(warnings.iter().map(|w| format!("  {w}")));
    }

    if messages.is_empty() {
        Ok(Decision::Continue(None))
    } else {
        Ok(Decision::Continue(Some(messages.join("\n"))))
    }
}

/// Hook entry: evaluate `tool_name` and `tool_input.file_path`.
pub fn check(
    input: &HookInput,
    config: &HooksConfig,
    runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    trace.event(
        "input",
        serde_json::json!({"tool": input.tool_name, "file": input.file_path()}),
    );
    evaluate(
        &input.tool_name,
        input.file_path(),
        &config.project_root,
        runner,
        trace,
    )
}
