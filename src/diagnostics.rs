//! Diagnostic side channel: error log and opt-in debug trace.
//!
//! Both sinks are append-only, one complete line per write, under an
//! advisory exclusive lock so concurrent hook processes never interleave
//! partial lines. Nothing here may fail a gate; write errors are swallowed.

use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Enables the debug trace when set to `1`
pub const DEBUG_ENV: &str = "DLD_HOOK_DEBUG";

/// Redirects the debug trace from stderr to a file
pub const LOG_FILE_ENV: &str = "DLD_HOOK_LOG_FILE";

/// Get the path to the error log (`~/.cache/dld/hook-errors.log`)
pub fn error_log_path() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("dld")
        .join("hook-errors.log")
}

/// Append one line to `path`, creating parent directories as needed.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    #[allow(clippy::incompatible_msrv)] // fs2 crate method, not std
    file.lock_exclusive()?;

    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    let written = file.write_all(buf.as_bytes()).and_then(|_| file.flush());

    #[allow(clippy::incompatible_msrv)] // fs2 crate method, not std
    let _ = file.unlock();

    written
}

/// Record a gate failure in the error log at `path`. Never fails.
pub fn log_hook_error_to(path: &Path, hook: &str, error: &dyn Display) {
    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    // Keep one entry per line even if the error text spans several
    let message = error.to_string().replace('\n', " ");
    let _ = append_line(path, &format!("{ts} [{hook}]: {message}"));
}

/// Record a gate failure in the default error log. Never fails.
pub fn log_hook_error(hook: &str, error: &dyn Display) {
    log_hook_error_to(&error_log_path(), hook, error);
}

/// Debug trace settings, normally read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugSettings {
    pub enabled: bool,
    pub log_file: Option<PathBuf>,
}

impl DebugSettings {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var(DEBUG_ENV).is_ok_and(|v| v == "1"),
            log_file: std::env::var_os(LOG_FILE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Per-invocation debug trace.
///
/// Emits JSON lines `{"ts", "hook", "event", ...fields}`; `end` adds the
/// final `complete` event with the decision and elapsed milliseconds.
#[derive(Debug)]
pub struct Trace {
    hook: String,
    settings: DebugSettings,
    started: Instant,
}

impl Trace {
    pub fn new(hook: &str, settings: &DebugSettings) -> Self {
        Self {
            hook: hook.to_string(),
            settings: settings.clone(),
            started: Instant::now(),
        }
    }

    /// Trace that never writes anything
    pub fn disabled(hook: &str) -> Self {
        Self::new(hook, &DebugSettings::default())
    }

    pub fn event(&self, event: &str, fields: Value) {
        if !self.settings.enabled {
            return;
        }

        let mut entry = Map::new();
        entry.insert(
            "ts".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        entry.insert("hook".into(), Value::String(self.hook.clone()));
        entry.insert("event".into(), Value::String(event.to_string()));
        if let Value::Object(extra) = fields {
            for (k, v) in extra {
                entry.entry(k).or_insert(v);
            }
        }

        let Ok(line) = serde_json::to_string(&Value::Object(entry)) else {
            return;
        };
        match &self.settings.log_file {
            Some(path) => {
                let _ = append_line(path, &line);
            }
            None => eprintln!("{line}"),
        }
    }

    pub fn end(&self, decision: &str) {
        let ms = self.started.elapsed().as_secs_f64() * 1000.0;
        self.event(
            "complete",
            serde_json::json!({"decision": decision, "ms": format!("{ms:.1}")}),
        );
    }
}
