//! Hook gates and the fail-open boundary around them.
//!
//! Each gate has a pure evaluation core plus a `check` entry that pulls its
//! fields out of the request envelope. `run_hook` wraps every check in
//! `evaluate_safely`, so any error or panic becomes the gate's fail-open
//! decision and a line in the error log.

pub mod command;
pub mod file_edit;
pub mod post_edit;
pub mod prompt;
pub mod spec_complete;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use crate::config::HooksConfig;
use crate::diagnostics::{Trace, log_hook_error_to};
use crate::error::{GateError, Result};
use crate::models::{Decision, HookInput};
use crate::process::CommandRunner;

/// Signature shared by every gate entry point
pub type HookFn = fn(&HookInput, &HooksConfig, &dyn CommandRunner, &Trace) -> Result<Decision>;

/// A hook the binary can dispatch to
pub struct HookSpec {
    /// CLI name (`dld-hooks pre-bash`), also the debug trace name
    pub name: &'static str,
    /// Tag used in the error log
    pub log_name: &'static str,
    /// Decision returned when the gate itself fails
    pub fallback: Decision,
    pub check: HookFn,
}

/// All hooks, by lifecycle event
pub static HOOKS: &[HookSpec] = &[
    HookSpec {
        name: "pre-bash",
        log_name: "pre_bash",
        fallback: Decision::Allow,
        check: command::check,
    },
    HookSpec {
        name: "pre-edit",
        log_name: "pre_edit",
        fallback: Decision::Allow,
        check: file_edit::check,
    },
    HookSpec {
        name: "prompt-guard",
        log_name: "prompt_guard",
        fallback: Decision::ApprovePrompt,
        check: prompt::check,
    },
    HookSpec {
        name: "post-edit",
        log_name: "post_edit",
        fallback: Decision::Continue(None),
        check: post_edit::check,
    },
    HookSpec {
        name: "validate-spec-complete",
        log_name: "validate_spec_complete",
        fallback: Decision::Allow,
        check: spec_complete::check,
    },
];

/// Look up a hook by CLI name (`pre-bash`) or log name (`pre_bash`).
pub fn find_hook(name: &str) -> Option<&'static HookSpec> {
    HOOKS
        .iter()
        .find(|h| h.name == name || h.log_name == name)
}

/// Run `f`, converting any error or panic into `fallback`.
///
/// The failure is recorded in `error_log` and the debug trace; the host
/// never sees it.
pub fn evaluate_safely<F>(
    hook: &str,
    error_log: &Path,
    fallback: Decision,
    trace: &Trace,
    f: F,
) -> Decision
where
    F: FnOnce() -> Result<Decision>,
{
    let outcome = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(GateError::Panic(message))
    });

    match outcome {
        Ok(decision) => decision,
        Err(e) => {
            trace.event("error", serde_json::json!({"error": e.to_string()}));
            log_hook_error_to(error_log, hook, &e);
            fallback
        }
    }
}

/// Run one hook end to end: trace, evaluate safely, report timing.
pub fn run_hook(
    hook: &HookSpec,
    input: &HookInput,
    config: &HooksConfig,
    runner: &dyn CommandRunner,
) -> Decision {
    let trace = Trace::new(hook.name, &config.debug);
    let decision = evaluate_safely(
        hook.log_name,
        &config.error_log,
        hook.fallback.clone(),
        &trace,
        || (hook.check)(input, config, runner, &trace),
    );
    trace.end(decision.label());
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> HooksConfig {
        HooksConfig {
            project_root: dir.path().to_path_buf(),
            error_log: dir.path().join("hook-errors.log"),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_hook_by_either_name() {
        assert_eq!(find_hook("pre-bash").unwrap().log_name, "pre_bash");
        assert_eq!(find_hook("prompt_guard").unwrap().name, "prompt-guard");
        assert_eq!(
            find_hook("validate-spec-complete").unwrap().log_name,
            "validate_spec_complete"
        );
        assert!(find_hook("session-end").is_none());
    }

    #[test]
    fn test_fallbacks_are_permissive() {
        for hook in HOOKS {
            assert!(
                matches!(
                    hook.fallback,
                    Decision::Allow | Decision::ApprovePrompt | Decision::Continue(None)
                ),
                "{} must fail open",
                hook.name
            );
        }
    }

    #[test]
    fn test_evaluate_safely_passes_through_success() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("hook-errors.log");
        let d = evaluate_safely("t", &log, Decision::Allow, &Trace::disabled("t"), || {
            Ok(Decision::Deny("blocked".into()))
        });
        assert_eq!(d, Decision::Deny("blocked".into()));
        assert!(!log.exists());
    }

    #[test]
    fn test_evaluate_safely_error_falls_back() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("hook-errors.log");
        let d = evaluate_safely("test_gate", &log, Decision::ApprovePrompt, &Trace::disabled("t"), || {
            Err(GateError::Pattern {
                pattern: "(".into(),
                reason: "unclosed group".into(),
            })
        });
        assert_eq!(d, Decision::ApprovePrompt);

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("[test_gate]: invalid pattern `(`: unclosed group"));
    }

    #[test]
    fn test_evaluate_safely_panic_falls_back() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("hook-errors.log");
        let d = evaluate_safely("test_gate", &log, Decision::Continue(None), &Trace::disabled("t"), || {
            panic!("boom")
        });
        assert_eq!(d, Decision::Continue(None));

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("[test_gate]: gate panicked: boom"));
    }

    #[test]
    fn test_run_hook_empty_envelope_is_fail_open() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let runner = FakeRunner::new();
        let input = HookInput::parse("{garbage");
        for hook in HOOKS {
            let decision = run_hook(hook, &input, &config, &runner);
            assert_eq!(decision, hook.fallback, "{}", hook.name);
        }
        assert!(!config.error_log.exists());
    }

    #[test]
    fn test_run_hook_logs_gate_failure_to_configured_log() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        // A directory where a file is expected can't be measured
        fs::create_dir_all(dir.path().join("src/pkg.py")).unwrap();
        let input = HookInput::parse(r#"{"tool_input": {"file_path": "src/pkg.py"}}"#);
        let hook = find_hook("pre-edit").unwrap();

        let decision = run_hook(hook, &input, &config, &FakeRunner::new());
        assert_eq!(decision, Decision::Allow);

        let content = fs::read_to_string(&config.error_log).unwrap();
        assert!(content.contains("[pre_edit]: failed to read"));
    }
}
