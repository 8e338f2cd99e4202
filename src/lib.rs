//! DLD Hooks - policy gates for an AI coding agent's tool calls and prompts.
//!
//! Each gate reads the host's JSON request, classifies it, and produces a
//! decision (allow, deny, ask, approve, block, continue) serialized to the
//! host's wire format. Gates fail open: any internal error lets the action
//! through and is recorded in an error log.
//!
//! # Example
//!
//! ```
//! use dld_hooks::gates::command;
//! use dld_hooks::Decision;
//!
//! // Safe command - allowed, no output
//! assert_eq!(command::evaluate("git status"), Decision::Allow);
//! assert!(Decision::Allow.to_output().is_none());
//!
//! // Hard reset - denied
//! let decision = command::evaluate("git reset --hard HEAD~1");
//! let output = decision.to_output().unwrap();
//! let specific = output.hook_specific_output.unwrap();
//! assert_eq!(specific.permission_decision.as_deref(), Some("deny"));
//! ```

pub mod allowlist;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gates;
pub mod models;
pub mod process;
pub mod rules;

pub use config::HooksConfig;
pub use error::GateError;
pub use gates::{evaluate_safely, run_hook};
pub use models::{Decision, HookInput, HookOutput};
