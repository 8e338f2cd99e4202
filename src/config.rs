//! Hook configuration: environment overrides plus optional TOML tuning files.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `<project>/.claude/hooks/hooks.toml` (shared)
//! 3. `<project>/.claude/hooks/hooks.local.toml` (not committed, user-specific)
//!
//! The TOML files tune the data of the file-edit gate, the prompt gate's
//! response mode, the commit-time spec checks and the always-allowed set.
//! Rule tables are fixed.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::{DebugSettings, error_log_path, log_hook_error_to};
use crate::error::{GateError, Result};

/// Project root override set by the host
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Explicit spec document override
pub const SPEC_PATH_ENV: &str = "CLAUDE_CURRENT_SPEC_PATH";

/// Files always allowed to edit, regardless of spec
pub const DEFAULT_ALWAYS_ALLOWED: &[&str] = &[
    "ai/features/*.md",
    "ai/backlog.md",
    "ai/diary/*",
    ".gitignore",
    "pyproject.toml",
    ".claude/*",
];

/// File-edit gate tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EditPolicy {
    /// Path fragments that may never be edited
    pub protected_paths: Vec<String>,
    pub max_loc_code: usize,
    pub max_loc_test: usize,
    /// Fraction of the ceiling at which to start warning
    pub warn_threshold: f64,
    /// Directories mirrored under `template/`
    pub sync_zones: Vec<String>,
    /// Project-specific files inside sync zones that never get reminders
    pub exclude_from_sync: Vec<String>,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            protected_paths: strings(&["tests/contracts/", "tests/regression/"]),
            max_loc_code: 400,
            max_loc_test: 600,
            // 7/8 gives round thresholds: 350 (code), 525 (tests)
            warn_threshold: 7.0 / 8.0,
            sync_zones: strings(&[".claude/", "scripts/"]),
            exclude_from_sync: strings(&[
                ".claude/rules/localization.md",
                ".claude/rules/template-sync.md",
                ".claude/rules/git-local-folders.md",
                ".claude/CUSTOMIZATIONS.md",
                ".claude/settings.local.json",
            ]),
        }
    }
}

impl EditPolicy {
    /// LOC at which the gate starts asking, for a given ceiling
    pub fn warn_at(&self, ceiling: usize) -> usize {
        (ceiling as f64 * self.warn_threshold).floor() as usize
    }
}

/// Prompt gate tuning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPolicy {
    /// Reject complex prompts outright instead of asking
    pub block: bool,
}

/// Commit-time spec completeness checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementPolicy {
    /// Spec must carry an Implementation Plan with at least one task
    pub require_plan_before_code: bool,
    /// Research phase must be done in the session state
    pub require_research_for_spec: bool,
    /// Spec must carry Eval Criteria or a Tests section
    pub require_tests_in_spec: bool,
    pub min_test_cases: usize,
    pub min_research_files: usize,
}

impl Default for EnforcementPolicy {
    fn default() -> Self {
        Self {
            require_plan_before_code: true,
            require_research_for_spec: true,
            require_tests_in_spec: true,
            min_test_cases: 3,
            min_research_files: 2,
        }
    }
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct HooksConfig {
    pub project_root: PathBuf,
    /// Explicit spec path; `None` means infer from the git branch
    pub spec_override: Option<PathBuf>,
    pub debug: DebugSettings,
    /// Where gate failures are recorded
    pub error_log: PathBuf,
    pub edit: EditPolicy,
    pub prompt: PromptPolicy,
    pub enforcement: EnforcementPolicy,
    pub always_allowed: Vec<String>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            spec_override: None,
            debug: DebugSettings::default(),
            error_log: error_log_path(),
            edit: EditPolicy::default(),
            prompt: PromptPolicy::default(),
            enforcement: EnforcementPolicy::default(),
            always_allowed: strings(DEFAULT_ALWAYS_ALLOWED),
        }
    }
}

/// On-disk override file (subset of fields, all optional)
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    pre_edit: PreEditSection,
    #[serde(default)]
    prompt_guard: PromptGuardSection,
    #[serde(default)]
    enforcement: EnforcementSection,
    #[serde(default)]
    allowlist: AllowlistSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PreEditSection {
    protected_paths: Option<Vec<String>>,
    max_loc_code: Option<usize>,
    max_loc_test: Option<usize>,
    warn_threshold: Option<f64>,
    sync_zones: Option<Vec<String>>,
    exclude_from_sync: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PromptGuardSection {
    block: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EnforcementSection {
    require_plan_before_code: Option<bool>,
    require_research_for_spec: Option<bool>,
    require_tests_in_spec: Option<bool>,
    min_test_cases: Option<usize>,
    min_research_files: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AllowlistSection {
    always_allowed: Option<Vec<String>>,
}

impl HooksConfig {
    /// Load from the process environment and current directory.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_with(
            |key| std::env::var(key).ok(),
            &cwd,
            DebugSettings::from_env(),
            error_log_path(),
        )
    }

    /// Load using an injected variable lookup (tests avoid mutating the real env).
    pub fn load_with<F>(var: F, cwd: &Path, debug: DebugSettings, error_log: PathBuf) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_root = var(PROJECT_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.to_path_buf());
        let spec_override = var(SPEC_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let mut config = HooksConfig {
            project_root,
            spec_override,
            debug,
            error_log,
            ..Default::default()
        };

        let hooks_dir = config.project_root.join(".claude").join("hooks");
        for name in ["hooks.toml", "hooks.local.toml"] {
            let path = hooks_dir.join(name);
            if !path.exists() {
                continue;
            }
            match Self::load_file(&path) {
                Ok(file) => config.merge(file),
                Err(e) => log_hook_error_to(&config.error_log, "config", &e),
            }
        }

        config
    }

    fn load_file(path: &Path) -> Result<ConfigFile> {
        let content = fs::read_to_string(path).map_err(|e| GateError::io(path, e))?;
        toml::from_str(&content).map_err(|e| GateError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn merge(&mut self, file: ConfigFile) {
        let edit = file.pre_edit;
        if let Some(v) = edit.protected_paths {
            self.edit.protected_paths = v;
        }
        if let Some(v) = edit.max_loc_code {
            self.edit.max_loc_code = v;
        }
        if let Some(v) = edit.max_loc_test {
            self.edit.max_loc_test = v;
        }
        // Thresholds outside (0, 1] would make every file warn or none
        if let Some(v) = edit.warn_threshold.filter(|t| *t > 0.0 && *t <= 1.0) {
            self.edit.warn_threshold = v;
        }
        if let Some(v) = edit.sync_zones {
            self.edit.sync_zones = v;
        }
        if let Some(v) = edit.exclude_from_sync {
            self.edit.exclude_from_sync = v;
        }
        if let Some(v) = file.prompt_guard.block {
            self.prompt.block = v;
        }
        let enforcement = file.enforcement;
        if let Some(v) = enforcement.require_plan_before_code {
            self.enforcement.require_plan_before_code = v;
        }
        if let Some(v) = enforcement.require_research_for_spec {
            self.enforcement.require_research_for_spec = v;
        }
        if let Some(v) = enforcement.require_tests_in_spec {
            self.enforcement.require_tests_in_spec = v;
        }
        if let Some(v) = enforcement.min_test_cases {
            self.enforcement.min_test_cases = v;
        }
        if let Some(v) = enforcement.min_research_files {
            self.enforcement.min_research_files = v;
        }
        if let Some(v) = file.allowlist.always_allowed {
            self.always_allowed = v;
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
