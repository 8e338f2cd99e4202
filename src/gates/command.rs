//! Shell command gate.
//!
//! Hard rules deny outright; soft rules ask. Both tables are checked
//! against the raw command text in order, and the first applicable rule
//! supplies the message.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::HooksConfig;
use crate::diagnostics::Trace;
use crate::error::Result;
use crate::models::{Decision, HookInput};
use crate::process::CommandRunner;
use crate::rules::{Rule, compile, first_match};

// Characters that may not touch a protected branch name on either side
// (so `feature/main-fix` and `mainline` don't count as `main`).
const PUSH_TO_MAIN: &str = r"git\s+push\b[^|]*(?:^|[^A-Za-z0-9_-])main(?:[^A-Za-z0-9_-]|$)";
const HARD_RESET: &str = r"git\s+reset\s+--hard";
const FORCE_THEN_BRANCH: &str = r"git\s+push\s+(?:-f|--force)(?:\s[^|]*)?[^A-Za-z0-9_-](?:develop|main)(?:[^A-Za-z0-9_-]|$)";
const BRANCH_THEN_FORCE: &str = r"git\s+push\b[^|]*[^A-Za-z0-9_-](?:develop|main)(?:[^A-Za-z0-9_-][^|]*)?\s(?:-f|--force)(?:\s|$)";
const MERGE: &str = r"git\s+merge(?:\s|$)";

const MSG_PUSH_TO_MAIN: &str = "Push to main blocked!\n\n\
Use PR workflow: develop -> PR -> main\n\
Direct push to main is forbidden.\n\n\
See: CLAUDE.md -> Git Autonomous Mode";

const MSG_CLEAN: &str = "git clean -fd blocked!\n\n\
Destroys untracked files from other agents.\n\
Safe alternatives:\n  \
git checkout -- .     # reset tracked only\n  \
git stash -u          # stash with recovery\n  \
git clean -fdn        # dry-run first\n\n\
See: CLAUDE.md -> Multi-Agent Safety";

const MSG_RESET: &str = "git reset --hard blocked!\n\n\
Wipes uncommitted work from all agents.\n\
Safe alternatives:\n  \
git checkout -- .     # reset tracked only\n  \
git stash             # save work first\n\n\
See: CLAUDE.md -> Multi-Agent Safety";

const MSG_FORCE_PUSH: &str = "Force push to protected branch blocked!\n\n\
Force push allowed only on feature branches.\n\
Protected: develop, main\n\n\
Safe alternatives:\n  \
git push --force-with-lease  # checks remote state first\n  \
git push -f origin feature/{ID}  # force push feature branch\n\n\
See: CLAUDE.md -> Git Autonomous Mode";

const MSG_MERGE: &str = "Use --ff-only for merges!\n\n\
Rebase-first workflow required:\n  \
1. git rebase origin/develop  # in worktree\n  \
2. git push -f origin {branch}  # force push feature\n  \
3. git merge --ff-only {branch}  # in main repo\n\n\
See: CLAUDE.md -> Rebase Workflow";

/// Token that turns any force push into a checked one
const LEASE: &str = "--force-with-lease";

/// Rules that deny, in priority order
pub static HARD_BLOCKS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::pattern(PUSH_TO_MAIN, MSG_PUSH_TO_MAIN),
        Rule::predicate(is_destructive_clean, MSG_CLEAN),
        Rule::pattern(HARD_RESET, MSG_RESET),
        Rule::pattern(FORCE_THEN_BRANCH, MSG_FORCE_PUSH).exempt_with(LEASE),
        Rule::pattern(BRANCH_THEN_FORCE, MSG_FORCE_PUSH).exempt_with(LEASE),
    ]
});

/// Rules that ask for confirmation
pub static SOFT_BLOCKS: LazyLock<Vec<Rule>> =
    LazyLock::new(|| vec![Rule::pattern(MERGE, MSG_MERGE).exempt_with("--ff-only")]);

static GIT_CLEAN: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)\bgit\s+clean(?:\s|$)"));

/// `git clean` with both force and directory flags and no dry-run flag.
///
/// Flags may be clustered (`-fdx`, `-xdf`) or separate (`-f -d`,
/// `--force -d`). Any short cluster containing `n`, or `--dry-run`,
/// makes the invocation a preview.
pub fn is_destructive_clean(command: &str) -> bool {
    let Some(re) = GIT_CLEAN.as_ref() else {
        return false;
    };

    re.find_iter(command).any(|m| {
        let rest = &command[m.end()..];
        // Flags stop at the next shell separator
        let args = rest.split(['|', ';', '&', '\n']).next().unwrap_or("");

        let mut force = false;
        let mut dirs = false;
        for token in args.split_whitespace() {
            let token = token.to_ascii_lowercase();
            if token == "--dry-run" {
                return false;
            }
            if token == "--force" {
                force = true;
            } else if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.starts_with('-')) {
                if cluster.contains('n') {
                    return false;
                }
                force |= cluster.contains('f');
                dirs |= cluster.contains('d');
            }
        }
        force && dirs
    })
}

/// Decide on a shell command. Never fails.
pub fn evaluate(command: &str) -> Decision {
    if let Some(rule) = first_match(&HARD_BLOCKS, command) {
        return Decision::Deny(rule.message.to_string());
    }
    if let Some(rule) = first_match(&SOFT_BLOCKS, command) {
        return Decision::Ask(rule.message.to_string());
    }
    Decision::Allow
}

/// Hook entry: evaluate `tool_input.command`.
pub fn check(
    input: &HookInput,
    _config: &HooksConfig,
    _runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    let command = input.command();
    trace.event("input", serde_json::json!({"command": command}));
    Ok(evaluate(command))
}
