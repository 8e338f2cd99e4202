//! dld-hooks - policy gates for agent tool calls and prompts.
//!
//! Usage:
//!   `echo '{"tool_input": {"command": "git push origin main"}}' | dld-hooks pre-bash`
//!
//! Or in Claude Code settings.json:
//!   {
//!     "hooks": {
//!       "PreToolUse": [{
//!         "matcher": "Bash",
//!         "hooks": [
//!           { "type": "command", "command": "dld-hooks pre-bash" },
//!           { "type": "command", "command": "dld-hooks validate-spec-complete" }
//!         ]
//!       }, {
//!         "matcher": "Write|Edit|MultiEdit",
//!         "hooks": [{ "type": "command", "command": "dld-hooks pre-edit" }]
//!       }],
//!       "PostToolUse": [{
//!         "matcher": "Write|Edit|MultiEdit",
//!         "hooks": [{ "type": "command", "command": "dld-hooks post-edit" }]
//!       }],
//!       "UserPromptSubmit": [{
//!         "hooks": [{ "type": "command", "command": "dld-hooks prompt-guard" }]
//!       }]
//!     }
//!   }
//!
//! The process exits 0 on every path; a gate that fails lets the action
//! through.

use dld_hooks::config::HooksConfig;
use dld_hooks::gates::{HOOKS, find_hook, run_hook};
use dld_hooks::models::HookInput;
use dld_hooks::process::SystemRunner;
use std::env;
use std::io::{self, Read, Write};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("dld-hooks {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_main_help();
        return;
    }

    let Some(name) = args.get(1) else {
        eprintln!("Warning: no hook name given (see --help)");
        return;
    };

    if !is_valid_hook_name(name) {
        eprintln!("Warning: invalid hook name");
        return;
    }

    let Some(hook) = find_hook(name) else {
        eprintln!("Warning: unknown hook '{name}'");
        return;
    };

    let mut raw = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw) {
        // Treat unreadable input like an empty envelope
        eprintln!("Warning: failed to read stdin: {e}");
        raw.clear();
    }

    let input = HookInput::parse(&raw);
    let config = HooksConfig::load();
    let decision = run_hook(hook, &input, &config, &SystemRunner);

    let Some(output) = decision.to_output() else {
        return;
    };
    match serde_json::to_string(&output) {
        Ok(json) => {
            // The host may have stopped reading; nothing useful to do about it
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{json}").and_then(|_| stdout.flush());
        }
        Err(e) => eprintln!("Error serializing output: {e}"),
    }
}

/// Hook names are restricted to `[A-Za-z0-9._-]+`
fn is_valid_hook_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn print_main_help() {
    eprintln!("dld-hooks - policy gates for agent tool calls and prompts");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  dld-hooks <hook>             Read hook input from stdin, print decision");
    eprintln!("  dld-hooks --help             Show this help");
    eprintln!("  dld-hooks --version          Show version");
    eprintln!();
    eprintln!("HOOKS:");
    for hook in HOOKS {
        eprintln!("  {}", hook.name);
    }
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("  CLAUDE_PROJECT_DIR           Project root (default: current directory)");
    eprintln!("  CLAUDE_CURRENT_SPEC_PATH     Task spec with an Allowed Files section");
    eprintln!("  DLD_HOOK_DEBUG=1             Emit JSON debug trace");
    eprintln!("  DLD_HOOK_LOG_FILE            Write the debug trace to a file instead of stderr");
    eprintln!();
    eprintln!("CONFIG:");
    eprintln!("  .claude/hooks/hooks.toml         Shared overrides");
    eprintln!("  .claude/hooks/hooks.local.toml   Personal overrides (not committed)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_name_validation() {
        for name in ["pre-bash", "prompt_guard", "post.edit", "X1"] {
            assert!(is_valid_hook_name(name), "{name}");
        }
        for name in ["", "../pre-bash", "pre bash", "pre-bash;rm", "hook/x"] {
            assert!(!is_valid_hook_name(name), "{name}");
        }
    }

    #[test]
    fn test_every_hook_name_is_valid() {
        for hook in HOOKS {
            assert!(is_valid_hook_name(hook.name));
            assert!(is_valid_hook_name(hook.log_name));
        }
    }
}
