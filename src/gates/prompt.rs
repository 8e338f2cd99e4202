//! Prompt gate: nudges complex requests toward the planning skill.
//!
//! Prompts that already name a skill pass straight through. Anything that
//! looks like a request to build something new gets a suggestion; the
//! response is an `Ask` unless block mode is configured.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::HooksConfig;
use crate::diagnostics::Trace;
use crate::error::Result;
use crate::models::{Decision, HookInput};
use crate::process::CommandRunner;
use crate::rules::{Rule, compile, first_match};

/// Max characters between a build verb and its target noun
const KEYWORD_TARGET_GAP: usize = 30;

const SKILL_INDICATORS: &[&str] = &[
    r"/spark",
    r"/autopilot",
    r"/audit",
    r"/plan",
    r"/council",
    r"\bspark\b",
    r"\bautopilot\b",
    r"\baudit\b",
];

const SUGGESTION: &str = "Complex task detected!\n\n\
Consider using /spark for proper planning:\n  \
/spark <task description>\n\n\
Benefits:\n  \
- Structured research (Exa)\n  \
- Explicit file allowlist\n  \
- Auto-handoff to autopilot\n  \
- Deterministic workflow\n\n";

static SKILLS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SKILL_INDICATORS
        .iter()
        .filter_map(|p| compile(p))
        .collect()
});

/// Complexity patterns, all sharing one suggestion
pub static COMPLEXITY: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let verb_then_target = format!(
        r"\b(implement|create|build|add|write)\b.{{0,{KEYWORD_TARGET_GAP}}}\b(feature|function|endpoint|api|service|handler)"
    );
    vec![
        Rule::pattern(&verb_then_target, SUGGESTION),
        Rule::pattern(r"\bnew\s+(feature|functionality)", SUGGESTION),
        Rule::pattern(r"\bwrite\s+(a\s+)?(function|class|method|code|script)", SUGGESTION),
        Rule::pattern(r"\bcreate\s+(a\s+)?(endpoint|api|handler|service)", SUGGESTION),
    ]
});

/// True if the prompt already invokes a skill
pub fn names_skill(prompt: &str) -> bool {
    let lower = prompt.to_lowercase();
    SKILLS.iter().any(|re| re.is_match(&lower))
}

/// Decide on a user prompt.
pub fn evaluate(prompt: &str, block: bool) -> Decision {
    if names_skill(prompt) {
        return Decision::ApprovePrompt;
    }

    let lower = prompt.to_lowercase();
    match first_match(&COMPLEXITY, &lower) {
        Some(rule) if block => Decision::BlockPrompt(format!(
            "{}Retype with /spark or rephrase to proceed.",
            rule.message
        )),
        Some(rule) => Decision::Ask(format!("{}Proceed without spark?", rule.message)),
        None => Decision::ApprovePrompt,
    }
}

/// Hook entry: evaluate `user_prompt`.
pub fn check(
    input: &HookInput,
    config: &HooksConfig,
    _runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    let prompt = input.user_prompt.as_str();
    trace.event("input", serde_json::json!({"length": prompt.len()}));
    Ok(evaluate(prompt, config.prompt.block))
}
