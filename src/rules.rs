//! Ordered rule records used by the command and prompt gates.
//!
//! A rule is `{matcher, message, exemption}`. Tables are immutable statics
//! evaluated in list order; the first matching rule wins.

use regex::{Regex, RegexBuilder};

use crate::diagnostics::log_hook_error;
use crate::error::{GateError, Result};

/// Compile `pattern`, reporting failure as `GateError::Pattern`.
pub fn try_compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| GateError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Compile a built-in pattern. A failure is logged and yields `None`,
/// which callers treat as "never matches".
pub fn compile(pattern: &str) -> Option<Regex> {
    compile_logged(pattern, false)
}

fn compile_logged(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    try_compile(pattern, case_insensitive)
        .map_err(|e| log_hook_error("rules", &e))
        .ok()
}

/// How a rule recognizes its input.
#[derive(Debug)]
pub enum Matcher {
    /// Case-insensitive regular expression; `None` if it failed to compile
    Pattern(Option<Regex>),
    /// Structural check the regex engine can't express (no look-around)
    Predicate(fn(&str) -> bool),
}

impl Matcher {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.as_ref().is_some_and(|re| re.is_match(text)),
            Matcher::Predicate(f) => f(text),
        }
    }
}

/// A single (matcher, message) rule with an optional exemption token.
#[derive(Debug)]
pub struct Rule {
    pub matcher: Matcher,
    pub message: &'static str,
    /// Literal substring that disarms this rule (e.g. `--ff-only`)
    pub exemption: Option<&'static str>,
}

impl Rule {
    /// Rule backed by a case-insensitive pattern.
    ///
    /// A pattern that fails to compile is logged and never matches; the
    /// table tests assert every shipped pattern compiles.
    pub fn pattern(pattern: &str, message: &'static str) -> Self {
        Self {
            matcher: Matcher::Pattern(compile_logged(pattern, true)),
            message,
            exemption: None,
        }
    }

    pub fn predicate(f: fn(&str) -> bool, message: &'static str) -> Self {
        Self {
            matcher: Matcher::Predicate(f),
            message,
            exemption: None,
        }
    }

    /// False only for a pattern rule whose regex failed to compile
    pub fn compiles(&self) -> bool {
        !matches!(self.matcher, Matcher::Pattern(None))
    }

    pub fn exempt_with(mut self, token: &'static str) -> Self {
        self.exemption = Some(token);
        self
    }

    /// True if the rule matches and its exemption token is absent.
    pub fn applies_to(&self, text: &str) -> bool {
        if let Some(token) = self.exemption {
            if text.contains(token) {
                return false;
            }
        }
        self.matcher.is_match(text)
    }
}

/// First rule in `rules` that applies to `text`.
pub fn first_match<'a>(rules: &'a [Rule], text: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.applies_to(text))
}
