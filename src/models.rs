//! Core types for the hook gates: request envelope, decisions, wire output.

use serde::{Deserialize, Serialize};

/// Outcome of a single gate invocation.
///
/// Exactly one decision is produced per invocation. `Allow` and
/// `Continue(None)` produce no output at all; the host treats a silent,
/// successful exit as permission to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Tool call may proceed (silent).
    Allow,
    /// Tool call needs user confirmation.
    Ask(String),
    /// Tool call is blocked.
    Deny(String),
    /// Prompt may be submitted.
    ApprovePrompt,
    /// Prompt submission is blocked.
    BlockPrompt(String),
    /// Post-tool hook finished, optionally with context for the assistant.
    Continue(Option<String>),
}

impl Decision {
    /// Short label used in debug traces.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Ask(_) => "ask",
            Decision::Deny(_) => "deny",
            Decision::ApprovePrompt => "approve",
            Decision::BlockPrompt(_) => "block",
            Decision::Continue(_) => "continue",
        }
    }

    /// Reason text, if this decision carries one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Ask(r) | Decision::Deny(r) | Decision::BlockPrompt(r) => Some(r),
            Decision::Continue(m) => m.as_deref(),
            Decision::Allow | Decision::ApprovePrompt => None,
        }
    }

    /// Convert into the wire document, or `None` for a silent exit.
    pub fn to_output(&self) -> Option<HookOutput> {
        match self {
            Decision::Allow | Decision::Continue(None) => None,
            Decision::Ask(reason) => Some(HookOutput::permission("ask", reason)),
            Decision::Deny(reason) => Some(HookOutput::permission("deny", reason)),
            Decision::ApprovePrompt => Some(HookOutput::approve()),
            Decision::BlockPrompt(reason) => Some(HookOutput::block(reason)),
            Decision::Continue(Some(message)) => Some(HookOutput::continue_with(message)),
        }
    }
}

// === Hook Input/Output Types ===

/// Tool input from the host
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ToolInput {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Request envelope read from stdin.
///
/// Every field is optional; unknown keys are ignored.
#[derive(Debug, Deserialize, Default, Clone)]
#[allow(dead_code)]
pub struct HookInput {
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cwd: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hook_event_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_name: String,
    #[serde(default, deserialize_with = "lenient_tool_input")]
    pub tool_input: ToolInput,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_prompt: String,
}

impl HookInput {
    /// Parse the raw stdin payload. Anything unparsable becomes an empty envelope.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Extract command string from `tool_input`
    pub fn command(&self) -> &str {
        self.tool_input.command.as_deref().unwrap_or("")
    }

    /// Extract target file path from `tool_input`
    pub fn file_path(&self) -> &str {
        self.tool_input.file_path.as_deref().unwrap_or("")
    }
}

/// Accept `tool_input` of any JSON shape; non-objects and mistyped fields
/// collapse to the empty input instead of failing the whole envelope.
fn lenient_tool_input<'de, D>(deserializer: D) -> Result<ToolInput, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(String::from);
    Ok(ToolInput {
        command: field("command"),
        file_path: field("file_path"),
    })
}

/// `null` or a non-string value reads as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().unwrap_or_default().to_string())
}

/// Hook-specific output block
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    /// Additional context to inject into the assistant's conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Output format for hooks
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

impl HookOutput {
    /// PreToolUse permission answer (`ask` or `deny`)
    fn permission(kind: &str, reason: &str) -> Self {
        Self {
            decision: None,
            reason: None,
            hook_specific_output: Some(HookSpecificOutput {
                permission_decision: Some(kind.to_string()),
                permission_decision_reason: Some(reason.to_string()),
                additional_context: None,
            }),
        }
    }

    /// Approve prompt submission
    fn approve() -> Self {
        Self {
            decision: Some("approve".to_string()),
            reason: None,
            hook_specific_output: None,
        }
    }

    /// Block prompt submission
    fn block(reason: &str) -> Self {
        Self {
            decision: Some("block".to_string()),
            reason: Some(reason.to_string()),
            hook_specific_output: None,
        }
    }

    /// Continue after a tool ran, with context for the assistant
    fn continue_with(message: &str) -> Self {
        Self {
            decision: Some("continue".to_string()),
            reason: None,
            hook_specific_output: Some(HookSpecificOutput {
                permission_decision: None,
                permission_decision_reason: None,
                additional_context: Some(message.to_string()),
            }),
        }
    }
}
