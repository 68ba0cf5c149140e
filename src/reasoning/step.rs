//! Interpretation of a single completion as a reasoning step

use crate::llm::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title of a step synthesized from unstructured completion text
pub const RAW_RESPONSE_TITLE: &str = "Raw Response";

/// Title of a step synthesized from a failed transport call
pub const ERROR_TITLE: &str = "Error";

/// Continuation signal attached to every step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Continue,
    FinalAnswer,
}

impl NextAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NextAction::Continue => "continue",
            NextAction::FinalAnswer => "final_answer",
        }
    }
}

/// Which kind of call produced a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// An intermediate reasoning step
    Step,
    /// The dedicated final answer call
    FinalAnswer,
}

impl CallKind {
    fn fallback_action(self) -> NextAction {
        match self {
            CallKind::Step => NextAction::Continue,
            CallKind::FinalAnswer => NextAction::FinalAnswer,
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Step => f.write_str("step"),
            CallKind::FinalAnswer => f.write_str("final answer"),
        }
    }
}

/// One unit of model reasoning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub next_action: NextAction,
}

impl ReasoningStep {
    /// Decode a completion, falling back to a raw step when it is not a
    /// well-formed step object. Never fails.
    #[must_use]
    pub fn from_completion(text: &str, kind: CallKind) -> Self {
        match serde_json::from_str::<ReasoningStep>(text) {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!(call = %kind, error = %e, "Completion is not a step object, keeping raw text");
                Self {
                    title: RAW_RESPONSE_TITLE.to_string(),
                    content: text.to_string(),
                    next_action: kind.fallback_action(),
                }
            }
        }
    }

    /// Answer text of the final call: the `content` of a step object, or of
    /// any object whose `content` is a string, otherwise the raw text.
    #[must_use]
    pub fn answer_from_completion(text: &str) -> String {
        #[derive(Deserialize)]
        struct Answer {
            content: String,
        }

        match serde_json::from_str::<Answer>(text) {
            Ok(answer) => answer.content,
            Err(_) => Self::from_completion(text, CallKind::FinalAnswer).content,
        }
    }

    /// Step recorded in place of a failed call. Always terminal.
    #[must_use]
    pub fn from_error(kind: CallKind, error: &LlmError) -> Self {
        Self {
            title: ERROR_TITLE.to_string(),
            content: format!("Failed to generate {kind}. Error: {error}"),
            next_action: NextAction::FinalAnswer,
        }
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.next_action == NextAction::FinalAnswer
    }

    /// JSON form echoed back to the model as an assistant message.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "title": self.title,
            "content": self.content,
            "next_action": self.next_action.as_str(),
        })
        .to_string()
    }
}
