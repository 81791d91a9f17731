//! Conversation items exchanged with the completion service.

use serde::{Deserialize, Serialize};

use crate::snapshot::SituationSnapshot;

/// Opaque handle to the completion service's accumulated context.
///
/// Round-tripped unchanged into the next request; carries no other meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A named request-for-execution emitted by the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    /// Correlation identifier assigned by the completion service.
    pub call_id: String,
    /// Tool name, expected to be one of the catalog's names.
    pub name: String,
    /// Raw JSON argument text exactly as the service produced it.
    pub arguments: String,
}

/// What happened to a proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The executor ran the command; carries its diagnostic text.
    Success(String),
    /// The operator blocked the action; carries the literal reason.
    Overridden(String),
    /// Validation or execution failed; carries the error text.
    Failed(String),
}

/// The result folded back for exactly one [`ProposedAction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub call_id: String,
    pub outcome: ActionOutcome,
}

impl ActionResult {
    pub fn success(call_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: ActionOutcome::Success(text.into()),
        }
    }

    pub fn overridden(call_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: ActionOutcome::Overridden(reason.into()),
        }
    }

    pub fn failed(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: ActionOutcome::Failed(error.into()),
        }
    }

    /// Text handed back to the model as the tool output.
    ///
    /// Overrides are passed through verbatim so the model reads the
    /// operator's own words.
    pub fn output(&self) -> String {
        match &self.outcome {
            ActionOutcome::Success(text) | ActionOutcome::Overridden(text) => text.clone(),
            ActionOutcome::Failed(error) => format!("error: {error}"),
        }
    }
}

/// One entry of the running conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationItem {
    /// User message describing the drone's current situation.
    Situation(SituationSnapshot),
    ProposedAction(ProposedAction),
    ActionResult(ActionResult),
}

/// Declarative description of one tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the accepted argument object.
    pub parameters: serde_json::Value,
    /// Reject payloads with fields outside the schema.
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_token_serializes_as_bare_string() {
        let token = ContinuationToken::new("resp_123");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"resp_123\"");
        let back: ContinuationToken = serde_json::from_str("\"resp_123\"").unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn override_output_is_the_literal_reason() {
        let result = ActionResult::overridden("call_1", "too close to the tree");
        assert_eq!(result.output(), "too close to the tree");
    }

    #[test]
    fn failed_output_is_prefixed() {
        let result = ActionResult::failed("call_1", "missing field `angle`");
        assert_eq!(result.output(), "error: missing field `angle`");
        assert_eq!(result.call_id, "call_1");
    }

    #[test]
    fn action_outcome_tagging() {
        let json = serde_json::to_value(ActionOutcome::Success("success".into())).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["text"], "success");
    }
}
