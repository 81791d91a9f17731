//! [`ApprovalGate`] – mandatory human checkpoint before actuation.
//!
//! Every proposed action that survives validation is shown to the operator
//! (name and raw arguments) and only proceeds on the canonical affirmative
//! token.  The policy is fail-closed: any other text, an empty line, or the
//! end of input blocks the action, and the operator's words become the
//! result the model sees.
//!
//! # Example
//!
//! ```
//! use droneloop_kernel::{ApprovalDecision, ApprovalGate};
//!
//! let gate = ApprovalGate::default();
//! assert_eq!(gate.decide(Some("y")), ApprovalDecision::Proceed);
//! assert_eq!(
//!     gate.decide(Some("tree ahead")),
//!     ApprovalDecision::Override("tree ahead".to_string()),
//! );
//! assert_eq!(
//!     gate.decide(None),
//!     ApprovalDecision::Override("no response given".to_string()),
//! );
//! ```

use droneloop_types::{DroneError, ProposedAction};
use tracing::{info, warn};

use crate::console::OperatorConsole;

/// Input that approves an action.
pub const AFFIRMATIVE_TOKEN: &str = "y";

/// Override reason recorded when the operator gives no answer.
pub const NO_RESPONSE_REASON: &str = "no response given";

/// Outcome of one approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Proceed,
    /// Blocked; carries the operator's literal reason.
    Override(String),
}

/// Human approval policy.
pub struct ApprovalGate {
    affirmative: String,
}

impl ApprovalGate {
    /// Build a gate that approves only on `affirmative`.
    pub fn new(affirmative: impl Into<String>) -> Self {
        Self {
            affirmative: affirmative.into(),
        }
    }

    pub fn affirmative_token(&self) -> &str {
        &self.affirmative
    }

    /// Echo `action` to the operator and wait for a decision.
    ///
    /// Suspends until the operator answers.
    ///
    /// # Errors
    ///
    /// Only I/O failures on the console propagate.  End of input is not an
    /// error here; it is an override.
    pub async fn approve(
        &self,
        console: &mut dyn OperatorConsole,
        action: &ProposedAction,
    ) -> Result<ApprovalDecision, DroneError> {
        console.display(&format!("{} {}", action.name, action.arguments));
        let answer = console
            .prompt(&format!(
                "Is this okay? [{} to proceed, anything else is the reason to refuse]",
                self.affirmative
            ))
            .await?;

        let decision = self.decide(answer.as_deref());
        match &decision {
            ApprovalDecision::Proceed => {
                info!(call_id = %action.call_id, action = %action.name, "operator approved action")
            }
            ApprovalDecision::Override(reason) => {
                warn!(call_id = %action.call_id, action = %action.name, %reason, "operator overrode action")
            }
        }
        Ok(decision)
    }

    /// Map raw operator input onto a decision.
    ///
    /// Surrounding whitespace is ignored when matching the affirmative token
    /// and when detecting a blank answer.  An override carries the answer
    /// exactly as typed.
    pub fn decide(&self, answer: Option<&str>) -> ApprovalDecision {
        match answer {
            Some(raw) if raw.trim() == self.affirmative => ApprovalDecision::Proceed,
            Some(raw) if !raw.trim().is_empty() => ApprovalDecision::Override(raw.to_string()),
            _ => ApprovalDecision::Override(NO_RESPONSE_REASON.to_string()),
        }
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new(AFFIRMATIVE_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Console that replays canned answers and records everything shown.
    struct ScriptedConsole {
        answers: VecDeque<Option<String>>,
        shown: Vec<String>,
    }

    impl ScriptedConsole {
        fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
                shown: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl OperatorConsole for ScriptedConsole {
        fn display(&mut self, line: &str) {
            self.shown.push(line.to_string());
        }

        async fn prompt(&mut self, prompt: &str) -> Result<Option<String>, DroneError> {
            self.shown.push(prompt.to_string());
            Ok(self.answers.pop_front().flatten())
        }
    }

    fn move_action() -> ProposedAction {
        ProposedAction {
            call_id: "call_1".to_string(),
            name: "move".to_string(),
            arguments: r#"{"direction":"forward","distance":2}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn affirmative_token_proceeds() {
        let gate = ApprovalGate::default();
        let mut console = ScriptedConsole::new(&[Some("y")]);
        let decision = gate.approve(&mut console, &move_action()).await.unwrap();
        assert_eq!(decision, ApprovalDecision::Proceed);
    }

    #[tokio::test]
    async fn action_is_echoed_before_prompting() {
        let gate = ApprovalGate::default();
        let mut console = ScriptedConsole::new(&[Some("y")]);
        gate.approve(&mut console, &move_action()).await.unwrap();
        assert_eq!(
            console.shown[0],
            r#"move {"direction":"forward","distance":2}"#
        );
        assert!(console.shown[1].starts_with("Is this okay?"));
    }

    #[tokio::test]
    async fn other_text_is_the_literal_override_reason() {
        let gate = ApprovalGate::default();
        let mut console = ScriptedConsole::new(&[Some("there is a tree in the way")]);
        let decision = gate.approve(&mut console, &move_action()).await.unwrap();
        assert_eq!(
            decision,
            ApprovalDecision::Override("there is a tree in the way".to_string())
        );
    }

    #[tokio::test]
    async fn override_reason_keeps_surrounding_whitespace() {
        let gate = ApprovalGate::default();
        let mut console = ScriptedConsole::new(&[Some("  tree ahead, go left ")]);
        let decision = gate.approve(&mut console, &move_action()).await.unwrap();
        assert_eq!(
            decision,
            ApprovalDecision::Override("  tree ahead, go left ".to_string())
        );
    }

    #[tokio::test]
    async fn end_of_input_is_an_override() {
        let gate = ApprovalGate::default();
        let mut console = ScriptedConsole::new(&[None]);
        let decision = gate.approve(&mut console, &move_action()).await.unwrap();
        assert_eq!(
            decision,
            ApprovalDecision::Override(NO_RESPONSE_REASON.to_string())
        );
    }

    #[test]
    fn empty_or_blank_input_is_an_override() {
        let gate = ApprovalGate::default();
        for input in ["", "   ", "\n"] {
            assert_eq!(
                gate.decide(Some(input)),
                ApprovalDecision::Override(NO_RESPONSE_REASON.to_string())
            );
        }
    }

    #[test]
    fn near_misses_are_not_approval() {
        let gate = ApprovalGate::default();
        for input in ["Y", "yes", "ok", "y y"] {
            assert!(matches!(gate.decide(Some(input)), ApprovalDecision::Override(_)));
        }
        assert_eq!(gate.decide(Some("  y\n")), ApprovalDecision::Proceed);
    }

    #[test]
    fn custom_token() {
        let gate = ApprovalGate::new("approve");
        assert_eq!(gate.affirmative_token(), "approve");
        assert_eq!(gate.decide(Some("approve")), ApprovalDecision::Proceed);
        assert!(matches!(gate.decide(Some("y")), ApprovalDecision::Override(_)));
    }
}
