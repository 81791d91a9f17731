//! [`ConversationDriver`] – the turn-based orchestrator.
//!
//! Two states, no terminal state:
//!
//! - [`DriverState::AwaitingSituation`] – wait for the operator's ready cue,
//!   build a fresh [`SituationSnapshot`][droneloop_types::SituationSnapshot]
//!   and reseed the conversation with it.
//! - [`DriverState::AwaitingModelContinuation`] – the previous request
//!   produced actions whose results are already folded in; resubmit without
//!   a new snapshot.
//!
//! Each [`step`][ConversationDriver::step] submits the conversation, then
//! walks the model's output in order.  Messages go to the operator.  Each
//! proposed action is decoded, verified, put to the [`ApprovalGate`] and,
//! if approved, executed; its [`ActionResult`] is folded into the
//! conversation before the next action is looked at.
//!
//! The continuation token only advances after a response with no proposed
//! actions, so the model always sees its pending calls acknowledged before
//! the context moves on to a new situation.

use std::sync::Arc;

use droneloop_kernel::{ApprovalDecision, ApprovalGate, CommandVerifier, OperatorConsole};
use droneloop_types::{
    ActionResult, ContinuationToken, ConversationItem, DroneCommand, DroneError, ProposedAction,
    SessionState, SituationSnapshot,
};
use tracing::{error, info, warn};

use crate::completion::{CompletionRequest, CompletionService, OutputItem};
use crate::executor::ActionExecutor;
use crate::snapshot::SnapshotBuilder;
use crate::tool_catalog::ToolCatalog;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// System instructions used when none are configured.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are piloting a small quadcopter. Your task is to roam the surrounding area and explore it.

You may propose several commands at once. They run one after another in the order you give them, \
so keep that order in mind.

Before every new decision you receive a photo from the drone's camera together with its altitude \
and heading.

Give a one-sentence reasoning for the command(s) you choose.

The drone starts on the ground. It must take off before it can move.

Prefer turning and then flying forward over sideways moves; it shows you more of the surroundings.

Keep clear of obstacles such as trees, poles and buildings.

Check the weather before taking off. The first message includes it, so there is no need to request it.";

/// Upper bound on a single `move` when none is configured.
pub const DEFAULT_MAX_MOVE_DISTANCE_M: f32 = 10.0;

/// Configuration bundle for [`ConversationDriver`].
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// System instructions sent with every request.
    pub instructions: String,
    /// Longest distance a single `move` may cover.
    pub max_move_distance_m: f32,
    /// Reject tool payloads with fields outside the schema.
    pub strict_tools: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            max_move_distance_m: DEFAULT_MAX_MOVE_DISTANCE_M,
            strict_tools: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriverState {
    #[default]
    AwaitingSituation,
    AwaitingModelContinuation,
}

/// Items of the current turn plus the token covering everything before it.
#[derive(Debug, Default)]
pub struct ConversationState {
    items: Vec<ConversationItem>,
    continuation: Option<ContinuationToken>,
}

impl ConversationState {
    pub fn items(&self) -> &[ConversationItem] {
        &self.items
    }

    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    fn reseed(&mut self, snapshot: SituationSnapshot) {
        self.items.clear();
        self.items.push(ConversationItem::Situation(snapshot));
    }

    fn push(&mut self, item: ConversationItem) {
        self.items.push(item);
    }

    fn advance(&mut self, token: ContinuationToken) {
        self.continuation = Some(token);
    }
}

/// What one [`ConversationDriver::step`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    /// Plain messages shown to the operator, in order.
    pub messages: Vec<String>,
    /// Folded results, in the order the actions were proposed.
    pub results: Vec<ActionResult>,
    /// State after the step.
    pub state: DriverState,
}

// ─────────────────────────────────────────────────────────────────────────────
// ConversationDriver
// ─────────────────────────────────────────────────────────────────────────────

pub struct ConversationDriver {
    config: DriverConfig,
    completion: Arc<dyn CompletionService>,
    catalog: ToolCatalog,
    verifier: CommandVerifier,
    gate: ApprovalGate,
    snapshots: SnapshotBuilder,
    executor: Arc<dyn ActionExecutor>,
    console: Box<dyn OperatorConsole>,
    session: SessionState,
    conversation: ConversationState,
    state: DriverState,
}

impl ConversationDriver {
    pub fn new(
        config: DriverConfig,
        completion: Arc<dyn CompletionService>,
        snapshots: SnapshotBuilder,
        executor: Arc<dyn ActionExecutor>,
        console: Box<dyn OperatorConsole>,
    ) -> Self {
        let catalog = ToolCatalog::standard(config.strict_tools);
        let verifier = CommandVerifier::with_defaults(config.max_move_distance_m);
        Self {
            config,
            completion,
            catalog,
            verifier,
            gate: ApprovalGate::default(),
            snapshots,
            executor,
            console,
            session: SessionState::new(),
            conversation: ConversationState::default(),
            state: DriverState::AwaitingSituation,
        }
    }

    /// Replace the tool catalog.
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Run forever.  Returns only on a fatal error.
    ///
    /// Non-fatal errors abort the current turn, are shown to the operator,
    /// and the loop waits for the next ready cue.
    pub async fn run(&mut self) -> Result<(), DroneError> {
        info!(session = %self.session.id, tools = self.catalog.len(), "conversation driver started");
        loop {
            match self.step().await {
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "conversation driver stopped");
                    return Err(e);
                }
                Err(e) => self.console.display(&format!("Turn aborted: {e}")),
            }
        }
    }

    /// Perform exactly one iteration of the turn algorithm.
    ///
    /// # Errors
    ///
    /// Fatal errors (see [`DroneError::is_fatal`]) leave the state as is.
    /// Any other error aborts the turn and resets the driver to
    /// [`DriverState::AwaitingSituation`]; the continuation token is kept.
    pub async fn step(&mut self) -> Result<TurnReport, DroneError> {
        let outcome = self.turn().await;
        if let Err(e) = &outcome {
            if !e.is_fatal() {
                error!(error = %e, "turn aborted; waiting for the next situation");
                self.state = DriverState::AwaitingSituation;
            }
        }
        outcome
    }

    async fn turn(&mut self) -> Result<TurnReport, DroneError> {
        if self.state == DriverState::AwaitingSituation {
            self.await_ready().await?;
            let snapshot = self.snapshots.build(&mut self.session).await?;
            self.conversation.reseed(snapshot);
            self.console.display("Drone data updated.");
        }

        let response = self
            .completion
            .complete(CompletionRequest {
                instructions: &self.config.instructions,
                items: self.conversation.items(),
                tools: self.catalog.specs(),
                previous: self.conversation.continuation(),
            })
            .await?;

        let mut report = TurnReport::default();
        for item in response.output {
            match item {
                OutputItem::Message(text) => {
                    self.console.display(&text);
                    report.messages.push(text);
                }
                OutputItem::ActionProposal(action) => {
                    self.conversation
                        .push(ConversationItem::ProposedAction(action.clone()));
                    let result = self.dispatch(&action).await?;
                    self.conversation
                        .push(ConversationItem::ActionResult(result.clone()));
                    report.results.push(result);
                }
            }
        }

        if report.results.is_empty() {
            self.conversation.advance(response.id);
            self.state = DriverState::AwaitingSituation;
        } else {
            self.state = DriverState::AwaitingModelContinuation;
        }
        info!(
            actions = report.results.len(),
            messages = report.messages.len(),
            state = ?self.state,
            "turn complete"
        );
        report.state = self.state;
        Ok(report)
    }

    async fn await_ready(&mut self) -> Result<(), DroneError> {
        self.console.display("Waiting for operator ready...");
        self.console
            .prompt("Press Enter when ready")
            .await?
            .ok_or(DroneError::OperatorInputClosed)?;
        self.console.display("Continuing...");
        Ok(())
    }

    /// Decide the result of one proposed action.
    ///
    /// Only fatal errors escape; everything else becomes a folded result.
    async fn dispatch(&mut self, action: &ProposedAction) -> Result<ActionResult, DroneError> {
        let command = match self.validate(action) {
            Ok(command) => command,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(call_id = %action.call_id, action = %action.name, error = %e, "proposed action rejected");
                self.console
                    .display(&format!("{} {} rejected: {e}", action.name, action.arguments));
                return Ok(ActionResult::failed(&action.call_id, e.to_string()));
            }
        };

        match self.gate.approve(&mut *self.console, action).await? {
            ApprovalDecision::Proceed => {}
            ApprovalDecision::Override(reason) => {
                return Ok(ActionResult::overridden(&action.call_id, reason));
            }
        }

        match self.executor.execute(&command).await {
            Ok(text) => {
                info!(call_id = %action.call_id, %command, "action executed");
                Ok(ActionResult::success(&action.call_id, text))
            }
            Err(e) => {
                warn!(call_id = %action.call_id, %command, error = %e, "action failed");
                self.console.display(&format!("{command} failed: {e}"));
                Ok(ActionResult::failed(&action.call_id, e.to_string()))
            }
        }
    }

    fn validate(&self, action: &ProposedAction) -> Result<DroneCommand, DroneError> {
        let command = self.catalog.decode(action)?;
        self.verifier.verify(&command)?;
        Ok(command)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
