//! `droneloop-types` – shared data model.
//!
//! Typed drone commands, conversation items, situation snapshots, and the
//! error taxonomy used across every droneloop crate.

pub mod command;
pub mod conversation;
pub mod snapshot;

use thiserror::Error;

pub use command::{
    ActionKind, CameraPitchParams, DroneCommand, MoveDirection, MoveParams, NoParams,
    TurnDirection, TurnParams,
};
pub use conversation::{
    ActionOutcome, ActionResult, ContinuationToken, ConversationItem, ProposedAction, ToolSpec,
};
pub use snapshot::{Image, SessionState, SituationSnapshot};

/// Global error type spanning transport failures, contract violations,
/// validation errors, and loss of the operator channel.
#[derive(Error, Debug)]
pub enum DroneError {
    /// A collaborator could not be reached or did not answer.
    #[error("Transport error talking to {component}: {details}")]
    Transport { component: String, details: String },

    /// The drone answered but refused or failed the command.
    #[error("Device fault on {command}: {details}")]
    DeviceFault { command: String, details: String },

    #[error("Completion service error: {0}")]
    Completion(String),

    /// The completion service named an action the catalog does not contain.
    #[error("Unknown action '{0}': tool catalog and completion service disagree")]
    UnknownAction(String),

    /// A recognized action carried a malformed payload.
    #[error("Invalid parameters for '{action}': {details}")]
    InvalidParameters { action: String, details: String },

    #[error("Operator input closed")]
    OperatorInputClosed,

    #[error("Operator I/O error: {0}")]
    OperatorIo(String),
}

impl DroneError {
    /// `true` for errors the loop must stop on rather than retry past.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DroneError::UnknownAction(_) | DroneError::OperatorInputClosed | DroneError::OperatorIo(_)
        )
    }
}
