//! `droneloop-kernel` – Safety Gate
//!
//! Nothing the model proposes reaches the drone without passing through
//! this crate.
//!
//! # Modules
//!
//! - [`command_verifier`] – [`CommandVerifier`][command_verifier::CommandVerifier]:
//!   a rule engine that checks every decoded
//!   [`DroneCommand`][droneloop_types::DroneCommand] against physical
//!   invariants (move distance, turn angle, gimbal range).  Violations are
//!   validation failures, returned to the model rather than aborting the loop.
//! - [`approval_gate`] – [`ApprovalGate`][approval_gate::ApprovalGate]:
//!   the mandatory human checkpoint.  Fail-closed: only the canonical
//!   affirmative token approves.
//! - [`console`] – [`OperatorConsole`][console::OperatorConsole]: the
//!   line-based operator I/O channel the gate and the driver talk through.

pub mod approval_gate;
pub mod command_verifier;
pub mod console;

pub use approval_gate::{AFFIRMATIVE_TOKEN, ApprovalDecision, ApprovalGate, NO_RESPONSE_REASON};
pub use command_verifier::{
    CameraPitchRule, CommandVerifier, MoveDistanceRule, Rule, TurnAngleRule,
};
pub use console::OperatorConsole;
