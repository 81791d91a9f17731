//! [`CommandVerifier`] – physical invariant rule engine.
//!
//! A decoded [`DroneCommand`] already matches its schema, but the schema
//! cannot express everything the airframe cares about.  Each registered
//! [`Rule`] is evaluated in order; the first violation returns
//! [`DroneError::InvalidParameters`] and the command never reaches the
//! operator or the drone.
//!
//! Built-in rules:
//! - [`MoveDistanceRule`] – move distances must be positive and capped.
//! - [`TurnAngleRule`] – turn angles must be positive and at most one revolution.
//! - [`CameraPitchRule`] – gimbal pitch must stay within the gimbal's range.

use droneloop_types::{DroneCommand, DroneError};

// ────────────────────────────────────────────────────────────────────────────
// Rule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single physical invariant a command must satisfy.
pub trait Rule: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// `Ok(())` when `command` satisfies the invariant.
    fn check(&self, command: &DroneCommand) -> Result<(), DroneError>;
}

// ────────────────────────────────────────────────────────────────────────────
// CommandVerifier
// ────────────────────────────────────────────────────────────────────────────

/// Rule engine run on every decoded command before approval.
///
/// # Example
///
/// ```
/// use droneloop_kernel::{CommandVerifier, MoveDistanceRule};
/// use droneloop_types::{DroneCommand, MoveDirection, MoveParams};
///
/// let mut verifier = CommandVerifier::new();
/// verifier.add_rule(Box::new(MoveDistanceRule { max_distance_m: 5.0 }));
///
/// let short = DroneCommand::Move(MoveParams { direction: MoveDirection::Forward, distance: 2.0 });
/// assert!(verifier.verify(&short).is_ok());
///
/// let long = DroneCommand::Move(MoveParams { direction: MoveDirection::Forward, distance: 50.0 });
/// assert!(verifier.verify(&long).is_err());
/// ```
#[derive(Default)]
pub struct CommandVerifier {
    rules: Vec<Box<dyn Rule>>,
}

impl CommandVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier preloaded with the built-in rules.
    pub fn with_defaults(max_distance_m: f32) -> Self {
        let mut verifier = Self::new();
        verifier.add_rule(Box::new(MoveDistanceRule { max_distance_m }));
        verifier.add_rule(Box::new(TurnAngleRule::default()));
        verifier.add_rule(Box::new(CameraPitchRule::default()));
        verifier
    }

    /// Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn verify(&self, command: &DroneCommand) -> Result<(), DroneError> {
        for rule in &self.rules {
            rule.check(command).inspect_err(|e| {
                tracing::debug!(rule = rule.name(), error = %e, "command rejected");
            })?;
        }
        Ok(())
    }
}

fn violation(command: &DroneCommand, details: String) -> DroneError {
    DroneError::InvalidParameters {
        action: command.kind().name().to_string(),
        details,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in rules
// ────────────────────────────────────────────────────────────────────────────

/// Rejects moves that are not strictly positive or exceed `max_distance_m`.
pub struct MoveDistanceRule {
    pub max_distance_m: f32,
}

impl Rule for MoveDistanceRule {
    fn name(&self) -> &str {
        "move_distance"
    }

    fn check(&self, command: &DroneCommand) -> Result<(), DroneError> {
        if let DroneCommand::Move(params) = command {
            if !params.distance.is_finite() || params.distance <= 0.0 {
                return Err(violation(
                    command,
                    format!("distance must be a positive number of meters, got {}", params.distance),
                ));
            }
            if params.distance > self.max_distance_m {
                return Err(violation(
                    command,
                    format!(
                        "distance {}m exceeds the {}m limit for a single move",
                        params.distance, self.max_distance_m
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects turns that are not strictly positive or exceed `max_deg`.
pub struct TurnAngleRule {
    pub max_deg: f32,
}

impl Default for TurnAngleRule {
    fn default() -> Self {
        Self { max_deg: 360.0 }
    }
}

impl Rule for TurnAngleRule {
    fn name(&self) -> &str {
        "turn_angle"
    }

    fn check(&self, command: &DroneCommand) -> Result<(), DroneError> {
        if let DroneCommand::Turn(params) = command {
            if !params.angle.is_finite() || params.angle <= 0.0 || params.angle > self.max_deg {
                return Err(violation(
                    command,
                    format!(
                        "angle {} is outside (0, {}] degrees",
                        params.angle, self.max_deg
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Rejects gimbal pitches outside `[min_deg, max_deg]`.
pub struct CameraPitchRule {
    pub min_deg: f32,
    pub max_deg: f32,
}

impl Default for CameraPitchRule {
    fn default() -> Self {
        Self {
            min_deg: 0.0,
            max_deg: 90.0,
        }
    }
}

impl Rule for CameraPitchRule {
    fn name(&self) -> &str {
        "camera_pitch"
    }

    fn check(&self, command: &DroneCommand) -> Result<(), DroneError> {
        if let DroneCommand::SetCameraPitch(params) = command {
            if !(self.min_deg..=self.max_deg).contains(&params.angle) {
                return Err(violation(
                    command,
                    format!(
                        "angle {} is outside [{}, {}] degrees",
                        params.angle, self.min_deg, self.max_deg
                    ),
                ));
            }
        }
        Ok(())
    }
}
