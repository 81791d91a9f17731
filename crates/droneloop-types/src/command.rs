//! Typed drone commands the model is allowed to propose.
//!
//! [`ActionKind`] is the closed set of tool names; [`DroneCommand`] is the
//! decoded, typed payload for one of them.  Both are matched exhaustively
//! wherever they are dispatched, so adding or removing an action is a
//! compile-time change.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Parameter types
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a translation relative to the drone's current heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveDirection::Forward => "forward",
            MoveDirection::Backward => "backward",
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        }
    }
}

/// Rotation sense, viewed from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TurnDirection {
    Clockwise,
    Counterclockwise,
}

impl TurnDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnDirection::Clockwise => "clockwise",
            TurnDirection::Counterclockwise => "counterclockwise",
        }
    }
}

/// Parameters for actions that take no arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

/// Parameters for [`DroneCommand::Move`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveParams {
    /// Direction to move in, relative to the current heading.
    pub direction: MoveDirection,
    /// Distance to travel in meters.
    #[schemars(range(min = 0))]
    pub distance: f32,
}

/// Parameters for [`DroneCommand::Turn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TurnParams {
    /// Direction to rotate in.
    pub direction: TurnDirection,
    /// Angle to rotate by in degrees.
    #[schemars(range(min = 0, max = 360))]
    pub angle: f32,
}

/// Parameters for [`DroneCommand::SetCameraPitch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CameraPitchParams {
    /// Gimbal pitch in degrees below the horizon, 0 (level) to 90 (straight down).
    #[schemars(range(min = 0, max = 90))]
    pub angle: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// ActionKind
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminant of every action in the tool catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    TakeOff,
    Land,
    Move,
    Turn,
    SetCameraPitch,
    GetWeatherInfo,
}

impl ActionKind {
    /// Every action, in catalog order.
    pub const ALL: [ActionKind; 6] = [
        ActionKind::TakeOff,
        ActionKind::Land,
        ActionKind::Move,
        ActionKind::Turn,
        ActionKind::SetCameraPitch,
        ActionKind::GetWeatherInfo,
    ];

    /// Tool name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::TakeOff => "takeoff",
            ActionKind::Land => "land",
            ActionKind::Move => "move",
            ActionKind::Turn => "turn",
            ActionKind::SetCameraPitch => "set_camera_pitch",
            ActionKind::GetWeatherInfo => "get_weather_info",
        }
    }

    /// Natural-language description shown to the model.
    pub fn description(self) -> &'static str {
        match self {
            ActionKind::TakeOff => {
                "Take off and hover at a low altitude. Must be called before any movement."
            }
            ActionKind::Land => "Land the drone at its current position.",
            ActionKind::Move => {
                "Move the drone a distance in meters in a direction relative to its current heading."
            }
            ActionKind::Turn => "Rotate the drone in place by an angle in degrees.",
            ActionKind::SetCameraPitch => {
                "Set the camera gimbal pitch in degrees, from 0 (level) to 90 (straight down)."
            }
            ActionKind::GetWeatherInfo => "Get the weather info for the location of the drone.",
        }
    }

    /// Resolve a wire name back to its kind.
    pub fn from_name(name: &str) -> Option<ActionKind> {
        ActionKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DroneCommand
// ─────────────────────────────────────────────────────────────────────────────

/// A validated, typed command ready for the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum DroneCommand {
    TakeOff,
    Land,
    Move(MoveParams),
    Turn(TurnParams),
    SetCameraPitch(CameraPitchParams),
    GetWeatherInfo,
}

impl DroneCommand {
    pub fn kind(&self) -> ActionKind {
        match self {
            DroneCommand::TakeOff => ActionKind::TakeOff,
            DroneCommand::Land => ActionKind::Land,
            DroneCommand::Move(_) => ActionKind::Move,
            DroneCommand::Turn(_) => ActionKind::Turn,
            DroneCommand::SetCameraPitch(_) => ActionKind::SetCameraPitch,
            DroneCommand::GetWeatherInfo => ActionKind::GetWeatherInfo,
        }
    }

    /// Decode a JSON argument object into the command for `kind`.
    ///
    /// Parameter structs deny unknown fields, so callers that want lenient
    /// decoding must strip extra keys first.
    pub fn decode(kind: ActionKind, arguments: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ActionKind::TakeOff => {
                serde_json::from_value::<NoParams>(arguments)?;
                DroneCommand::TakeOff
            }
            ActionKind::Land => {
                serde_json::from_value::<NoParams>(arguments)?;
                DroneCommand::Land
            }
            ActionKind::Move => DroneCommand::Move(serde_json::from_value(arguments)?),
            ActionKind::Turn => DroneCommand::Turn(serde_json::from_value(arguments)?),
            ActionKind::SetCameraPitch => {
                DroneCommand::SetCameraPitch(serde_json::from_value(arguments)?)
            }
            ActionKind::GetWeatherInfo => {
                serde_json::from_value::<NoParams>(arguments)?;
                DroneCommand::GetWeatherInfo
            }
        })
    }
}

impl fmt::Display for DroneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DroneCommand::Move(p) => write!(f, "move {} {}m", p.direction.as_str(), p.distance),
            DroneCommand::Turn(p) => write!(f, "turn {} {}°", p.direction.as_str(), p.angle),
            DroneCommand::SetCameraPitch(p) => write!(f, "set_camera_pitch {}°", p.angle),
            other => f.write_str(other.kind().name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ActionKind::from_name("fly_to_moon"), None);
    }

    #[test]
    fn decode_move_reads_lowercase_direction() {
        let cmd = DroneCommand::decode(
            ActionKind::Move,
            json!({ "direction": "forward", "distance": 2.0 }),
        )
        .unwrap();
        assert_eq!(
            cmd,
            DroneCommand::Move(MoveParams {
                direction: MoveDirection::Forward,
                distance: 2.0,
            })
        );
        assert_eq!(cmd.kind(), ActionKind::Move);
    }

    #[test]
    fn decode_rejects_unknown_direction() {
        let err = DroneCommand::decode(
            ActionKind::Turn,
            json!({ "direction": "sideways", "angle": 45.0 }),
        );
        assert!(err.is_err());
    }

    #[test]
    fn decode_rejects_extra_field_on_empty_params() {
        assert!(DroneCommand::decode(ActionKind::TakeOff, json!({})).is_ok());
        assert!(DroneCommand::decode(ActionKind::TakeOff, json!({ "height": 3 })).is_err());
    }

    #[test]
    fn decode_rejects_missing_angle() {
        let err = DroneCommand::decode(ActionKind::Turn, json!({ "direction": "clockwise" }));
        assert!(err.unwrap_err().to_string().contains("angle"));
    }

    #[test]
    fn display_is_human_readable() {
        let cmd = DroneCommand::Turn(TurnParams {
            direction: TurnDirection::Counterclockwise,
            angle: 90.0,
        });
        assert_eq!(cmd.to_string(), "turn counterclockwise 90°");
        assert_eq!(DroneCommand::Land.to_string(), "land");
    }
}
