//! [`ActionExecutor`] – carries out approved, typed commands.
//!
//! [`DeviceExecutor`] maps each [`DroneCommand`] onto the [`Drone`] trait and
//! answers weather queries from the [`WeatherSource`].  The `match` is
//! exhaustive, so a new command variant fails to compile until it is wired
//! up here.

use std::sync::Arc;

use async_trait::async_trait;
use droneloop_hal::Drone;
use droneloop_types::{DroneCommand, DroneError};
use tracing::info;

use crate::weather::WeatherSource;

/// Result text reported for a completed device command.
pub const SUCCESS_TEXT: &str = "success";

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Run `command`, returning diagnostic text for the model.
    async fn execute(&self, command: &DroneCommand) -> Result<String, DroneError>;
}

pub struct DeviceExecutor {
    drone: Arc<dyn Drone>,
    weather: Arc<dyn WeatherSource>,
}

impl DeviceExecutor {
    pub fn new(drone: Arc<dyn Drone>, weather: Arc<dyn WeatherSource>) -> Self {
        Self { drone, weather }
    }
}

#[async_trait]
impl ActionExecutor for DeviceExecutor {
    async fn execute(&self, command: &DroneCommand) -> Result<String, DroneError> {
        info!(%command, "executing");
        match command {
            DroneCommand::TakeOff => self.drone.take_off().await?,
            DroneCommand::Land => self.drone.land().await?,
            DroneCommand::Move(p) => self.drone.move_by(p.direction, p.distance).await?,
            DroneCommand::Turn(p) => self.drone.rotate(p.direction, p.angle).await?,
            DroneCommand::SetCameraPitch(p) => self.drone.set_camera_pitch(p.angle).await?,
            DroneCommand::GetWeatherInfo => return self.weather.briefing().await,
        }
        Ok(SUCCESS_TEXT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::StaticWeather;
    use droneloop_hal::{SimCall, SimDrone};
    use droneloop_types::{
        CameraPitchParams, MoveDirection, MoveParams, TurnDirection, TurnParams,
    };

    fn executor() -> (DeviceExecutor, Arc<SimDrone>) {
        let drone = Arc::new(SimDrone::new());
        let exec = DeviceExecutor::new(drone.clone(), Arc::new(StaticWeather("Calm".to_string())));
        (exec, drone)
    }

    #[tokio::test]
    async fn commands_map_onto_drone_calls() {
        let (exec, drone) = executor();
        let commands = [
            DroneCommand::TakeOff,
            DroneCommand::Move(MoveParams {
                direction: MoveDirection::Forward,
                distance: 2.0,
            }),
            DroneCommand::Turn(TurnParams {
                direction: TurnDirection::Counterclockwise,
                angle: 45.0,
            }),
            DroneCommand::SetCameraPitch(CameraPitchParams { angle: 30.0 }),
            DroneCommand::Land,
        ];
        for cmd in &commands {
            assert_eq!(exec.execute(cmd).await.unwrap(), SUCCESS_TEXT);
        }
        assert_eq!(
            drone.calls(),
            vec![
                SimCall::TakeOff,
                SimCall::Move(MoveDirection::Forward, 2.0),
                SimCall::Rotate(TurnDirection::Counterclockwise, 45.0),
                SimCall::CameraPitch(30.0),
                SimCall::Land,
            ]
        );
    }

    #[tokio::test]
    async fn weather_query_returns_briefing_without_touching_drone() {
        let (exec, drone) = executor();
        assert_eq!(exec.execute(&DroneCommand::GetWeatherInfo).await.unwrap(), "Calm");
        assert!(drone.calls().is_empty());
    }

    #[tokio::test]
    async fn device_fault_propagates() {
        let (exec, _) = executor();
        let err = exec
            .execute(&DroneCommand::Move(MoveParams {
                direction: MoveDirection::Up,
                distance: 1.0,
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, DroneError::DeviceFault { .. }));
    }
}
