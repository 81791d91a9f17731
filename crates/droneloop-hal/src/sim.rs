//! In-process drone simulator for headless runs and tests.
//!
//! [`SimDrone`] keeps a tiny kinematic state (airborne flag, altitude,
//! heading, gimbal pitch), records every command it receives, and can be
//! told to fail specific readings so degraded-telemetry paths can be
//! exercised without hardware.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use droneloop_types::{DroneError, Image, MoveDirection, TurnDirection};
use tracing::debug;

use crate::drone::Drone;

/// Altitude the simulator climbs to on take-off.
const TAKEOFF_ALTITUDE_M: f32 = 1.2;

/// 1×1 transparent PNG returned by [`Drone::media_preview`].
const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// One command received by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    TakeOff,
    Land,
    Move(MoveDirection, f32),
    Rotate(TurnDirection, f32),
    CameraPitch(f32),
    CaptureShot,
    MaxSpeed(f32),
    LandingProtection(bool),
}

#[derive(Debug)]
struct SimState {
    airborne: bool,
    altitude_m: f32,
    heading_deg: f32,
    camera_pitch_deg: f32,
    altitude_available: bool,
    heading_available: bool,
    camera_available: bool,
    calls: Vec<SimCall>,
}

/// A simulated drone.  Every actuation succeeds unless the drone is asked
/// to move while landed.
pub struct SimDrone {
    state: Mutex<SimState>,
}

impl SimDrone {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                airborne: false,
                altitude_m: 0.0,
                heading_deg: 0.0,
                camera_pitch_deg: 0.0,
                altitude_available: true,
                heading_available: true,
                camera_available: true,
                calls: Vec::new(),
            }),
        }
    }

    /// Start at `altitude_m`; any positive altitude starts airborne.
    pub fn with_altitude(self, altitude_m: f32) -> Self {
        {
            let mut state = self.lock();
            state.altitude_m = altitude_m;
            state.airborne = altitude_m > 0.0;
        }
        self
    }

    pub fn with_heading(self, heading_deg: f32) -> Self {
        self.lock().heading_deg = heading_deg;
        self
    }

    /// Make [`Drone::altitude`] fail, as a grounded aircraft often does.
    pub fn without_altitude(self) -> Self {
        self.lock().altitude_available = false;
        self
    }

    pub fn without_heading(self) -> Self {
        self.lock().heading_available = false;
        self
    }

    pub fn without_camera(self) -> Self {
        self.lock().camera_available = false;
        self
    }

    /// Every command received so far, in order.  Telemetry reads are not
    /// recorded.
    pub fn calls(&self) -> Vec<SimCall> {
        self.lock().calls.clone()
    }

    pub fn is_airborne(&self) -> bool {
        self.lock().airborne
    }

    pub fn camera_pitch(&self) -> f32 {
        self.lock().camera_pitch_deg
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A poisoned lock only means a test panicked mid-call; the state
        // itself is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: SimCall) -> MutexGuard<'_, SimState> {
        debug!(?call, "sim drone command");
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

impl Default for SimDrone {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable(command: &str) -> DroneError {
    DroneError::DeviceFault {
        command: command.to_string(),
        details: "reading unavailable".to_string(),
    }
}

#[async_trait]
impl Drone for SimDrone {
    async fn take_off(&self) -> Result<(), DroneError> {
        let mut state = self.record(SimCall::TakeOff);
        state.airborne = true;
        state.altitude_m = state.altitude_m.max(TAKEOFF_ALTITUDE_M);
        Ok(())
    }

    async fn land(&self) -> Result<(), DroneError> {
        let mut state = self.record(SimCall::Land);
        state.airborne = false;
        state.altitude_m = 0.0;
        Ok(())
    }

    async fn move_by(&self, direction: MoveDirection, distance_m: f32) -> Result<(), DroneError> {
        let mut state = self.record(SimCall::Move(direction, distance_m));
        if !state.airborne {
            return Err(DroneError::DeviceFault {
                command: "move".to_string(),
                details: "aircraft is not flying".to_string(),
            });
        }
        match direction {
            MoveDirection::Up => state.altitude_m += distance_m,
            MoveDirection::Down => state.altitude_m = (state.altitude_m - distance_m).max(0.0),
            _ => {}
        }
        Ok(())
    }

    async fn rotate(&self, direction: TurnDirection, angle_deg: f32) -> Result<(), DroneError> {
        let mut state = self.record(SimCall::Rotate(direction, angle_deg));
        let delta = match direction {
            TurnDirection::Clockwise => angle_deg,
            TurnDirection::Counterclockwise => -angle_deg,
        };
        state.heading_deg = (state.heading_deg + delta).rem_euclid(360.0);
        Ok(())
    }

    async fn set_camera_pitch(&self, angle_deg: f32) -> Result<(), DroneError> {
        let mut state = self.record(SimCall::CameraPitch(angle_deg));
        state.camera_pitch_deg = angle_deg;
        Ok(())
    }

    async fn capture_shot(&self) -> Result<(), DroneError> {
        let state = self.record(SimCall::CaptureShot);
        if !state.camera_available {
            return Err(unavailable("capture_shot"));
        }
        Ok(())
    }

    async fn media_preview(&self, _index: u32) -> Result<Image, DroneError> {
        if !self.lock().camera_available {
            return Err(unavailable("media_preview"));
        }
        Ok(Image::png(BLANK_PNG.to_vec()))
    }

    async fn altitude(&self) -> Result<f32, DroneError> {
        let state = self.lock();
        if !state.altitude_available {
            return Err(unavailable("altitude"));
        }
        Ok(state.altitude_m)
    }

    async fn heading(&self) -> Result<f32, DroneError> {
        let state = self.lock();
        if !state.heading_available {
            return Err(unavailable("heading"));
        }
        Ok(state.heading_deg)
    }

    async fn set_max_speed(&self, speed_mps: f32) -> Result<(), DroneError> {
        drop(self.record(SimCall::MaxSpeed(speed_mps)));
        Ok(())
    }

    async fn set_landing_protection(&self, enabled: bool) -> Result<(), DroneError> {
        drop(self.record(SimCall::LandingProtection(enabled)));
        Ok(())
    }
}
