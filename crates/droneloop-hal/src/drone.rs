//! Generic `Drone` trait for the remote actuation endpoint.
//!
//! The rest of the stack only ever talks to the trait, so the HTTP client
//! and the simulator are interchangeable.

use async_trait::async_trait;
use droneloop_types::{DroneError, Image, MoveDirection, TurnDirection};

/// A single-actuator drone that accepts one command at a time.
#[async_trait]
pub trait Drone: Send + Sync {
    async fn take_off(&self) -> Result<(), DroneError>;

    async fn land(&self) -> Result<(), DroneError>;

    /// Translate `distance_m` meters in `direction`, relative to the current
    /// heading.
    async fn move_by(&self, direction: MoveDirection, distance_m: f32) -> Result<(), DroneError>;

    /// Rotate in place by `angle_deg` degrees.
    async fn rotate(&self, direction: TurnDirection, angle_deg: f32) -> Result<(), DroneError>;

    /// Set the gimbal pitch, 0 = level, 90 = straight down.
    async fn set_camera_pitch(&self, angle_deg: f32) -> Result<(), DroneError>;

    /// Trigger a still capture.  The frame becomes available through
    /// [`media_preview`][Self::media_preview] once the camera has settled.
    async fn capture_shot(&self) -> Result<(), DroneError>;

    /// Fetch the preview of the media item at `index` (0 = most recent).
    async fn media_preview(&self, index: u32) -> Result<Image, DroneError>;

    /// Altitude above the take-off point in meters.
    ///
    /// # Errors
    ///
    /// Commonly fails transiently while the aircraft is on the ground or
    /// the barometer is re-calibrating; callers are expected to tolerate it.
    async fn altitude(&self) -> Result<f32, DroneError>;

    /// Compass heading in degrees.
    async fn heading(&self) -> Result<f32, DroneError>;

    /// Cap horizontal speed in meters per second.
    async fn set_max_speed(&self, speed_mps: f32) -> Result<(), DroneError>;

    async fn set_landing_protection(&self, enabled: bool) -> Result<(), DroneError>;
}
