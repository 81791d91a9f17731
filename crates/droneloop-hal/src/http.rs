//! [`HttpDrone`] – REST client for the drone control server.
//!
//! The control server runs on the mobile device paired with the remote
//! controller and exposes every command as a `GET` on a path of the form
//! `/{command}/{argument}`.  Successful commands answer `2xx`; telemetry
//! endpoints answer with a bare number, and media previews with base64 PNG
//! text.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use droneloop_types::{DroneError, Image, MoveDirection, TurnDirection};
use tracing::debug;

use crate::drone::Drone;

// ─────────────────────────────────────────────────────────────────────────────
// Request paths
// ─────────────────────────────────────────────────────────────────────────────

/// Every request the control server understands.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Request {
    TakeOff,
    Land,
    Move(MoveDirection, f32),
    Rotate(TurnDirection, f32),
    GimbalPitch(f32),
    CaptureShot,
    MediaPreview(u32),
    Altitude,
    Heading,
    MaxSpeed(f32),
    LandingProtection(bool),
}

impl Request {
    fn path(self) -> String {
        match self {
            Request::TakeOff => "/takeOff".to_string(),
            Request::Land => "/land".to_string(),
            Request::Move(direction, distance) => {
                let verb = match direction {
                    MoveDirection::Forward => "moveForward",
                    MoveDirection::Backward => "moveBackward",
                    MoveDirection::Left => "moveLeft",
                    MoveDirection::Right => "moveRight",
                    MoveDirection::Up => "moveUp",
                    MoveDirection::Down => "moveDown",
                };
                format!("/{verb}/{distance}")
            }
            Request::Rotate(direction, angle) => match direction {
                TurnDirection::Clockwise => format!("/rotateClockwise/{angle}"),
                TurnDirection::Counterclockwise => format!("/rotateCounterClockwise/{angle}"),
            },
            Request::GimbalPitch(angle) => format!("/setGimbalPitch/{angle}"),
            Request::CaptureShot => "/captureShot".to_string(),
            Request::MediaPreview(index) => format!("/getMediaPreview/{index}"),
            Request::Altitude => "/getAltitude".to_string(),
            Request::Heading => "/getHeading".to_string(),
            Request::MaxSpeed(speed) => format!("/setMaxSpeed/{speed}"),
            Request::LandingProtection(enabled) => format!("/setLandingProtection/{enabled}"),
        }
    }

    /// Short name used in error messages.
    fn name(self) -> &'static str {
        match self {
            Request::TakeOff => "take_off",
            Request::Land => "land",
            Request::Move(..) => "move",
            Request::Rotate(..) => "rotate",
            Request::GimbalPitch(_) => "set_camera_pitch",
            Request::CaptureShot => "capture_shot",
            Request::MediaPreview(_) => "media_preview",
            Request::Altitude => "altitude",
            Request::Heading => "heading",
            Request::MaxSpeed(_) => "set_max_speed",
            Request::LandingProtection(_) => "set_landing_protection",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpDrone
// ─────────────────────────────────────────────────────────────────────────────

/// Async client for the drone control server.
///
/// Construct once with the server's `host:port` and share behind an `Arc`.
pub struct HttpDrone {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDrone {
    /// `endpoint` is either `host:port` or a full `http://` URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint
        } else {
            format!("http://{endpoint}")
        };
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, request: Request) -> String {
        format!("{}{}", self.base_url, request.path())
    }

    async fn send(&self, request: Request) -> Result<String, DroneError> {
        let url = self.url(request);
        debug!(%url, "drone request");

        let transport = |e: reqwest::Error| DroneError::Transport {
            component: "drone".to_string(),
            details: e.to_string(),
        };
        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(DroneError::DeviceFault {
                command: request.name().to_string(),
                details: format!("HTTP {status}: {}", body.trim()),
            });
        }
        Ok(body)
    }

    async fn send_command(&self, request: Request) -> Result<(), DroneError> {
        self.send(request).await.map(|_| ())
    }

    async fn read_number(&self, request: Request) -> Result<f32, DroneError> {
        let body = self.send(request).await?;
        parse_number(request, &body)
    }
}

fn parse_number(request: Request, body: &str) -> Result<f32, DroneError> {
    body.trim()
        .parse::<f32>()
        .map_err(|e| DroneError::DeviceFault {
            command: request.name().to_string(),
            details: format!("unexpected reading '{}': {e}", body.trim()),
        })
}

fn decode_preview(body: &str) -> Result<Image, DroneError> {
    let encoded = body.trim().trim_matches('"');
    STANDARD
        .decode(encoded)
        .map(Image::png)
        .map_err(|e| DroneError::DeviceFault {
            command: Request::MediaPreview(0).name().to_string(),
            details: format!("preview is not valid base64: {e}"),
        })
}

#[async_trait]
impl Drone for HttpDrone {
    async fn take_off(&self) -> Result<(), DroneError> {
        self.send_command(Request::TakeOff).await
    }

    async fn land(&self) -> Result<(), DroneError> {
        self.send_command(Request::Land).await
    }

    async fn move_by(&self, direction: MoveDirection, distance_m: f32) -> Result<(), DroneError> {
        self.send_command(Request::Move(direction, distance_m)).await
    }

    async fn rotate(&self, direction: TurnDirection, angle_deg: f32) -> Result<(), DroneError> {
        self.send_command(Request::Rotate(direction, angle_deg)).await
    }

    async fn set_camera_pitch(&self, angle_deg: f32) -> Result<(), DroneError> {
        self.send_command(Request::GimbalPitch(angle_deg)).await
    }

    async fn capture_shot(&self) -> Result<(), DroneError> {
        self.send_command(Request::CaptureShot).await
    }

    async fn media_preview(&self, index: u32) -> Result<Image, DroneError> {
        let body = self.send(Request::MediaPreview(index)).await?;
        decode_preview(&body)
    }

    async fn altitude(&self) -> Result<f32, DroneError> {
        self.read_number(Request::Altitude).await
    }

    async fn heading(&self) -> Result<f32, DroneError> {
        self.read_number(Request::Heading).await
    }

    async fn set_max_speed(&self, speed_mps: f32) -> Result<(), DroneError> {
        self.send_command(Request::MaxSpeed(speed_mps)).await
    }

    async fn set_landing_protection(&self, enabled: bool) -> Result<(), DroneError> {
        self.send_command(Request::LandingProtection(enabled)).await
    }
}
