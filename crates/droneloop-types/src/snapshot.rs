//! Point-in-time description of the drone and the session it belongs to.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An encoded camera frame.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// MIME type, e.g. `"image/png"`.
    pub mime_type: String,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

impl Image {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            data,
        }
    }

    /// `data:` URL suitable for inline image inputs.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Sensor and state bundle captured at the start of a reasoning turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationSnapshot {
    pub session_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub image: Option<Image>,
    pub altitude_m: f32,
    pub heading_deg: f32,
    /// Environmental briefing, present only on the first snapshot of a session.
    pub briefing: Option<String>,
}

impl SituationSnapshot {
    /// Telemetry text that accompanies the image.
    pub fn describe(&self) -> String {
        let mut text = format!("Altitude: {}\nHeading: {}", self.altitude_m, self.heading_deg);
        if let Some(briefing) = &self.briefing {
            text.push_str("\n\nWeather Info:\n");
            text.push_str(briefing);
        }
        text
    }
}

/// Per-session bookkeeping shared by the driver and the snapshot builder.
///
/// The one-time briefing is tied to this session's identity rather than to
/// the process, so a fresh `SessionState` gets a fresh briefing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    briefing_delivered: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            briefing_delivered: false,
        }
    }

    /// `true` until a snapshot carrying the briefing has been produced.
    pub fn is_first_snapshot(&self) -> bool {
        !self.briefing_delivered
    }

    pub fn mark_briefing_delivered(&mut self) {
        self.briefing_delivered = true;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
