//! [`SnapshotBuilder`] – assembles the [`SituationSnapshot`] that opens
//! every fresh turn.
//!
//! Sequence: trigger a capture, wait for the frame to settle, fetch the
//! preview, read altitude (degraded to `0.0` when unavailable), then heading
//! (required).  The first snapshot of a session also carries the weather
//! briefing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use droneloop_hal::Drone;
use droneloop_types::{DroneError, SessionState, SituationSnapshot};
use tracing::{info, warn};

use crate::weather::WeatherSource;

/// Pause between triggering a capture and fetching the preview.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1200);

/// Altitude reported when the drone cannot provide one.
pub const FALLBACK_ALTITUDE_M: f32 = 0.0;

pub struct SnapshotBuilder {
    drone: Arc<dyn Drone>,
    weather: Arc<dyn WeatherSource>,
    settle_delay: Duration,
}

impl SnapshotBuilder {
    pub fn new(drone: Arc<dyn Drone>, weather: Arc<dyn WeatherSource>) -> Self {
        Self {
            drone,
            weather,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Capture the drone's current situation.
    ///
    /// The session's briefing is marked delivered only when the snapshot
    /// carrying it is returned, so a failed first build retries the
    /// briefing next time.
    ///
    /// # Errors
    ///
    /// Fails if the image or heading cannot be obtained, or if the weather
    /// source cannot be reached on the first snapshot.
    pub async fn build(&self, session: &mut SessionState) -> Result<SituationSnapshot, DroneError> {
        self.drone.capture_shot().await?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        let image = self.drone.media_preview(0).await?;

        let altitude_m = match self.drone.altitude().await {
            Ok(alt) => alt,
            Err(e) => {
                warn!(error = %e, "altitude unavailable; reporting {FALLBACK_ALTITUDE_M}");
                FALLBACK_ALTITUDE_M
            }
        };
        let heading_deg = self.drone.heading().await?;

        let briefing = if session.is_first_snapshot() {
            Some(self.weather.briefing().await?)
        } else {
            None
        };

        if briefing.is_some() {
            session.mark_briefing_delivered();
        }

        info!(
            session = %session.id,
            altitude_m,
            heading_deg,
            briefing = briefing.is_some(),
            "situation snapshot captured"
        );

        Ok(SituationSnapshot {
            session_id: session.id,
            captured_at: Utc::now(),
            image: Some(image),
            altitude_m,
            heading_deg,
            briefing,
        })
    }
}
