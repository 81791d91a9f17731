//! `droneloop-hal` – Device Executor Boundary
//!
//! Everything the orchestration core knows about the aircraft goes through
//! the [`Drone`] trait.
//!
//! # Modules
//!
//! - [`drone`] – the async [`Drone`] trait: actuation (take-off, land, move,
//!   rotate, gimbal), capture, telemetry, and flight settings.
//! - [`http`] – [`HttpDrone`]: REST client for the drone control server
//!   running next to the remote controller.
//! - [`sim`] – [`SimDrone`]: in-process simulator used by `--simulate` runs
//!   and by tests.

pub mod drone;
pub mod http;
pub mod sim;

pub use drone::Drone;
pub use http::HttpDrone;
pub use sim::{SimCall, SimDrone};
