//! `droneloop-runtime` – the agent loop.
//!
//! # Modules
//!
//! - [`driver`] – [`ConversationDriver`][driver::ConversationDriver]: the
//!   two-state turn machine that ties everything together.
//! - [`tool_catalog`] – [`ToolCatalog`][tool_catalog::ToolCatalog]: tool
//!   specs generated from the typed parameter structs, plus payload
//!   validation and decoding.
//! - [`completion`] – [`CompletionService`][completion::CompletionService]
//!   and the Responses API client.
//! - [`snapshot`] – [`SnapshotBuilder`][snapshot::SnapshotBuilder]: capture,
//!   telemetry, and the once-per-session weather briefing.
//! - [`executor`] – [`ActionExecutor`][executor::ActionExecutor] and the
//!   drone-backed implementation.
//! - [`weather`] – [`WeatherSource`][weather::WeatherSource] and the PWS
//!   observations client.
//! - [`telemetry`] – `tracing` subscriber and OTLP export setup.

pub mod completion;
pub mod driver;
pub mod executor;
pub mod snapshot;
pub mod telemetry;
pub mod tool_catalog;
pub mod weather;

pub use completion::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService, OutputItem,
    ResponsesClient,
};
pub use driver::{
    ConversationDriver, ConversationState, DEFAULT_INSTRUCTIONS, DEFAULT_MAX_MOVE_DISTANCE_M,
    DriverConfig, DriverState, TurnReport,
};
pub use executor::{ActionExecutor, DeviceExecutor};
pub use snapshot::SnapshotBuilder;
pub use tool_catalog::ToolCatalog;
pub use weather::{StaticWeather, WeatherSource, WeatherStationClient};
