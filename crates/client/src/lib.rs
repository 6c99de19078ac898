//! Async client for the Mii mining job service.
//!
//! [`api::MiningApi`] speaks HTTP. [`controller::JobController`] tracks one
//! submitted job through its lifecycle. The admin side is split into
//! [`admin::AdminJobMonitor`] (jobs and queue), [`fleet::FleetMonitor`]
//! (miners and friendbots) and [`orchestrator::AdminConsole`], which
//! refreshes all of them on a fixed period.

pub mod admin;
pub mod api;
pub mod config;
pub mod controller;
pub mod cookies;
pub mod fleet;
pub mod orchestrator;
pub mod poll;
pub mod prompt;

pub use api::{AdminCredentials, ApiError, MiningApi};
pub use config::ClientConfig;
pub use controller::{ControllerCommand, JobController};
pub use prompt::UserPrompt;
