//! Shared domain types for the UGV operator console.

pub mod camera;
pub mod config;
pub mod events;
pub mod frame;
pub mod telemetry;

mod errors;

pub use errors::{ConsoleError, Result};
