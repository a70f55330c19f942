//! Reconciliation engine for zwave-steward
//!
//! Loads the node roster, evaluates daily on/off schedules and runs the
//! loop that keeps configuration parameters and switch states converged.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod model;
pub mod scheduler;

pub use config::Config;
pub use engine::ReconcileEngine;
pub use error::ConfigError;
pub use evaluator::expected_state;
pub use executor::{Change, TickReport, Transition};
pub use model::*;
pub use scheduler::Pacing;
