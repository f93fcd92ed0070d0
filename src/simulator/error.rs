//! Error types for the inventory simulator.

use crate::model::ProductId;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during simulator operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulatorError {
    /// The adjustment targets a product that is not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    /// No logged out-of-stock event has this id.
    #[error("Unknown out-of-stock event: {0}")]
    UnknownEvent(String),

    /// The seed catalog violates a catalog invariant.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Ticks need a non-zero period that fits the runtime clock.
    #[error("Invalid tick period: {0:?}")]
    InvalidPeriod(Duration),

    /// An error occurred while communicating with the simulator actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for SimulatorError {
    fn from(msg: String) -> Self {
        SimulatorError::ActorCommunicationError(msg)
    }
}
