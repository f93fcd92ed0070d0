//! Periodic inventory-depletion simulator and its stock-out log.
//!
//! # Main Components
//!
//! - [`InventorySimulator`] - synchronous core: catalog, log, tick and adjustment logic
//! - [`OosEventLogger`] - deduplicating stock-out log
//! - [`SimulationContext`] - injected [`Clock`] and [`Selector`]
//! - [`SimulatorActor`] / [`SimulatorClient`] - runs the core on a timer in its own task
//!
//! # Testing
//!
//! See [`mock`] for driving a client without spawning the actor.

pub mod actor;
pub mod catalog;
pub mod client;
pub mod context;
pub mod error;
pub mod inventory;
pub mod logger;
pub mod mock;

pub use actor::*;
pub use catalog::*;
pub use client::*;
pub use context::*;
pub use error::*;
pub use inventory::*;
pub use logger::*;

/// Creates a simulator actor over `catalog` and its client.
///
/// Ticks do not run until [`SimulatorClient::start`] is called.
pub fn new(catalog: Catalog, buffer_size: usize) -> (SimulatorActor, SimulatorClient) {
    let simulator = InventorySimulator::new(catalog, SimulationContext::system());
    SimulatorActor::new(simulator, buffer_size)
}
