//! # Simulator Client
//!
//! Provides a high-level API for interacting with the [`SimulatorActor`](super::SimulatorActor).
//! It hides the request channel and oneshot plumbing behind async methods.

use super::actor::{Response, SimulatorRequest};
use super::context::{Clock, Selector, SimulationContext};
use super::error::SimulatorError;
use super::inventory::{InventorySnapshot, TickOutcome};
use crate::model::{Product, ProductId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

/// Client for interacting with the simulator actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    sender: mpsc::Sender<SimulatorRequest>,
    snapshots: watch::Receiver<InventorySnapshot>,
}

impl SimulatorClient {
    pub fn new(
        sender: mpsc::Sender<SimulatorRequest>,
        snapshots: watch::Receiver<InventorySnapshot>,
    ) -> Self {
        Self { sender, snapshots }
    }

    /// Begins recurring ticks every `period`, drawing time from `clock` and picks from
    /// `selector`. Calling it again replaces the running schedule.
    #[instrument(skip(self, clock, selector))]
    pub async fn start(
        &self,
        period: Duration,
        clock: Arc<dyn Clock>,
        selector: impl Selector + 'static,
    ) -> Result<(), SimulatorError> {
        self.start_with(period, SimulationContext::new(clock, selector))
            .await
    }

    #[instrument(skip(self, context))]
    pub async fn start_with(
        &self,
        period: Duration,
        context: SimulationContext,
    ) -> Result<(), SimulatorError> {
        debug!("Sending request");
        self.request(|respond_to| SimulatorRequest::Start {
            period,
            context,
            respond_to,
        })
        .await
    }

    /// Halts future ticks. Idempotent; returns whether ticks were running.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<bool, SimulatorError> {
        debug!("Sending request");
        self.request(|respond_to| SimulatorRequest::Stop { respond_to })
            .await
    }

    /// Runs one tick immediately, outside the schedule.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> Result<TickOutcome, SimulatorError> {
        debug!("Sending request");
        self.request(|respond_to| SimulatorRequest::Tick { respond_to })
            .await
    }

    /// Adds `delta` (possibly negative) to a product's stock, clamping at zero.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<Product, SimulatorError> {
        debug!("Sending request");
        self.request(|respond_to| SimulatorRequest::AdjustStock {
            product_id,
            delta,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, event_id: &str) -> Result<bool, SimulatorError> {
        debug!("Sending request");
        let event_id = event_id.to_string();
        self.request(|respond_to| SimulatorRequest::Resolve {
            event_id,
            respond_to,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<InventorySnapshot, SimulatorError> {
        self.request(|respond_to| SimulatorRequest::Snapshot { respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, SimulatorError> {
        let term = term.to_string();
        self.request(|respond_to| SimulatorRequest::Search { term, respond_to })
            .await
    }

    /// Receiver that sees a fresh snapshot after every catalog or log mutation.
    pub fn subscribe(&self) -> watch::Receiver<InventorySnapshot> {
        self.snapshots.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> SimulatorRequest,
    ) -> Result<T, SimulatorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| SimulatorError::ActorCommunicationError("Actor closed".into()))?;
        response.await.map_err(|_| {
            SimulatorError::ActorCommunicationError("Actor dropped response channel".into())
        })?
    }
}
