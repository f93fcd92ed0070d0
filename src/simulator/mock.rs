//! # Mock Simulator
//!
//! Utilities for testing code that drives a [`SimulatorClient`] without spawning the
//! actor. [`create_mock_client`] returns a client plus the raw request receiver; the
//! `expect_*` helpers pull the next request off it and hand back the responder so the
//! test decides the reply.
//!
//! ```ignore
//! let (client, mut receiver) = create_mock_client(10);
//! let task = tokio::spawn(async move { client.adjust_stock(1, 5).await });
//! let (id, delta, responder) = expect_adjust_stock(&mut receiver).await.unwrap();
//! responder.send(Ok(product)).unwrap();
//! ```

use super::actor::{Response, SimulatorRequest};
use super::client::SimulatorClient;
use super::inventory::{InventorySnapshot, TickOutcome};
use crate::model::{Product, ProductId};
use tokio::sync::{mpsc, watch};

/// A client wired to a bare receiver instead of a running actor.
pub fn create_mock_client(
    buffer_size: usize,
) -> (SimulatorClient, mpsc::Receiver<SimulatorRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (_updates, snapshots) = watch::channel(InventorySnapshot::default());
    (SimulatorClient::new(sender, snapshots), receiver)
}

/// Expects an `AdjustStock` request next.
pub async fn expect_adjust_stock(
    receiver: &mut mpsc::Receiver<SimulatorRequest>,
) -> Option<(ProductId, i64, Response<Product>)> {
    match receiver.recv().await {
        Some(SimulatorRequest::AdjustStock {
            product_id,
            delta,
            respond_to,
        }) => Some((product_id, delta, respond_to)),
        _ => None,
    }
}

/// Expects a `Tick` request next.
pub async fn expect_tick(
    receiver: &mut mpsc::Receiver<SimulatorRequest>,
) -> Option<Response<TickOutcome>> {
    match receiver.recv().await {
        Some(SimulatorRequest::Tick { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Expects a `Stop` request next.
pub async fn expect_stop(
    receiver: &mut mpsc::Receiver<SimulatorRequest>,
) -> Option<Response<bool>> {
    match receiver.recv().await {
        Some(SimulatorRequest::Stop { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Expects a `Snapshot` request next.
pub async fn expect_snapshot(
    receiver: &mut mpsc::Receiver<SimulatorRequest>,
) -> Option<Response<InventorySnapshot>> {
    match receiver.recv().await {
        Some(SimulatorRequest::Snapshot { respond_to }) => Some(respond_to),
        _ => None,
    }
}
