//! # Simulator Actor
//!
//! [`SimulatorActor`] is the "server" half of the simulator. It owns the
//! [`InventorySimulator`] and the receiving end of the request channel, and runs one
//! loop that waits on two sources: client requests and the tick timer.
//!
//! **Concurrency Model**:
//! Requests and ticks are handled one at a time on the actor's own task, so a tick
//! can never interleave with another tick or with an adjustment. No `Mutex` guards the
//! catalog or the log; exclusive ownership inside the task is the guard.
//!
//! Requests are polled before the timer (`biased`), so a `Stop` already queued when a
//! tick falls due wins. `Stop` drops the timer before replying, which means no tick
//! runs after the caller sees the reply.

use super::client::SimulatorClient;
use super::context::SimulationContext;
use super::error::SimulatorError;
use super::inventory::{InventorySimulator, InventorySnapshot, TickOutcome};
use crate::model::{Product, ProductId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Type alias for the one-shot response channel used by the actor.
pub type Response<T> = oneshot::Sender<Result<T, SimulatorError>>;

/// Messages sent to the simulator actor.
#[derive(Debug)]
pub enum SimulatorRequest {
    Start {
        period: Duration,
        context: SimulationContext,
        respond_to: Response<()>,
    },
    Stop {
        respond_to: Response<bool>,
    },
    Tick {
        respond_to: Response<TickOutcome>,
    },
    AdjustStock {
        product_id: ProductId,
        delta: i64,
        respond_to: Response<Product>,
    },
    Resolve {
        event_id: String,
        respond_to: Response<bool>,
    },
    Snapshot {
        respond_to: Response<InventorySnapshot>,
    },
    Search {
        term: String,
        respond_to: Response<Vec<Product>>,
    },
}

/// Runs an [`InventorySimulator`] on its own task.
pub struct SimulatorActor {
    receiver: mpsc::Receiver<SimulatorRequest>,
    simulator: InventorySimulator,
    ticker: Option<Interval>,
    updates: watch::Sender<InventorySnapshot>,
}

impl SimulatorActor {
    /// Creates a new `SimulatorActor` and its associated `SimulatorClient`.
    ///
    /// # Arguments
    ///
    /// * `simulator` - The simulator core the actor will own.
    /// * `buffer_size` - The capacity of the request channel. If the channel is full,
    ///   client calls wait until there is space.
    pub fn new(simulator: InventorySimulator, buffer_size: usize) -> (Self, SimulatorClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (updates, snapshots) = watch::channel(simulator.snapshot());
        let actor = Self {
            receiver,
            simulator,
            ticker: None,
            updates,
        };
        (actor, SimulatorClient::new(sender, snapshots))
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        info!(products = self.simulator.catalog().len(), "Simulator started");

        loop {
            tokio::select! {
                biased;
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break,
                },
                _ = next_tick(&mut self.ticker) => {
                    let outcome = self.simulator.tick();
                    debug!(?outcome, "Scheduled tick");
                    if outcome.mutated() {
                        self.publish();
                    }
                }
            }
        }

        info!(
            products = self.simulator.catalog().len(),
            events = self.simulator.log().len(),
            "Shutdown"
        );
    }

    fn handle(&mut self, request: SimulatorRequest) {
        match request {
            SimulatorRequest::Start {
                period,
                context,
                respond_to,
            } => {
                debug!(?period, "Start");
                let first = Instant::now().checked_add(period);
                let Some(first) = first.filter(|_| !period.is_zero()) else {
                    warn!(?period, "Start rejected");
                    let _ = respond_to.send(Err(SimulatorError::InvalidPeriod(period)));
                    return;
                };
                self.simulator.set_context(context);
                let mut ticker = tokio::time::interval_at(first, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let restarted = self.ticker.replace(ticker).is_some();
                let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
                info!(period_ms, restarted, "Ticks started");
                let _ = respond_to.send(Ok(()));
            }
            SimulatorRequest::Stop { respond_to } => {
                let was_running = self.ticker.take().is_some();
                info!(was_running, "Ticks stopped");
                let _ = respond_to.send(Ok(was_running));
            }
            SimulatorRequest::Tick { respond_to } => {
                let outcome = self.simulator.tick();
                debug!(?outcome, "Manual tick");
                if outcome.mutated() {
                    self.publish();
                }
                let _ = respond_to.send(Ok(outcome));
            }
            SimulatorRequest::AdjustStock {
                product_id,
                delta,
                respond_to,
            } => {
                debug!(product_id, delta, "AdjustStock");
                let result = self.simulator.adjust_stock(product_id, delta);
                if result.is_ok() {
                    self.publish();
                }
                let _ = respond_to.send(result);
            }
            SimulatorRequest::Resolve {
                event_id,
                respond_to,
            } => {
                debug!(%event_id, "Resolve");
                let result = self.simulator.resolve(&event_id);
                match &result {
                    Ok(true) => self.publish(),
                    Ok(false) => {}
                    Err(e) => warn!(%event_id, error = %e, "Resolve failed"),
                }
                let _ = respond_to.send(result);
            }
            SimulatorRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(Ok(self.simulator.snapshot()));
            }
            SimulatorRequest::Search { term, respond_to } => {
                let found = self.simulator.search(&term);
                debug!(%term, found = found.len(), "Search");
                let _ = respond_to.send(Ok(found));
            }
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.simulator.snapshot());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}
