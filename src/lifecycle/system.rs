use crate::config::AppConfig;
use crate::dispatch::{DispatchError, DispatchService, HttpDispatcher};
use crate::simulator::{self, Catalog, SimulatorClient};
use tracing::{error, info, warn};

/// The runtime orchestrator.
///
/// `ShelfSystem` starts the simulator actor on its own task and wires the dispatch
/// service to the configured backend. The stream consumer is not owned here: it is a
/// caller-side state machine, created per screen or session with
/// [`StreamConsumer::new`](crate::stream::StreamConsumer::new).
///
/// # Example
///
/// ```ignore
/// let system = ShelfSystem::new(&config, catalog)?;
/// system.simulator.start(config.tick_period(), clock, selector).await?;
/// let reply = system.dispatch.query("What needs restocking?", QueryModel::Restock).await?;
/// system.shutdown().await?;
/// ```
pub struct ShelfSystem {
    /// Client for the simulator actor
    pub simulator: SimulatorClient,

    /// Validated upload and query dispatch
    pub dispatch: DispatchService<HttpDispatcher>,

    handle: tokio::task::JoinHandle<()>,
}

impl ShelfSystem {
    /// Spawns the simulator actor. Must be called inside a Tokio runtime.
    ///
    /// Ticks do not start until [`SimulatorClient::start`] is called.
    pub fn new(config: &AppConfig, catalog: Catalog) -> Result<Self, DispatchError> {
        let dispatcher = HttpDispatcher::new(&config.api_base_url, config.request_timeout())?;
        let dispatch = DispatchService::with_limit(dispatcher, config.max_upload_bytes);

        let (actor, client) = simulator::new(catalog, config.channel_buffer);
        let handle = tokio::spawn(actor.run());

        Ok(Self {
            simulator: client,
            dispatch,
            handle,
        })
    }

    /// Stops ticks, closes the actor's channel and waits for the task to finish.
    ///
    /// Returns an error if the actor task panicked. Clones of the simulator client held
    /// elsewhere keep the actor alive, so drop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        if let Err(e) = self.simulator.stop().await {
            warn!(error = %e, "Stop before shutdown failed");
        }

        // Dropping the last sender makes the actor's `recv` return `None`.
        drop(self.simulator);
        drop(self.dispatch);

        if let Err(e) = self.handle.await {
            error!("Simulator task failed: {:?}", e);
            return Err(format!("Simulator task failed: {:?}", e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
