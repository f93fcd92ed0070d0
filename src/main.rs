//! # Shelfwatch demo
//!
//! Runs the shelf simulator for a few ticks against a small seed catalog, then
//! optionally follows the analysis result stream.
//!
//! ```bash
//! shelfwatch [config.toml] [--stream]
//! ```

use shelfwatch::config::AppConfig;
use shelfwatch::lifecycle::{setup_tracing, ShelfSystem};
use shelfwatch::model::Product;
use shelfwatch::simulator::{Catalog, RandomSelector, SystemClock};
use shelfwatch::stream::{SseConnector, StreamConsumer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

const DEMO_TICKS: u32 = 8;

fn seed_catalog() -> Result<Catalog, String> {
    Catalog::new(vec![
        Product::new(1, "Corn Flakes", "Kellogg's", 4.29, 3),
        Product::new(2, "Cheerios", "General Mills", 4.79, 2),
        Product::new(3, "Shreddies", "Nestle", 3.99, 1),
        Product::new(4, "Granola Crunch", "Nature Valley", 5.49, 2),
        Product::new(5, "Weetabix", "Weetabix", 3.49, 0),
        Product::new(6, "Frosted Flakes", "Kellogg's", 4.59, 4),
    ])
    .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let mut config_path = None;
    let mut follow_stream = false;
    for arg in std::env::args().skip(1) {
        if arg == "--stream" {
            follow_stream = true;
        } else {
            config_path = Some(PathBuf::from(arg));
        }
    }

    let config = AppConfig::load(config_path.as_deref()).map_err(|e| e.to_string())?;
    info!(?config, "Configuration loaded");

    let system = ShelfSystem::new(&config, seed_catalog()?).map_err(|e| e.to_string())?;

    let span = tracing::info_span!("simulation");
    async {
        let mut updates = system.simulator.subscribe();
        system
            .simulator
            .start(
                config.tick_period(),
                Arc::new(SystemClock),
                RandomSelector::from_os(),
            )
            .await
            .map_err(|e| e.to_string())?;

        for _ in 0..DEMO_TICKS {
            // Ticks that land on an empty shelf publish nothing.
            match tokio::time::timeout(config.tick_period() * 2, updates.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => break,
                Err(_) => continue,
            }
            let snapshot = updates.borrow_and_update().clone();
            info!(
                currently_oos = snapshot.currently_oos,
                events = snapshot.events.len(),
                "Inventory updated"
            );
        }

        // Restock whatever ran out; restocking resolves the open stock-out events.
        let snapshot = system.simulator.snapshot().await.map_err(|e| e.to_string())?;
        for product in snapshot.products.iter().filter(|p| p.is_out_of_stock()) {
            match system.simulator.adjust_stock(product.id, 5).await {
                Ok(p) => info!(product_id = p.id, stock = p.stock, "Restocked"),
                Err(e) => error!(product_id = product.id, error = %e, "Restock failed"),
            }
        }
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    if follow_stream {
        let span = tracing::info_span!("result_stream");
        async {
            let mut consumer = StreamConsumer::new(Arc::new(SseConnector::default()));
            if let Err(e) = consumer.open(&config.stream_endpoint) {
                warn!(error = %e, "Could not open result stream");
                return;
            }
            let status = consumer.run_until_terminal().await;
            match consumer.error_message() {
                Some(message) => warn!(%status, %message, "Stream ended with error"),
                None => info!(%status, summary = %consumer.session().summary(), "Stream finished"),
            }
        }
        .instrument(span)
        .await;
    }

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
