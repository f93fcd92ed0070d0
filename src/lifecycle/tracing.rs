//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the process-wide subscriber. Output is compact and hides
//! the module prefix (`with_target(false)`); structured fields carry the context
//! instead (`product_id`, `from`/`to` on stream transitions, `generation` on channels).
//!
//! ## Usage
//!
//! ```bash
//! # Transitions, tick start/stop, OOS events, dispatch outcomes (default)
//! RUST_LOG=info shelfwatch
//!
//! # Every request to the simulator actor and every tick outcome
//! RUST_LOG=debug shelfwatch
//!
//! # Only the stream consumer
//! RUST_LOG=shelfwatch::stream=debug shelfwatch
//! ```
//!
//! Typical `info` output for a short run:
//!
//! ```text
//! INFO Simulator started products=6
//! INFO Ticks started period_ms=2500 restarted=false
//! INFO Stock-out logged product_id=4 event_id=oos-1757339520000-1
//! INFO Stream status changed from=connecting to=streaming
//! INFO Ticks stopped was_running=true
//! ```

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins; without it the level is `info`.
///
/// Calling it twice keeps the first subscriber.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
