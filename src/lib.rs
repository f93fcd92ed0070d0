//! # Shelfwatch
//!
//! > **Shelf monitoring for retail inventory: live analysis results, a stock-out
//! > simulator, and validated media dispatch.**
//!
//! The crate is three independent fault domains. A failure in one never blocks or
//! corrupts the others.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Result Stream ([`stream`])
//! [`StreamConsumer`](stream::StreamConsumer) follows a server-pushed stream of tagged
//! events (`connect`, `image`, `video`, `error`, `complete`) and folds them into a
//! [`StreamSession`](model::StreamSession). It is an explicit state machine:
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Complete
//!              \            \
//!               +------------+----> Error
//! ```
//!
//! Terminal states close the channel. Malformed events are dropped and counted, never
//! fatal. The transport sits behind the [`Connector`](stream::Connector) trait; the
//! production one speaks Server-Sent Events over HTTP.
//!
//! ### 2. The Simulator ([`simulator`])
//! An actor that owns a product [`Catalog`](simulator::Catalog) and an out-of-stock
//! event log. Every tick sells one unit of a randomly chosen product; the sale that
//! empties a shelf logs an [`OosEvent`](model::OosEvent). Requests and ticks are
//! processed one at a time on the actor's task, so there are no locks around state.
//! Talk to it through [`SimulatorClient`](simulator::SimulatorClient).
//!
//! ### 3. Dispatch ([`dispatch`])
//! Uploads (images and videos up to 50 MiB) and natural-language queries to the
//! analysis backend. [`DispatchService`](dispatch::DispatchService) validates first, so
//! a rejected payload never leaves the process.
//!
//! ### 4. Wiring ([`lifecycle`], [`config`])
//! [`ShelfSystem`](lifecycle::ShelfSystem) spawns the simulator and builds the dispatch
//! service from an [`AppConfig`](config::AppConfig).
//!
//! ## 🧪 Testing
//!
//! - [`simulator::mock`] hands out a client wired to a bare receiver so client logic
//!   can be tested without spawning the actor.
//! - [`MemoryConnector`](stream::MemoryConnector) gives tests the event sink of every
//!   channel the consumer opens.
//! - Time-dependent tests run on Tokio's paused clock.

pub mod config;
pub mod dispatch;
pub mod lifecycle;
pub mod model;
pub mod simulator;
pub mod stream;
