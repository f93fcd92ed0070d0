//! Consumer for the server-pushed result stream.
//!
//! - [`StreamConsumer`]: the session state machine.
//! - [`Connector`]: the seam between the consumer and a transport.
//! - [`SseConnector`]: HTTP event-stream transport.
//! - [`MemoryConnector`]: transport-free connector for tests and bridges.

pub mod channel;
pub mod consumer;
pub mod error;
pub mod event;
pub mod sse;

pub use channel::*;
pub use consumer::*;
pub use error::*;
pub use event::*;
pub use sse::*;
