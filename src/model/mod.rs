//! Pure data structures shared by the stream consumer, the simulator and the dispatch layer.

pub mod listing;
pub mod media;
pub mod oos_event;
pub mod product;
pub mod stream;

pub use listing::*;
pub use media::*;
pub use oos_event::*;
pub use product::*;
pub use stream::*;
