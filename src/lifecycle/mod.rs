pub mod system;
pub mod tracing;

pub use self::system::ShelfSystem;
pub use self::tracing::setup_tracing;
