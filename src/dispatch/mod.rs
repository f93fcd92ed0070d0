//! Upload and query dispatch to the analysis backend, with the checks that must pass
//! before anything is sent.

pub mod client;
pub mod error;
pub mod service;
pub mod validate;

pub use client::*;
pub use error::*;
pub use service::*;
pub use validate::*;
