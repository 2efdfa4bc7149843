//! Token Flow Core Components
//!
//! Transport, token decoding and wire-level helpers.

pub mod decoder;
pub mod transport;
pub mod wire;

pub use decoder::*;
pub use transport::*;
pub use wire::*;
