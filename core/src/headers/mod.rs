//! headers/mod.rs
//! Header and metadata stages.
//!
//! Both sections are strictly serial: the header reveals the metadata size and
//! the payload size, the metadata reveals the digest that authenticates every chunk.

pub mod types;
pub mod decode;
pub mod metadata;

pub use types::*;
pub use decode::*;
pub use metadata::*;
