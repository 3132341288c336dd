// ## 1️⃣ `mod.rs`: public façade + re-exports

//! stream: container decoding.
//!
//! Header and metadata are decoded serially; chunk sections fan out to a
//! worker pool and are written back in file order.

pub mod chunking;
pub mod chunk_worker;
pub mod parallelism;
pub mod pipeline;
pub mod io;
pub mod core;

pub use io::{InputSource, OutputSink};

pub use self::core::{
    decrypt_container,
    decrypt_container_with,
    decrypt_file,
    inspect_container,
    ContainerDriver,
    ContainerInfo,
    DecodeConfig,
    DecodeState,
};
