//! Section framing.
//!
//! Every section is `[nonce 12][tag 16][ciphertext N]`, except headers from the
//! original producer, which put the tag after the ciphertext. There is no length
//! prefix: `N` always comes from plaintext decoded out of an earlier section.

pub mod types;
pub mod decode;

pub use types::*;
pub use decode::*;
