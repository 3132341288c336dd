pub mod types;
pub mod aead;
pub mod key;

pub use types::*;
pub use aead::*;
pub use key::*;
