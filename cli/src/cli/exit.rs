//! Process exit codes.
//!
//! clap exits with 2 on usage errors, so decode failures start at 3.

use songcrypt_core::crypto::KeyError;
use songcrypt_core::types::{DecodeError, ErrorKind};

pub const EXIT_IO: u8 = 3;
pub const EXIT_TRUNCATED: u8 = 4;
pub const EXIT_AUTH: u8 = 5;
pub const EXIT_FORMAT: u8 = 6;
pub const EXIT_KEY: u8 = 7;
pub const EXIT_INTERNAL: u8 = 8;

pub fn code_for_kind(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Io => EXIT_IO,
        ErrorKind::Truncated => EXIT_TRUNCATED,
        ErrorKind::Authentication => EXIT_AUTH,
        ErrorKind::Format => EXIT_FORMAT,
        ErrorKind::Key => EXIT_KEY,
        ErrorKind::Pipeline => EXIT_INTERNAL,
    }
}

/// First typed cause in the chain decides the code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DecodeError>() {
            return code_for_kind(e.kind());
        }
        if cause.downcast_ref::<KeyError>().is_some() {
            return EXIT_KEY;
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return EXIT_IO;
        }
    }
    EXIT_INTERNAL
}
