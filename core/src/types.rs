use std::io;
use thiserror::Error;

use crate::{
    crypto::{CryptoError, KeyError},
    framing::{FrameError, Section},
    headers::HeaderError,
};

/// Unified decode error.
/// - Every variant that stems from container bytes names the failing section.
/// - `From<T>` impls enable `?` across the stages.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Cannot open, read or write a file or stream outside any section.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O failure while reading a specific section.
    #[error("I/O error in {section}: {source}")]
    SectionIo {
        section: Section,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes remain than the section needs.
    #[error("truncated input in {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: Section,
        needed: u64,
        available: u64,
    },

    /// Tag verification failed; nothing from this section or later is emitted.
    #[error("authentication failed in {section}")]
    Authentication { section: Section },

    /// Structurally inconsistent decoded values.
    #[error("format error in {section}: {reason}")]
    Format { section: Section, reason: String },

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Chunk worker pool broke down.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

/// Coarse error class, stable for exit codes and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Truncated,
    Authentication,
    Format,
    Key,
    Pipeline,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Io(_) | DecodeError::SectionIo { .. } => ErrorKind::Io,
            DecodeError::Truncated { .. } => ErrorKind::Truncated,
            DecodeError::Authentication { .. } => ErrorKind::Authentication,
            DecodeError::Format { .. } => ErrorKind::Format,
            DecodeError::Key(_) | DecodeError::Crypto(CryptoError::InvalidKeyLen { .. }) => {
                ErrorKind::Key
            }
            // Nonce and buffer sizes are fixed by the framing layer; these are internal faults.
            DecodeError::Crypto(_) => ErrorKind::Pipeline,
            DecodeError::Pipeline(_) => ErrorKind::Pipeline,
        }
    }

    /// Section the failure is attributed to, if any.
    pub fn section(&self) -> Option<Section> {
        match self {
            DecodeError::SectionIo { section, .. }
            | DecodeError::Truncated { section, .. }
            | DecodeError::Authentication { section }
            | DecodeError::Format { section, .. } => Some(*section),
            _ => None,
        }
    }
}

impl From<FrameError> for DecodeError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Truncated {
                section,
                needed,
                available,
            } => DecodeError::Truncated {
                section,
                needed,
                available,
            },
            FrameError::Io { section, source } => DecodeError::SectionIo { section, source },
            FrameError::Authentication { section } => DecodeError::Authentication { section },
            FrameError::Crypto { source, .. } => DecodeError::Crypto(source),
            e @ FrameError::LengthMismatch { .. } => DecodeError::Format {
                section: e.section(),
                reason: e.to_string(),
            },
        }
    }
}

impl From<HeaderError> for DecodeError {
    fn from(e: HeaderError) -> Self {
        DecodeError::Format {
            section: e.section(),
            reason: e.to_string(),
        }
    }
}
