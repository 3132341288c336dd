//! Section codec: read one `[nonce][tag][ciphertext]` section and open it.
//!
//! Caller guarantees:
//! - The reader is positioned at the first nonce byte of the section
//! - The ciphertext length is already known from an earlier section

use std::io::{ErrorKind, Read};
use bytes::Bytes;

use crate::constants::{MAC_SIZE, NONCE_SIZE, SECTION_OVERHEAD};
use crate::crypto::{CryptoError, SectionAead};
use crate::framing::types::{FrameError, SealedSection, Section, SectionLayout};

/// Fill as much of `len` bytes as the reader yields before EOF.
pub fn read_exact_or_eof<R: Read + ?Sized>(r: &mut R, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(off);
    Ok(buf)
}

/// Read one sealed section with a `ciphertext_len`-byte body, tag first.
pub fn read_section<R: Read + ?Sized>(
    reader: &mut R,
    section: Section,
    ciphertext_len: usize,
) -> Result<SealedSection, FrameError> {
    read_section_with_layout(reader, section, ciphertext_len, SectionLayout::TagFirst)
}

/// Read one sealed section whose tag sits where `layout` says.
pub fn read_section_with_layout<R: Read + ?Sized>(
    reader: &mut R,
    section: Section,
    ciphertext_len: usize,
    layout: SectionLayout,
) -> Result<SealedSection, FrameError> {
    let wire_len = SECTION_OVERHEAD + ciphertext_len;
    let wire = read_exact_or_eof(reader, wire_len)
        .map_err(|source| FrameError::Io { section, source })?;

    if wire.len() < wire_len {
        return Err(FrameError::Truncated {
            section,
            needed: wire_len as u64,
            available: wire.len() as u64,
        });
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&wire[..NONCE_SIZE]);

    let (tag_at, body) = match layout {
        SectionLayout::TagFirst => (NONCE_SIZE, SECTION_OVERHEAD..wire_len),
        SectionLayout::TagLast => (NONCE_SIZE + ciphertext_len, NONCE_SIZE..NONCE_SIZE + ciphertext_len),
    };
    let mut tag = [0u8; MAC_SIZE];
    tag.copy_from_slice(&wire[tag_at..tag_at + MAC_SIZE]);

    // O(1) slice, no copy
    let ciphertext = Bytes::from(wire).slice(body);

    Ok(SealedSection {
        section,
        nonce,
        tag,
        ciphertext,
    })
}

/// Verify and decrypt a sealed section. Nothing is returned unless the tag verifies.
pub fn open_section(
    aead: &dyn SectionAead,
    sealed: &SealedSection,
    aad: &[u8],
) -> Result<Bytes, FrameError> {
    let section = sealed.section;
    let plaintext = aead
        .open(&sealed.nonce, aad, &sealed.combined())
        .map_err(|e| match e {
            CryptoError::TagMismatch => FrameError::Authentication { section },
            other => FrameError::Crypto { section, source: other },
        })?;

    if plaintext.len() != sealed.ciphertext.len() {
        return Err(FrameError::LengthMismatch {
            section,
            expected: sealed.ciphertext.len(),
            actual: plaintext.len(),
        });
    }

    Ok(Bytes::from(plaintext))
}

/// `read_section` followed by `open_section`.
pub fn decode_section<R: Read + ?Sized>(
    reader: &mut R,
    aead: &dyn SectionAead,
    section: Section,
    ciphertext_len: usize,
    aad: &[u8],
) -> Result<Bytes, FrameError> {
    decode_section_with_layout(reader, aead, section, ciphertext_len, aad, SectionLayout::TagFirst)
}

pub fn decode_section_with_layout<R: Read + ?Sized>(
    reader: &mut R,
    aead: &dyn SectionAead,
    section: Section,
    ciphertext_len: usize,
    aad: &[u8],
    layout: SectionLayout,
) -> Result<Bytes, FrameError> {
    let sealed = read_section_with_layout(reader, section, ciphertext_len, layout)?;
    log::debug!(
        "{}: nonce={} ciphertext_len={} layout={:?}",
        section,
        hex::encode(sealed.nonce),
        sealed.ciphertext.len(),
        layout
    );
    open_section(aead, &sealed, aad)
}
