//! # Canonical Serialization — Fixed-Width Binary Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation across the child chain.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which runs a type's
//! [`Canonical`] implementation against a [`CanonicalWriter`]. The writer
//! only knows fixed-width big-endian integers and fixed-length byte strings,
//! so there is exactly one byte sequence per value: no length prefixes that
//! could be chosen two ways, no optional fields, no padding.
//!
//! A root-chain verifier that only has byte slicing and integer arithmetic can
//! therefore rebuild the same bytes (and the same hashes) from the same
//! fields.
//!
//! ## Decoding
//!
//! [`CanonicalReader`] is the inverse used by the persistence layer. Every
//! read names the field it is reading so truncated records produce a useful
//! [`CodecError`].

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::error::CodecError;

/// A value with exactly one canonical byte encoding.
pub trait Canonical {
    /// Append this value's canonical encoding to the writer.
    fn write_canonical(&self, w: &mut CanonicalWriter);
}

/// Append-only writer for canonical encodings.
///
/// All integers are written big-endian at their full width.
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    buf: Vec<u8>,
}

impl CanonicalWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Write a single byte.
    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    /// Write a 4-byte big-endian integer.
    pub fn put_u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    /// Write an 8-byte big-endian integer.
    pub fn put_u64(&mut self, v: u64) {
        let mut b = [0u8; 8];
        BigEndian::write_u64(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    /// Write raw bytes. Callers only pass fixed-length values.
    pub fn put_bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    /// Write a nested canonical value.
    pub fn put<T: Canonical + ?Sized>(&mut self, v: &T) {
        v.write_canonical(self);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Bytes produced exclusively by a [`Canonical`] encoding.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Integers are big-endian at full width.
/// - Variable-length sequences carry an explicit `u32` count written by the
///   owning type, never an implicit terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any canonical value.
    ///
    /// This is the ONLY way to construct `CanonicalBytes`. All digest
    /// computation in the ledger must flow through this constructor.
    pub fn new<T: Canonical + ?Sized>(value: &T) -> Self {
        let mut w = CanonicalWriter::new();
        value.write_canonical(&mut w);
        Self(w.buf)
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying byte vector (for storage and transport).
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Render as lowercase hex with a `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Cursor over canonical bytes.
#[derive(Debug)]
pub struct CanonicalReader<'a> {
    cursor: &'a [u8],
}

impl<'a> CanonicalReader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { cursor: bytes }
    }

    /// Read a single byte.
    pub fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        self.cursor
            .read_u8()
            .map_err(|_| CodecError::UnexpectedEof(field))
    }

    /// Read a 4-byte big-endian integer.
    pub fn u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        self.cursor
            .read_u32::<BigEndian>()
            .map_err(|_| CodecError::UnexpectedEof(field))
    }

    /// Read an 8-byte big-endian integer.
    pub fn u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        self.cursor
            .read_u64::<BigEndian>()
            .map_err(|_| CodecError::UnexpectedEof(field))
    }

    /// Read a fixed-length byte array.
    pub fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        if self.cursor.len() < N {
            return Err(CodecError::UnexpectedEof(field));
        }
        let (head, tail) = self.cursor.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        self.cursor = tail;
        Ok(out)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.cursor.len()
    }

    /// Require that every byte was consumed.
    pub fn finish(self) -> Result<(), CodecError> {
        if self.cursor.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingData(self.cursor.len()))
        }
    }
}

/// Decode `0x`-prefixed or bare hex text into bytes.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, CodecError> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(text).map_err(|e| CodecError::Hex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair(u64, u32);

    impl Canonical for Pair {
        fn write_canonical(&self, w: &mut CanonicalWriter) {
            w.put_u64(self.0);
            w.put_u32(self.1);
        }
    }

    #[test]
    fn writer_is_big_endian_fixed_width() {
        let cb = CanonicalBytes::new(&Pair(1, 2));
        assert_eq!(cb.as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(cb.len(), 12);
    }

    #[test]
    fn reader_reads_back_fields() {
        let cb = CanonicalBytes::new(&Pair(u64::MAX, 7));
        let mut r = CanonicalReader::new(cb.as_bytes());
        assert_eq!(r.u64("a").unwrap(), u64::MAX);
        assert_eq!(r.u32("b").unwrap(), 7);
        r.finish().unwrap();
    }

    #[test]
    fn reader_reports_truncation_with_field_name() {
        let mut r = CanonicalReader::new(&[0, 1]);
        assert_eq!(r.u32("count"), Err(CodecError::UnexpectedEof("count")));
        let mut r = CanonicalReader::new(&[0, 1]);
        assert_eq!(
            r.array::<3>("owner"),
            Err(CodecError::UnexpectedEof("owner"))
        );
    }

    #[test]
    fn reader_rejects_trailing_bytes() {
        let mut r = CanonicalReader::new(&[1, 2, 3]);
        r.u8("x").unwrap();
        assert_eq!(r.finish(), Err(CodecError::TrailingData(2)));
    }

    #[test]
    fn hex_rendering_and_decoding() {
        let cb = CanonicalBytes::new(&Pair(0, 255));
        let hex = cb.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(decode_hex(&hex).unwrap(), cb.as_bytes());
        assert_eq!(decode_hex("abcd").unwrap(), vec![0xab, 0xcd]);
        assert!(decode_hex("0xzz").is_err());
    }
}
