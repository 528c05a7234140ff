//! The 32-bit length-prefixed message framer.
//!
//! Splits an arbitrarily-fragmented byte stream into complete frame
//! payloads. Decoding those payloads into [`crate::variant::Variant`]
//! values happens one layer up — the framer only ever reports
//! [`CodecError::EndOfInput`]-shaped incompleteness, never a decode
//! failure, so a frame that fails to parse downstream can never corrupt
//! the framer's own position in the stream.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Frames larger than this are rejected outright rather than buffered,
/// so a corrupt or hostile length prefix cannot force unbounded
/// allocation.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Incremental length-prefixed frame splitter.
///
/// Call [`Framer::feed`] with each chunk read off the socket, then drain
/// complete frames with [`Framer::next_frame`] until it returns `None`.
#[derive(Debug, Default)]
pub struct Framer {
    buf: BytesMut,
}

impl Framer {
    /// A framer with an empty internal buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: BytesMut::new() }
    }

    /// Append newly-read bytes to the internal buffer.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete frame payload, if the buffer holds one.
    ///
    /// # Errors
    /// Returns [`CodecError::Malformed`] if a length prefix exceeds
    /// [`MAX_FRAME_LEN`]. The framer's position in the stream is left
    /// unrecoverable in that case; the caller should close the connection.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
        if len > MAX_FRAME_LEN {
            return Err(CodecError::Malformed(format!(
                "frame length {len} exceeds maximum {MAX_FRAME_LEN}"
            )));
        }
        let total = 4 + len as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        self.buf.advance(4);
        let payload = self.buf.split_to(len as usize).freeze();
        Ok(Some(payload))
    }

    /// Encode a frame: a 4-byte big-endian length followed by `payload`.
    pub fn encode_frame(dst: &mut BytesMut, payload: &[u8]) {
        dst.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        dst.extend_from_slice(payload);
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_buffer_yields_no_frame() {
        let mut framer = Framer::new();
        assert_eq!(framer.next_frame().unwrap(), None);
    }

    #[test]
    fn single_frame_fed_whole() {
        let mut dst = BytesMut::new();
        Framer::encode_frame(&mut dst, b"hello");

        let mut framer = Framer::new();
        framer.feed(&dst);
        assert_eq!(framer.next_frame().unwrap(), Some(Bytes::from_static(b"hello")));
        assert_eq!(framer.next_frame().unwrap(), None);
    }

    #[test]
    fn frame_split_across_many_small_chunks() {
        let mut dst = BytesMut::new();
        Framer::encode_frame(&mut dst, b"fragmented payload");

        let mut framer = Framer::new();
        for byte in &dst {
            assert_eq!(framer.next_frame().unwrap(), None);
            framer.feed(std::slice::from_ref(byte));
        }
        assert_eq!(framer.next_frame().unwrap(), Some(Bytes::from_static(b"fragmented payload")));
    }

    #[test]
    fn two_frames_fed_back_to_back() {
        let mut dst = BytesMut::new();
        Framer::encode_frame(&mut dst, b"first");
        Framer::encode_frame(&mut dst, b"second");

        let mut framer = Framer::new();
        framer.feed(&dst);
        assert_eq!(framer.next_frame().unwrap(), Some(Bytes::from_static(b"first")));
        assert_eq!(framer.next_frame().unwrap(), Some(Bytes::from_static(b"second")));
        assert_eq!(framer.next_frame().unwrap(), None);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut framer = Framer::new();
        framer.feed(&(MAX_FRAME_LEN + 1).to_be_bytes());
        assert!(framer.next_frame().is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_fragmentation_reassembles_every_frame(
            payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..256), 1..8),
            chunk_size in 1usize..17,
        ) {
            let mut wire = BytesMut::new();
            for payload in &payloads {
                Framer::encode_frame(&mut wire, payload);
            }

            let mut framer = Framer::new();
            let mut decoded = Vec::new();
            for chunk in wire.chunks(chunk_size) {
                framer.feed(chunk);
                while let Some(frame) = framer.next_frame().unwrap() {
                    decoded.push(frame.to_vec());
                }
            }

            prop_assert_eq!(decoded, payloads);
        }
    }
}
