//! Length-prefixed framing for the flicd stream socket.
//!
//! Every frame is a little-endian `u16` body length followed by the body
//! (opcode byte plus fields).

use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const HEADER_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
    #[error("frame header announces an empty body")]
    EmptyFrame,
    #[error("frame body of {0} bytes does not fit the 16-bit length header")]
    Oversized(usize),
}

pub fn encode_frame(body: &[u8]) -> Result<Vec<u8>, FramingError> {
    if body.is_empty() {
        return Err(FramingError::EmptyFrame);
    }
    let len = u16::try_from(body.len()).map_err(|_| FramingError::Oversized(body.len()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.put_u16_le(len);
    out.put_slice(body);
    Ok(out)
}

/// Looks for one complete frame at the start of `buf`.
///
/// Returns the frame body and the number of bytes it occupies including the
/// header, or `None` when more bytes are needed.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(&[u8], usize)>, FramingError> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    let body_len = usize::from((&buf[..HEADER_LEN]).get_u16_le());
    if body_len == 0 {
        return Err(FramingError::EmptyFrame);
    }

    let consumed = HEADER_LEN + body_len;
    if buf.len() < consumed {
        return Ok(None);
    }

    Ok(Some((&buf[HEADER_LEN..consumed], consumed)))
}

/// Reassembles frames from arbitrarily split reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>, FramingError> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        loop {
            let consumed = match decode_frame(&self.buffer) {
                Ok(Some((_, consumed))) => consumed,
                Ok(None) => break,
                Err(err) => {
                    self.buffer.clear();
                    return Err(err);
                }
            };

            let mut frame = self.buffer.split_to(consumed);
            frame.advance(HEADER_LEN);
            frames.push(frame.freeze());
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameDecoder, FramingError, decode_frame, encode_frame};

    #[test]
    fn encodes_length_header() {
        let encoded = encode_frame(&[7, 1, 2]).expect("encode should succeed");
        assert_eq!(encoded, vec![3, 0, 7, 1, 2]);
    }

    #[test]
    fn rejects_empty_and_oversized_bodies() {
        assert_eq!(encode_frame(&[]), Err(FramingError::EmptyFrame));
        let big = vec![0_u8; 70_000];
        assert_eq!(encode_frame(&big), Err(FramingError::Oversized(70_000)));
    }

    #[test]
    fn decode_frame_reports_need_more_data() {
        assert_eq!(decode_frame(&[]), Ok(None));
        assert_eq!(decode_frame(&[3]), Ok(None));
        assert_eq!(decode_frame(&[3, 0, 7, 1]), Ok(None));
        assert_eq!(
            decode_frame(&[3, 0, 7, 1, 2, 9]),
            Ok(Some((&[7_u8, 1, 2][..], 5)))
        );
    }

    #[test]
    fn decodes_multiple_frames() {
        let input = [3_u8, 0, 1, 2, 3, 1, 0, 4];
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&input).expect("decode should succeed");

        assert_eq!(frames, vec![vec![1_u8, 2, 3], vec![4]]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn decodes_frame_byte_by_byte() {
        let input = [4_u8, 0, 9, 8, 7, 6, 1, 0, 5];
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();

        for &b in &input {
            frames.extend(
                decoder
                    .push(core::slice::from_ref(&b))
                    .expect("decode should succeed"),
            );
        }

        assert_eq!(frames, vec![vec![9_u8, 8, 7, 6], vec![5]]);
    }

    #[test]
    fn keeps_residual_bytes_for_next_push() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .push(&[1, 0, 4, 2, 0, 5])
            .expect("decode should succeed");
        assert_eq!(frames, vec![vec![4_u8]]);
        assert_eq!(decoder.buffered(), 3);

        let frames = decoder.push(&[6]).expect("decode should succeed");
        assert_eq!(frames, vec![vec![5_u8, 6]]);
    }

    #[test]
    fn empty_frame_resets_decoder() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.push(&[0, 0, 1]), Err(FramingError::EmptyFrame));
        assert_eq!(decoder.buffered(), 0);
    }
}
