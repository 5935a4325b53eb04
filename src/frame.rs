//! Wire codec for the four frame shapes that cross the byte channel: DATA,
//! PROBE, END, and ACK.
//!
//! Binary layout (all integers big-endian):
//!
//! ```text
//! DATA/PROBE/END:  seq:i32 | length:i32 | is_probe:u8 | payload[length]
//! ACK:             ack:i32 | rwnd:i32
//! ```
//!
//! There is no type tag on the wire: callers know which frame kind they're
//! decoding from the direction of the channel (segments flow sender->receiver,
//! ACKs flow receiver->sender). The codec itself is stateless.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TcpliteError};

/// A DATA, PROBE, or END segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub seq: i32,
    pub payload: Bytes,
    pub role: Role,
}

/// The role tag carried by a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Data,
    /// Exactly one byte of payload; does not advance sender sequence space.
    Probe,
    /// Zero payload; signals end-of-stream.
    End,
}

impl Segment {
    pub fn data(seq: i32, payload: Bytes) -> Self {
        Self {
            seq,
            payload,
            role: Role::Data,
        }
    }

    pub fn probe(seq: i32, byte: u8) -> Self {
        Self {
            seq,
            payload: Bytes::copy_from_slice(&[byte]),
            role: Role::Probe,
        }
    }

    pub fn end(seq: i32) -> Self {
        Self {
            seq,
            payload: Bytes::new(),
            role: Role::End,
        }
    }

    pub fn is_probe(&self) -> bool {
        matches!(self.role, Role::Probe)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.role, Role::End)
    }

    pub fn encoded_len(&self) -> usize {
        4 + 4 + 1 + self.payload.len()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_i32(self.seq);
        buf.put_i32(self.payload.len() as i32);
        buf.put_u8(if self.is_probe() { 1 } else { 0 });
        buf.put_slice(&self.payload);
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len(data, 9, 9)?;
        let mut cursor = data;
        let seq = cursor.get_i32();
        let length = cursor.get_i32();
        if length < 0 {
            return Err(TcpliteError::MalformedFrameDetail(
                "segment length is negative",
            ));
        }
        let length = length as usize;
        let is_probe = cursor.get_u8();
        ensure_len(cursor, length, length)?;
        if is_probe != 0 && length != 1 {
            return Err(TcpliteError::MalformedFrameDetail(
                "PROBE segment must carry exactly one payload byte",
            ));
        }
        let payload = Bytes::copy_from_slice(&cursor[..length]);
        let role = if is_probe != 0 {
            Role::Probe
        } else if length == 0 {
            Role::End
        } else {
            Role::Data
        };
        Ok(Segment { seq, payload, role })
    }
}

/// A cumulative acknowledgement: (highest in-order seq accepted, free bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub ack: i32,
    pub rwnd: i32,
}

impl Ack {
    pub const ENCODED_LEN: usize = 8;

    pub fn new(ack: i32, rwnd: i32) -> Self {
        Self { ack, rwnd }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::ENCODED_LEN);
        buf.put_i32(self.ack);
        buf.put_i32(self.rwnd);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure_len(data, Self::ENCODED_LEN, Self::ENCODED_LEN)?;
        let mut cursor = data;
        let ack = cursor.get_i32();
        let rwnd = cursor.get_i32();
        Ok(Ack { ack, rwnd })
    }
}

fn ensure_len(data: &[u8], needed: usize, _context: usize) -> Result<()> {
    if data.len() < needed {
        Err(TcpliteError::MalformedFrame {
            expected: needed,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_round_trips() {
        let seg = Segment::data(7, Bytes::from_static(b"hello"));
        let bytes = seg.encode();
        let decoded = Segment::decode(&bytes).unwrap();
        assert_eq!(decoded, seg);
    }

    #[test]
    fn end_round_trips() {
        let seg = Segment::end(42);
        let bytes = seg.encode();
        let decoded = Segment::decode(&bytes).unwrap();
        assert_eq!(decoded.seq, 42);
        assert!(decoded.is_end());
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn probe_round_trips() {
        let seg = Segment::probe(3, 0xAB);
        let bytes = seg.encode();
        let decoded = Segment::decode(&bytes).unwrap();
        assert!(decoded.is_probe());
        assert_eq!(&decoded.payload[..], &[0xAB]);
    }

    #[test]
    fn ack_round_trips() {
        let ack = Ack::new(12, 4096);
        let bytes = ack.encode();
        let decoded = Ack::decode(&bytes).unwrap();
        assert_eq!(decoded, ack);
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = Segment::decode(&[0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, TcpliteError::MalformedFrame { .. }));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let seg = Segment::data(1, Bytes::from_static(b"hello world"));
        let bytes = seg.encode();
        let truncated = &bytes[..bytes.len() - 3];
        let err = Segment::decode(truncated).unwrap_err();
        assert!(matches!(err, TcpliteError::MalformedFrame { .. }));
    }

    #[test]
    fn negative_length_is_malformed() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(-1);
        buf.put_u8(0);
        let err = Segment::decode(&buf).unwrap_err();
        assert!(matches!(err, TcpliteError::MalformedFrameDetail(_)));
    }

    #[test]
    fn probe_with_wrong_length_is_malformed() {
        let mut buf = BytesMut::new();
        buf.put_i32(1);
        buf.put_i32(2);
        buf.put_u8(1);
        buf.put_slice(b"xy");
        let err = Segment::decode(&buf).unwrap_err();
        assert!(matches!(err, TcpliteError::MalformedFrameDetail(_)));
    }

    #[test]
    fn ack_truncated_is_malformed() {
        let err = Ack::decode(&[0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, TcpliteError::MalformedFrame { .. }));
    }
}
