//! Splits an inbound byte stream into complete top-level TLV elements.
//!
//! Holds at most one partial element in its internal buffer. Chunk
//! boundaries from the transport carry no meaning here — a chunk may
//! contain zero, one, or many elements, or a fragment of one.

use crate::error::{FaceError, Result};
use bytes::{Bytes, BytesMut};
use rust_udcn_common::ndn::MAX_NDN_PACKET_SIZE;
use rust_udcn_common::tlv::{TLV_DATA, TLV_INTEREST};

pub struct ElementReader {
    buffer: BytesMut,
}

impl ElementReader {
    /// Hard ceiling on a buffered partial element, matching the maximum
    /// top-level TLV element size.
    pub const MAX_BUFFERED: usize = MAX_NDN_PACKET_SIZE;

    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Feeds a chunk of inbound bytes, returning every complete element
    /// that can now be extracted, in receive order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(chunk);

        let mut elements = Vec::new();
        loop {
            match Self::header_and_total_len(&self.buffer)? {
                Some(total) if self.buffer.len() >= total => {
                    let element = self.buffer.split_to(total).freeze();
                    elements.push(element);
                }
                _ => break,
            }
        }

        if self.buffer.len() > Self::MAX_BUFFERED {
            return Err(FaceError::MalformedElement(format!(
                "{} bytes buffered without a complete element, exceeding the {}-byte ceiling",
                self.buffer.len(),
                Self::MAX_BUFFERED
            )));
        }

        Ok(elements)
    }

    /// Parses the TLV type and length at the front of `buf`, returning the
    /// total element length (header + value) once enough bytes are
    /// present to know it. Returns `Ok(None)` if more bytes are needed.
    fn header_and_total_len(buf: &[u8]) -> Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let tlv_type = buf[0];
        if tlv_type != TLV_INTEREST && tlv_type != TLV_DATA {
            return Err(FaceError::MalformedElement(format!(
                "unexpected top-level TLV type {}",
                tlv_type
            )));
        }

        if buf.len() < 2 {
            return Ok(None);
        }

        let (length, header_len): (usize, usize) = match buf[1] {
            0..=252 => (buf[1] as usize, 2),
            253 => {
                if buf.len() < 4 {
                    return Ok(None);
                }
                (u16::from_be_bytes([buf[2], buf[3]]) as usize, 4)
            }
            254 => {
                if buf.len() < 6 {
                    return Ok(None);
                }
                (
                    u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]) as usize,
                    6,
                )
            }
            255 => {
                return Err(FaceError::MalformedElement(
                    "64-bit TLV lengths are not supported".into(),
                ))
            }
            _ => unreachable!(),
        };

        let total = header_len + length;
        if total > MAX_NDN_PACKET_SIZE {
            return Err(FaceError::MalformedElement(format!(
                "element of {} bytes exceeds the maximum NDN packet size",
                total
            )));
        }

        Ok(Some(total))
    }
}

impl Default for ElementReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_udcn_common::ndn::{Interest, Name};

    #[test]
    fn splits_concatenated_elements() {
        let a = Interest::new(Name::from_string("/a")).encode(1).unwrap();
        let b = Interest::new(Name::from_string("/b")).encode(2).unwrap();
        let mut combined = Vec::new();
        combined.extend_from_slice(&a);
        combined.extend_from_slice(&b);

        let mut reader = ElementReader::new();
        let elements = reader.feed(&combined).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0], a);
        assert_eq!(elements[1], b);
    }

    #[test]
    fn handles_fragmented_reads() {
        let packet = Interest::new(Name::from_string("/a/b/c")).encode(7).unwrap();
        let mut reader = ElementReader::new();

        let mut elements = Vec::new();
        for byte in packet.iter() {
            elements.extend(reader.feed(&[*byte]).unwrap());
        }
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0], packet);
    }

    #[test]
    fn rejects_unknown_top_level_type() {
        let mut reader = ElementReader::new();
        let err = reader.feed(&[0xFF, 0x00]).unwrap_err();
        assert!(matches!(err, FaceError::MalformedElement(_)));
    }

    #[test]
    fn rejects_element_over_size_ceiling() {
        // Type = Data, length encoded as 32-bit = MAX_NDN_PACKET_SIZE + 1.
        let mut header = vec![TLV_DATA, 254];
        header.extend_from_slice(&((MAX_NDN_PACKET_SIZE + 1) as u32).to_be_bytes());

        let mut reader = ElementReader::new();
        let err = reader.feed(&header).unwrap_err();
        assert!(matches!(err, FaceError::MalformedElement(_)));
    }
}
