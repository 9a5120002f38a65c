//! NDN packet types and structures.
//!
//! This module provides the core data structures that represent NDN packets:
//! names, Interests, Data, and the NFD control-protocol TLVs used by the
//! prefix registrar.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, Bytes, BytesMut};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum size of a top-level NDN TLV element (Interest or Data).
pub const MAX_NDN_PACKET_SIZE: usize = 8800;

/// Default Interest lifetime when none is set, in milliseconds.
pub const DEFAULT_INTEREST_LIFETIME_MS: u32 = 4000;

/* ---------------------------------------------------------------- *\
 * Name and NameComponent
\* ---------------------------------------------------------------- */

/// A single opaque name component. Segment-number components carry a
/// leading `0x00` marker byte followed by a minimal big-endian encoding
/// of the segment index (NDN naming-convention rev2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

const SEGMENT_MARKER: u8 = 0x00;

impl NameComponent {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Builds a segment-number component: `0x00` followed by the minimal
    /// big-endian encoding of `n` (0 encodes as the single byte `0x00`).
    pub fn segment(n: u64) -> Self {
        let mut buf = Vec::with_capacity(9);
        buf.push(SEGMENT_MARKER);
        if n == 0 {
            return Self(Bytes::from(buf));
        }
        let be = n.to_be_bytes();
        let first_nonzero = be.iter().position(|&b| b != 0).unwrap();
        buf.extend_from_slice(&be[first_nonzero..]);
        Self(Bytes::from(buf))
    }

    /// Interprets this component as a segment number, if it carries the
    /// `0x00` marker and a minimal big-endian payload.
    pub fn as_segment(&self) -> Option<u64> {
        let bytes = &self.0;
        if bytes.is_empty() || bytes[0] != SEGMENT_MARKER {
            return None;
        }
        let payload = &bytes[1..];
        if payload.len() > 8 {
            return None;
        }
        if payload.len() > 1 && payload[0] == 0 {
            return None; // not minimal
        }
        if payload.is_empty() {
            return Some(0);
        }
        let mut padded = [0u8; 8];
        padded[8 - payload.len()..].copy_from_slice(payload);
        Some(u64::from_be_bytes(padded))
    }

    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::new(tlv::TLV_COMPONENT, self.0.clone())
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_COMPONENT {
            return Err(Error::NdnPacket(format!(
                "expected name component TLV type {}, got {}",
                tlv::TLV_COMPONENT,
                element.tlv_type
            )));
        }
        Ok(Self(element.value.clone()))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(seg) = self.as_segment() {
            return write!(f, "seg={}", seg);
        }
        let printable = self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ');
        if printable {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x")?;
            for &b in &self.0 {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

/// An ordered sequence of opaque name components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(s: &str) -> Self {
        let components = s
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent::new(comp.as_bytes().to_vec()))
            .collect();
        Self { components }
    }

    pub fn append(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns a copy of `self` with `component` appended; used wherever the
    /// caller must not mutate a shared or borrowed Name in place.
    pub fn with_appended(&self, component: NameComponent) -> Self {
        let mut n = self.clone();
        n.append(component);
        n
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    /// Reads the `i`-th component. Negative indices count from the end
    /// (`-1` is the last component).
    pub fn get(&self, i: isize) -> Option<&NameComponent> {
        let len = self.components.len() as isize;
        let idx = if i < 0 { len + i } else { i };
        if idx < 0 || idx >= len {
            return None;
        }
        self.components.get(idx as usize)
    }

    /// Returns the first `k` components for non-negative `k`, or drops the
    /// last `|k|` components for negative `k`.
    pub fn prefix(&self, k: isize) -> Self {
        let len = self.components.len() as isize;
        let take = if k < 0 { (len + k).max(0) } else { k.min(len) };
        Self {
            components: self.components.iter().take(take as usize).cloned().collect(),
        }
    }

    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.components.len() > other.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    pub fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        for component in &self.components {
            component.to_tlv().encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_NAME, buf.freeze())
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NAME {
            return Err(Error::NdnPacket(format!(
                "expected name TLV type {}, got {}",
                tlv::TLV_NAME,
                element.tlv_type
            )));
        }
        let mut components = Vec::new();
        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let e = TlvElement::decode(&mut buf)?;
            components.push(NameComponent::from_tlv(&e)?);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/* ---------------------------------------------------------------- *\
 * Interest
\* ---------------------------------------------------------------- */

/// An Interest packet and its selectors. Any setter that changes a selector
/// clears `nonce` — a fresh nonce is generated at send time, per the
/// replay-protection requirement on command Interests (see
/// `rust-udcn-face::command`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub child_selector: Option<u8>,
    pub must_be_fresh: bool,
    pub nonce: Option<u32>,
    pub interest_lifetime_ms: Option<u32>,
    pub forwarding_hint: Option<Name>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            child_selector: None,
            must_be_fresh: false,
            nonce: None,
            interest_lifetime_ms: None,
            forwarding_hint: None,
        }
    }

    pub fn set_name(&mut self, name: Name) -> &mut Self {
        self.name = name;
        self.nonce = None;
        self
    }

    pub fn set_child_selector(&mut self, v: Option<u8>) -> &mut Self {
        self.child_selector = v;
        self.nonce = None;
        self
    }

    pub fn set_must_be_fresh(&mut self, v: bool) -> &mut Self {
        self.must_be_fresh = v;
        self.nonce = None;
        self
    }

    pub fn set_forwarding_hint(&mut self, v: Option<Name>) -> &mut Self {
        self.forwarding_hint = v;
        self.nonce = None;
        self
    }

    pub fn set_lifetime_ms(&mut self, ms: u32) -> &mut Self {
        self.interest_lifetime_ms = Some(ms);
        self
    }

    /// The lifetime to actually wait, applying the 4000ms default.
    pub fn effective_lifetime_ms(&self) -> u32 {
        self.interest_lifetime_ms.unwrap_or(DEFAULT_INTEREST_LIFETIME_MS)
    }

    pub fn encode(&self, nonce: u32) -> Result<Bytes, Error> {
        let mut buf = BytesMut::new();
        self.name.to_tlv().encode(&mut buf);
        if let Some(cs) = self.child_selector {
            tlv::encode_nonneg_integer_tlv(tlv::TLV_CHILD_SELECTOR, cs as u64, &mut buf);
        }
        if self.must_be_fresh {
            tlv::encode_tlv_type(tlv::TLV_MUST_BE_FRESH, &mut buf);
            tlv::encode_tlv_length(0, &mut buf);
        }
        tlv::encode_nonneg_integer_tlv(tlv::TLV_NONCE, nonce as u64, &mut buf);
        tlv::encode_nonneg_integer_tlv(
            tlv::TLV_INTEREST_LIFETIME,
            self.effective_lifetime_ms() as u64,
            &mut buf,
        );
        if let Some(hint) = &self.forwarding_hint {
            let inner = hint.to_tlv();
            let mut hint_buf = BytesMut::new();
            inner.encode(&mut hint_buf);
            let el = TlvElement::new(tlv::TLV_FORWARDING_HINT, hint_buf.freeze());
            el.encode(&mut buf);
        }

        let mut out = BytesMut::new();
        TlvElement::new(tlv::TLV_INTEREST, buf.freeze()).encode(&mut out);
        Ok(out.freeze())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = Bytes::copy_from_slice(bytes);
        let outer = TlvElement::decode(&mut cursor)?;
        if outer.tlv_type != tlv::TLV_INTEREST {
            warn!("expected Interest TLV type {}, got {}", tlv::TLV_INTEREST, outer.tlv_type);
            return Err(Error::NdnPacket("not an Interest TLV".into()));
        }
        let mut body = outer.value.clone();
        let name_el = TlvElement::decode(&mut body)?;
        let name = Name::from_tlv(&name_el)?;

        let mut interest = Interest::new(name);
        while body.has_remaining() {
            let el = TlvElement::decode(&mut body)?;
            match el.tlv_type {
                t if t == tlv::TLV_CHILD_SELECTOR => {
                    interest.child_selector = Some(tlv::decode_nonneg_integer(&el.value)? as u8);
                }
                t if t == tlv::TLV_MUST_BE_FRESH => interest.must_be_fresh = true,
                t if t == tlv::TLV_NONCE => {
                    interest.nonce = Some(tlv::decode_nonneg_integer(&el.value)? as u32);
                }
                t if t == tlv::TLV_INTEREST_LIFETIME => {
                    interest.interest_lifetime_ms = Some(tlv::decode_nonneg_integer(&el.value)? as u32);
                }
                t if t == tlv::TLV_FORWARDING_HINT => {
                    let mut hv = el.value.clone();
                    let inner = TlvElement::decode(&mut hv)?;
                    interest.forwarding_hint = Some(Name::from_tlv(&inner)?);
                }
                _ => {} // unknown TLV, ignore (forward-compatible per NDN TLV rules)
            }
        }
        Ok(interest)
    }
}

/* ---------------------------------------------------------------- *\
 * Data
\* ---------------------------------------------------------------- */

/// Metadata carried alongside Data content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaInfo {
    pub content_type: Option<u32>,
    pub freshness_period_ms: Option<u32>,
    /// Name component of the last segment of a multi-segment object. When
    /// this equals the current packet's final name component, the packet
    /// is the last segment.
    pub final_block_id: Option<NameComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub content: Bytes,
    pub meta_info: MetaInfo,
}

impl Data {
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            meta_info: MetaInfo::default(),
        }
    }

    pub fn with_final_block_id(mut self, id: NameComponent) -> Self {
        self.meta_info.final_block_id = Some(id);
        self
    }

    /// True if this Data packet is the last segment of its object.
    pub fn is_final_segment(&self) -> bool {
        match (&self.meta_info.final_block_id, self.name.get(-1)) {
            (Some(fbi), Some(last)) => fbi == last,
            _ => false,
        }
    }

    pub fn encode(&self) -> Result<Bytes, Error> {
        let mut body = BytesMut::new();
        self.name.to_tlv().encode(&mut body);

        let mut meta_buf = BytesMut::new();
        if let Some(ct) = self.meta_info.content_type {
            tlv::encode_nonneg_integer_tlv(tlv::TLV_CONTENT_TYPE, ct as u64, &mut meta_buf);
        }
        if let Some(fp) = self.meta_info.freshness_period_ms {
            tlv::encode_nonneg_integer_tlv(tlv::TLV_FRESHNESS_PERIOD, fp as u64, &mut meta_buf);
        }
        if let Some(fbi) = &self.meta_info.final_block_id {
            let mut fbi_buf = BytesMut::new();
            fbi.to_tlv().encode(&mut fbi_buf);
            TlvElement::new(tlv::TLV_FINAL_BLOCK_ID, fbi_buf.freeze()).encode(&mut meta_buf);
        }
        TlvElement::new(tlv::TLV_META_INFO, meta_buf.freeze()).encode(&mut body);
        TlvElement::new(tlv::TLV_CONTENT, self.content.clone()).encode(&mut body);

        let mut out = BytesMut::new();
        TlvElement::new(tlv::TLV_DATA, body.freeze()).encode(&mut out);
        Ok(out.freeze())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = Bytes::copy_from_slice(bytes);
        let outer = TlvElement::decode(&mut cursor)?;
        if outer.tlv_type != tlv::TLV_DATA {
            warn!("expected Data TLV type {}, got {}", tlv::TLV_DATA, outer.tlv_type);
            return Err(Error::NdnPacket("not a Data TLV".into()));
        }
        let mut body = outer.value.clone();
        let name_el = TlvElement::decode(&mut body)?;
        let name = Name::from_tlv(&name_el)?;

        let mut meta_info = MetaInfo::default();
        let mut content = Bytes::new();
        while body.has_remaining() {
            let el = TlvElement::decode(&mut body)?;
            match el.tlv_type {
                t if t == tlv::TLV_META_INFO => {
                    let mut mv = el.value.clone();
                    while mv.has_remaining() {
                        let inner = TlvElement::decode(&mut mv)?;
                        match inner.tlv_type {
                            t if t == tlv::TLV_CONTENT_TYPE => {
                                meta_info.content_type = Some(tlv::decode_nonneg_integer(&inner.value)? as u32);
                            }
                            t if t == tlv::TLV_FRESHNESS_PERIOD => {
                                meta_info.freshness_period_ms =
                                    Some(tlv::decode_nonneg_integer(&inner.value)? as u32);
                            }
                            t if t == tlv::TLV_FINAL_BLOCK_ID => {
                                let mut fv = inner.value.clone();
                                let comp = TlvElement::decode(&mut fv)?;
                                meta_info.final_block_id = Some(NameComponent::from_tlv(&comp)?);
                            }
                            _ => {}
                        }
                    }
                }
                t if t == tlv::TLV_CONTENT => content = el.value.clone(),
                _ => {}
            }
        }
        Ok(Self { name, content, meta_info })
    }
}

/* ---------------------------------------------------------------- *\
 * NFD control protocol (ControlParameters / ControlResponse)
\* ---------------------------------------------------------------- */

/// Flags accompanying a `rib/register` ControlParameters; only the bits
/// the registrar needs are modeled.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ControlParametersFlags(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlParameters {
    pub name: Name,
    pub flags: Option<ControlParametersFlags>,
}

impl ControlParameters {
    pub fn new(name: Name) -> Self {
        Self { name, flags: None }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.name.to_tlv().encode(&mut buf);
        if let Some(flags) = self.flags {
            tlv::encode_nonneg_integer_tlv(tlv::TLV_CP_FLAGS, flags.0, &mut buf);
        }
        let mut out = BytesMut::new();
        TlvElement::new(tlv::TLV_CONTROL_PARAMETERS, buf.freeze()).encode(&mut out);
        out.freeze()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status_code: u32,
    pub status_text: String,
}

impl ControlResponse {
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = Bytes::copy_from_slice(bytes);
        let outer = TlvElement::decode(&mut cursor)?;
        if outer.tlv_type != tlv::TLV_CONTROL_RESPONSE {
            warn!(
                "expected ControlResponse TLV type {}, got {}",
                tlv::TLV_CONTROL_RESPONSE,
                outer.tlv_type
            );
            return Err(Error::NdnPacket("not a ControlResponse TLV".into()));
        }
        let mut body = outer.value.clone();
        let mut status_code = None;
        let mut status_text = String::new();
        while body.has_remaining() {
            let el = TlvElement::decode(&mut body)?;
            match el.tlv_type {
                t if t == tlv::TLV_STATUS_CODE => {
                    status_code = Some(tlv::decode_nonneg_integer(&el.value)? as u32);
                }
                t if t == tlv::TLV_STATUS_TEXT => {
                    status_text = String::from_utf8_lossy(&el.value).into_owned();
                }
                _ => {}
            }
        }
        Ok(Self {
            status_code: status_code
                .ok_or_else(|| Error::NdnPacket("ControlResponse missing StatusCode".into()))?,
            status_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trips_through_string() {
        let name = Name::from_string("/a/b/c");
        assert_eq!(name.len(), 3);
        assert_eq!(name.to_string(), "/a/b/c");
    }

    #[test]
    fn name_prefix_and_negative_indexing() {
        let name = Name::from_string("/a/b/c");
        assert_eq!(name.prefix(2), Name::from_string("/a/b"));
        assert_eq!(name.prefix(-1), Name::from_string("/a/b"));
        assert_eq!(name.prefix(-2), Name::from_string("/a"));
        assert_eq!(name.get(-1), name.get(2));
        assert_eq!(name.get(-1).unwrap().to_string(), "c");
    }

    #[test]
    fn is_prefix_of() {
        let a = Name::from_string("/a/b");
        let ab = Name::from_string("/a/b/c");
        assert!(a.is_prefix_of(&ab));
        assert!(!ab.is_prefix_of(&a));
        assert!(!Name::from_string("/a/x").is_prefix_of(&ab));
    }

    #[test]
    fn segment_number_round_trip() {
        for n in [0u64, 1, 255, 256, 65535, 65536, u32::MAX as u64, u64::MAX] {
            let comp = NameComponent::segment(n);
            assert_eq!(comp.as_segment(), Some(n));
        }
        assert_eq!(NameComponent::segment(0).as_bytes().as_ref(), &[0x00]);
    }

    #[test]
    fn non_segment_component_is_not_a_segment() {
        let comp = NameComponent::new(b"hello".to_vec());
        assert_eq!(comp.as_segment(), None);
    }

    #[test]
    fn name_tlv_round_trip() {
        let name = Name::from_string("/foo/bar").with_appended(NameComponent::segment(3));
        let encoded = name.to_tlv();
        let decoded = Name::from_tlv(&encoded).unwrap();
        assert_eq!(name, decoded);
    }

    #[test]
    fn interest_selector_change_clears_nonce() {
        let mut interest = Interest::new(Name::from_string("/a"));
        interest.nonce = Some(1234);
        interest.set_must_be_fresh(true);
        assert_eq!(interest.nonce, None);
    }

    #[test]
    fn interest_default_lifetime_is_4000ms() {
        let interest = Interest::new(Name::from_string("/a"));
        assert_eq!(interest.effective_lifetime_ms(), DEFAULT_INTEREST_LIFETIME_MS);
    }

    #[test]
    fn interest_wire_round_trip() {
        let mut interest = Interest::new(Name::from_string("/a/b"));
        interest.set_must_be_fresh(true);
        interest.set_child_selector(Some(1));
        interest.set_lifetime_ms(1500);
        let encoded = interest.encode(42).unwrap();
        assert!(encoded.len() <= MAX_NDN_PACKET_SIZE);
        let decoded = Interest::decode(&encoded).unwrap();
        assert_eq!(decoded.name, interest.name);
        assert_eq!(decoded.must_be_fresh, true);
        assert_eq!(decoded.child_selector, Some(1));
        assert_eq!(decoded.interest_lifetime_ms, Some(1500));
        assert_eq!(decoded.nonce, Some(42));
    }

    #[test]
    fn data_wire_round_trip_and_final_segment() {
        let name = Name::from_string("/x/v=1").with_appended(NameComponent::segment(2));
        let data = Data::new(name.clone(), Bytes::from_static(b"hello"))
            .with_final_block_id(NameComponent::segment(2));
        assert!(data.is_final_segment());

        let encoded = data.encode().unwrap();
        let decoded = Data::decode(&encoded).unwrap();
        assert_eq!(decoded.name, name);
        assert_eq!(decoded.content, Bytes::from_static(b"hello"));
        assert!(decoded.is_final_segment());
    }

    #[test]
    fn control_response_decode() {
        let mut buf = BytesMut::new();
        let mut inner = BytesMut::new();
        tlv::encode_nonneg_integer_tlv(tlv::TLV_STATUS_CODE, 200, &mut inner);
        TlvElement::new(tlv::TLV_STATUS_TEXT, Bytes::from_static(b"OK")).encode(&mut inner);
        TlvElement::new(tlv::TLV_CONTROL_RESPONSE, inner.freeze()).encode(&mut buf);

        let resp = ControlResponse::decode(&buf).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.status_text, "OK");
    }
}
