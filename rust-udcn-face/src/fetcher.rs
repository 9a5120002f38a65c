//! Segment fetcher (C6): downloads every segment of an object whose
//! version is not known in advance.
//!
//! Built entirely on top of `Face::express_interest_with` — it owns no
//! transport or PIT state of its own, only the discover/verify/advance
//! state machine described in spec.md section 4.6.

use crate::error::{FaceError, Result};
use crate::face::Face;
use bytes::{Bytes, BytesMut};
use rust_udcn_common::ndn::{Data, Interest, Name, NameComponent};
use std::sync::Arc;

/// User-supplied content verifier; returning `false` aborts the fetch
/// with `SegmentVerificationFailed`.
pub type VerifySegment = Arc<dyn Fn(&Data) -> bool + Send + Sync>;

pub struct SegmentFetcher {
    face: Face,
    verify: VerifySegment,
}

impl SegmentFetcher {
    pub fn new(face: Face, verify: VerifySegment) -> Self {
        Self { face, verify }
    }

    /// Fetches every segment of the object under `prefix` and returns the
    /// concatenated content once the final segment arrives.
    pub async fn fetch(&self, prefix: Name) -> Result<Bytes> {
        let mut discover = Interest::new(prefix.clone());
        discover.set_child_selector(Some(1));
        discover.set_must_be_fresh(true);

        let first = self.face.express_interest(discover.clone()).await?;
        self.verify_or_abort(&first)?;

        let version = self.extract_version(&first)?;
        let base = prefix.with_appended(version.clone());

        let mut assembled = BytesMut::new();
        let mut expected: u64 = 0;
        let mut current = first;
        let mut base_interest = discover;

        loop {
            let segment = current
                .name
                .get(-1)
                .and_then(NameComponent::as_segment)
                .ok_or(FaceError::DataHasNoSegment)?;

            if segment != expected {
                // Either version-discovery landed on a non-zero segment, or
                // a prior request left a gap; re-request the exact segment
                // we need and discard what we just received.
                self.face.metrics().segment_retransmits.increment();
                current = self
                    .request_segment(&base_interest, &base, expected)
                    .await?;
                self.verify_or_abort(&current)?;
                continue;
            }

            assembled.extend_from_slice(&current.content);
            self.face.metrics().segments_fetched.increment();

            let is_final = current
                .meta_info
                .final_block_id
                .as_ref()
                .map(|fbi| fbi == current.name.get(-1).unwrap())
                .unwrap_or(false);

            if is_final {
                return Ok(assembled.freeze());
            }

            expected += 1;
            current = self
                .request_segment(&base_interest, &base, expected)
                .await?;
            self.verify_or_abort(&current)?;
            base_interest.set_must_be_fresh(false);
        }
    }

    fn verify_or_abort(&self, data: &Data) -> Result<()> {
        if (self.verify)(data) {
            Ok(())
        } else {
            Err(FaceError::SegmentVerificationFailed)
        }
    }

    fn extract_version(&self, first: &Data) -> Result<NameComponent> {
        first
            .name
            .get(-2)
            .cloned()
            .ok_or(FaceError::DataHasNoSegment)
    }

    /// Builds the next segment's Interest by copying the original (to
    /// preserve selectors) and clearing MustBeFresh; the nonce regenerates
    /// because `set_name` always invalidates it.
    async fn request_segment(
        &self,
        template: &Interest,
        base: &Name,
        segment: u64,
    ) -> Result<Data> {
        let mut interest = template.clone();
        interest.set_must_be_fresh(false);
        interest.set_name(base.with_appended(NameComponent::segment(segment)));
        self.face.express_interest(interest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectionInfo;
    use rust_udcn_common::ndn::MetaInfo;
    use std::sync::Mutex;

    fn always_verifies() -> VerifySegment {
        Arc::new(|_| true)
    }

    #[test]
    fn extract_version_reads_second_to_last_component() {
        let face = Face::spawn(ConnectionInfo::Unix("/nonexistent.sock".into()));
        let fetcher = SegmentFetcher::new(face, always_verifies());
        let name = Name::from_string("/a/v=3").with_appended(NameComponent::segment(0));
        let data = Data::new(name, Bytes::new());
        let version = fetcher.extract_version(&data).unwrap();
        assert_eq!(version.to_string(), "v=3");
    }

    #[tokio::test]
    async fn verify_failure_is_reported_as_segment_verification_failed() {
        let face = Face::spawn(ConnectionInfo::Unix("/nonexistent.sock".into()));
        let rejects: VerifySegment = Arc::new(|_| false);
        let fetcher = SegmentFetcher::new(face, rejects);
        let name = Name::from_string("/a/v=1").with_appended(NameComponent::segment(0));
        let data = Data::new(name, Bytes::from_static(b"x")).with_final_block_id(NameComponent::segment(0));
        let err = fetcher.verify_or_abort(&data).unwrap_err();
        assert!(matches!(err, FaceError::SegmentVerificationFailed));
    }

    #[test]
    fn non_segment_last_component_is_data_has_no_segment() {
        let seen = Mutex::new(Vec::<MetaInfo>::new());
        let _ = seen;
        let comp = NameComponent::new(b"not-a-segment".to_vec());
        assert_eq!(comp.as_segment(), None);
    }
}
