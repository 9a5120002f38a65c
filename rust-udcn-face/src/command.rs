//! Builds signed command Interests for the NFD control protocol.
//!
//! Given an Interest, appends a strictly-increasing millisecond timestamp
//! and a random nonce, then asks a keychain to append SignatureInfo and
//! SignatureValue. The monotone-timestamp property is a replay-protection
//! invariant and must hold across every Interest a single generator emits.

use crate::error::Result;
use async_trait::async_trait;
use rust_udcn_common::ndn::{Interest, Name, NameComponent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// The signing contract assumed available per the wire-format boundary:
/// given a name to sign and the certificate identity to sign under,
/// produces the SignatureInfo and SignatureValue name components to
/// append, in that order.
#[async_trait]
pub trait Keychain: Send + Sync {
    async fn sign(&self, name: &Name, cert_name: &str) -> Result<(NameComponent, NameComponent)>;
}

pub struct CommandInterestGenerator {
    last_timestamp_ms: AtomicU64,
}

impl CommandInterestGenerator {
    pub fn new() -> Self {
        Self {
            last_timestamp_ms: AtomicU64::new(0),
        }
    }

    /// Produces a timestamp strictly greater than the last one this
    /// generator emitted, bumping by 1ms if the wall clock hasn't advanced.
    fn next_timestamp_ms(&self) -> u64 {
        loop {
            let prev = self.last_timestamp_ms.load(Ordering::SeqCst);
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;
            let next = if now > prev { now } else { prev + 1 };
            if self
                .last_timestamp_ms
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }

    /// Appends Timestamp, Nonce, SignatureInfo and SignatureValue to
    /// `interest`'s name and returns the signed command Interest.
    pub async fn make_command_interest(
        &self,
        mut interest: Interest,
        keychain: &dyn Keychain,
        cert_name: &str,
    ) -> Result<Interest> {
        let timestamp = self.next_timestamp_ms();
        let nonce: u64 = rand::random();

        let unsigned_name = interest
            .name
            .with_appended(NameComponent::new(timestamp.to_be_bytes().to_vec()))
            .with_appended(NameComponent::new(nonce.to_be_bytes().to_vec()));

        let (sig_info, sig_value) = keychain.sign(&unsigned_name, cert_name).await?;

        let signed_name = unsigned_name.with_appended(sig_info).with_appended(sig_value);
        interest.set_name(signed_name);
        Ok(interest)
    }
}

impl Default for CommandInterestGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryKeychain;

    #[tokio::test]
    async fn appends_exactly_four_trailing_components() {
        let generator = CommandInterestGenerator::new();
        let keychain = InMemoryKeychain::new();
        let base = Interest::new(Name::from_string("/localhost/nfd/rib/register"));
        let before_len = base.name.len();

        let signed = generator
            .make_command_interest(base, &keychain, "/test/identity")
            .await
            .unwrap();

        assert_eq!(signed.name.len(), before_len + 4);
    }

    #[tokio::test]
    async fn timestamps_are_strictly_monotonic() {
        let generator = CommandInterestGenerator::new();
        let keychain = InMemoryKeychain::new();

        let mut timestamps = Vec::new();
        for _ in 0..20 {
            let signed = generator
                .make_command_interest(
                    Interest::new(Name::from_string("/a")),
                    &keychain,
                    "/test/identity",
                )
                .await
                .unwrap();
            let ts_component = signed.name.get(-4).unwrap();
            let ts = u64::from_be_bytes(ts_component.as_bytes()[..8].try_into().unwrap());
            timestamps.push(ts);
        }

        for window in timestamps.windows(2) {
            assert!(window[1] > window[0]);
        }
    }
}
