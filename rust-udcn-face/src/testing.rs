//! Test doubles for the external collaborators spec.md treats as
//! assumed-available: a signing keychain.

use crate::command::Keychain;
use crate::error::Result;
use async_trait::async_trait;
use rust_udcn_common::ndn::{Name, NameComponent};

/// A keychain that "signs" by hashing the name with a fixed key, good
/// enough to exercise C4/C5 without a real cryptographic backend.
pub struct InMemoryKeychain;

impl InMemoryKeychain {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InMemoryKeychain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keychain for InMemoryKeychain {
    async fn sign(&self, name: &Name, cert_name: &str) -> Result<(NameComponent, NameComponent)> {
        let mut info = cert_name.as_bytes().to_vec();
        info.push(0);
        info.extend_from_slice(&(name.len() as u32).to_be_bytes());

        let mut hash: u64 = 0xcbf29ce484222325;
        for component in name.components() {
            for &byte in component.as_bytes().iter() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
        }

        Ok((
            NameComponent::new(info),
            NameComponent::new(hash.to_be_bytes().to_vec()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signs_deterministically_for_same_name() {
        let keychain = InMemoryKeychain::new();
        let name = Name::from_string("/a/b/c");
        let (info1, value1) = keychain.sign(&name, "/id").await.unwrap();
        let (info2, value2) = keychain.sign(&name, "/id").await.unwrap();
        assert_eq!(info1, info2);
        assert_eq!(value1, value2);
    }
}
