//! Builds the command Interest used to register or unregister a prefix
//! with the forwarder's RIB via its control protocol.
//!
//! The actual send/sign/await-response orchestration lives in `Face`,
//! since it mutates Face-owned tables (the registered-prefix table and
//! the interest-filter table) on success; this module only knows how to
//! turn a prefix into the right command-Interest shape.

use rust_udcn_common::ndn::{ControlParameters, Interest, Name};
use rust_udcn_common::tlv::TLV_CONTROL_PARAMETERS;

const LOCAL_REGISTER_PREFIX: &str = "/localhost/nfd/rib/register";
const REMOTE_REGISTER_PREFIX: &str = "/localhop/nfd/rib/register";
const LOCAL_UNREGISTER_PREFIX: &str = "/localhost/nfd/rib/unregister";
const REMOTE_UNREGISTER_PREFIX: &str = "/localhop/nfd/rib/unregister";

const LOCAL_LIFETIME_MS: u32 = 2000;
const REMOTE_LIFETIME_MS: u32 = 4000;

/// Builds the unsigned command Interest that registers `prefix`. The
/// caller hands this to the command-Interest generator for signing.
pub fn build_registration_interest(prefix: &Name, is_local: bool) -> Interest {
    build_command_interest(
        prefix,
        is_local,
        LOCAL_REGISTER_PREFIX,
        REMOTE_REGISTER_PREFIX,
    )
}

/// Builds the unsigned command Interest that unregisters `prefix`.
pub fn build_unregistration_interest(prefix: &Name, is_local: bool) -> Interest {
    build_command_interest(
        prefix,
        is_local,
        LOCAL_UNREGISTER_PREFIX,
        REMOTE_UNREGISTER_PREFIX,
    )
}

fn build_command_interest(
    prefix: &Name,
    is_local: bool,
    local_prefix: &str,
    remote_prefix: &str,
) -> Interest {
    let command_prefix = if is_local { local_prefix } else { remote_prefix };
    let lifetime_ms = if is_local { LOCAL_LIFETIME_MS } else { REMOTE_LIFETIME_MS };

    let control_parameters = ControlParameters::new(prefix.clone());
    let encoded_parameters = control_parameters.encode();
    let parameters_component =
        rust_udcn_common::ndn::NameComponent::new(wrap_control_parameters(encoded_parameters));

    let mut name = Name::from_string(command_prefix);
    name.append(parameters_component);

    let mut interest = Interest::new(name);
    interest.set_lifetime_ms(lifetime_ms);
    interest
}

/// `ControlParameters::encode` already wraps its TLV type; this exists so
/// the name component carries exactly the encoded parameters TLV, matching
/// the `TLV_CONTROL_PARAMETERS`-typed nested-TLV convention documented in
/// spec.md section 6.
fn wrap_control_parameters(encoded: bytes::Bytes) -> Vec<u8> {
    debug_assert_eq!(encoded.first().copied(), Some(TLV_CONTROL_PARAMETERS));
    encoded.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_registration_uses_localhost_prefix_and_short_lifetime() {
        let prefix = Name::from_string("/app");
        let interest = build_registration_interest(&prefix, true);
        assert!(interest.name.to_string().starts_with(LOCAL_REGISTER_PREFIX));
        assert_eq!(interest.interest_lifetime_ms, Some(LOCAL_LIFETIME_MS));
    }

    #[test]
    fn remote_registration_uses_localhop_prefix_and_long_lifetime() {
        let prefix = Name::from_string("/app");
        let interest = build_registration_interest(&prefix, false);
        assert!(interest.name.to_string().starts_with(REMOTE_REGISTER_PREFIX));
        assert_eq!(interest.interest_lifetime_ms, Some(REMOTE_LIFETIME_MS));
    }

    #[test]
    fn unregistration_uses_the_sibling_command_prefix() {
        let prefix = Name::from_string("/app");
        let interest = build_unregistration_interest(&prefix, true);
        assert!(interest.name.to_string().starts_with(LOCAL_UNREGISTER_PREFIX));
    }
}
