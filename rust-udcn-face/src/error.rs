//! Error kinds surfaced by the face, registrar and fetchers.

use thiserror::Error;

/// Why a prefix registration failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationFailure {
    StatusCode(u32),
    DecodeError(String),
    Timeout,
}

impl std::fmt::Display for RegistrationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusCode(code) => write!(f, "forwarder returned status {}", code),
            Self::DecodeError(msg) => write!(f, "could not decode ControlResponse: {}", msg),
            Self::Timeout => write!(f, "registration command Interest timed out"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FaceError {
    /// The Face is closed or the transport has not connected yet.
    #[error("face is not connected")]
    NotConnected,

    /// A command Interest was attempted before a keychain and signing
    /// certificate were configured.
    #[error("command signing is not configured")]
    NotConfigured,

    /// An encoded Interest or Data exceeded the 8800-byte packet ceiling.
    #[error("encoded packet of {0} bytes exceeds the maximum NDN packet size")]
    EncodedTooLarge(usize),

    /// An inbound TLV element could not be parsed, or exceeded the size ceiling.
    #[error("malformed TLV element: {0}")]
    MalformedElement(String),

    /// A pending Interest's lifetime elapsed with no matching Data.
    #[error("interest timed out")]
    InterestTimeout,

    /// The caller-supplied verifier rejected an inbound segment.
    #[error("segment verification failed")]
    SegmentVerificationFailed,

    /// The last name component of a Data packet was not a segment number.
    #[error("data packet name has no segment component")]
    DataHasNoSegment,

    /// Prefix registration did not succeed.
    #[error("prefix registration failed: {0}")]
    RegistrationFailed(RegistrationFailure),

    /// The underlying transport reported an I/O error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Every candidate host was tried and none could be reached.
    #[error("no candidate host could be reached")]
    HostExhausted,
}

pub type Result<T> = std::result::Result<T, FaceError>;
