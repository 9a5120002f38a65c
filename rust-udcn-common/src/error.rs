//! Error types for rust-udcn's wire-format layer.

use thiserror::Error;

/// All possible errors that can occur while encoding or decoding NDN packets.
#[derive(Error, Debug)]
pub enum Error {
    /// Error related to TLV encoding/decoding.
    #[error("TLV error: {0}")]
    Tlv(String),

    /// Error related to NDN packet processing.
    #[error("NDN packet error: {0}")]
    NdnPacket(String),

    /// Element exceeds the maximum NDN packet size (8800 bytes).
    #[error("element of {0} bytes exceeds the maximum NDN packet size")]
    TooLarge(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(String),
}
