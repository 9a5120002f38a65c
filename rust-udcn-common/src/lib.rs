//! Common wire types and utilities for the micro Data-Centric Networking (μDCN)
//! client stack.
//!
//! This crate provides the NDN packet model, TLV codec, error types, shared
//! identifiers, and metrics primitives used by `rust-udcn-face` and
//! `rust-udcn-cli`.

pub mod ndn;
pub mod tlv;
pub mod metrics;
pub mod types;
pub mod error;

/// Reexport of common types
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
