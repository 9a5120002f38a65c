//! Client-side NDN face: transport framing, the Face actor and its PIT/
//! filter/registered-prefix tables, command-Interest signing, prefix
//! registration, and segment fetchers built on top of `Face`.

pub mod command;
pub mod error;
pub mod face;
pub mod fetcher;
pub mod pipeline;
pub mod reader;
pub mod registrar;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::{CommandInterestGenerator, Keychain};
pub use error::{FaceError, RegistrationFailure, Result};
pub use face::{Face, OnData, OnInterest, OnRegisterFailed, OnRegisterSuccess, OnTimeout};
pub use fetcher::SegmentFetcher;
pub use pipeline::{fast_retransmit_window, grow_window, PipelinedFetcher};
pub use reader::ElementReader;
pub use transport::ConnectionInfo;
