#![warn(rust_2018_idioms)]

// re-export sub-crates
pub use sdp;

pub mod api;
pub mod dtls_transport;
pub mod error;
pub mod ice_transport;
pub mod media_stream;
pub mod peer_connection;
pub mod rtp_transceiver;
pub mod transport;

pub use error::Error;

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";
