use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Bridge Bind Error: {address}: {source} {location}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Bridge Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    /// The host refused the `Hello` token. Surface-side only.
    #[error("Bridge Handshake Refused Error: {message} {location}")]
    HandshakeRefused {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    /// The privileged side rejected the operation; `message` is its
    /// human-readable account of why.
    #[error("Bridge Rejected Error: {message} {location}")]
    Rejected {
        message: String,
        location: ErrorLocation,
    },

    /// Both sides disagree about the contract (unknown channel, mismatched
    /// reply shape, repeated handshake). Programmer error, fails fast.
    #[error("Bridge Contract Violation Error: {message} {location}")]
    ContractViolation {
        message: String,
        location: ErrorLocation,
    },

    #[error("Bridge Connection Closed Error {location}")]
    ConnectionClosed { location: ErrorLocation },
}
