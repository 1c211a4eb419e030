use crate::H256;

/// Error types for the bridge protocol primitives.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Input is too short to contain the fixed message header
    #[error("Malformed message: {actual} bytes, header requires {expected}")]
    MalformedMessage {
        /// Length of the undersized input
        actual: usize,
        /// Minimum length of a valid encoding
        expected: usize,
    },
    /// A signature could not be recovered to a signer address
    #[error("Invalid signature over digest {digest:?}")]
    InvalidSignature {
        /// The digest the signature was checked against
        digest: H256,
    },
    /// A private key was rejected by the signing backend
    #[error("Invalid signing key")]
    InvalidKey,
    /// IO error from Read/Write usage
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
