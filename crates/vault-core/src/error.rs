//! Error types for vault parsing, decryption and reconstruction

use thiserror::Error;

/// Result type alias for vault-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while inspecting, decrypting or reconstructing a vault
#[derive(Debug, Error)]
pub enum Error {
    /// Base64 decode, outer record parse, or inner message parse failed
    #[error("container malformed: {0}")]
    ContainerMalformed(String),

    /// AES-GCM auth tag mismatch, or encrypted file with no password supplied
    #[error("bad password or corrupt container")]
    BadPassword,

    /// Keyshare blob cannot be decoded, missing required fields
    #[error("keyshare malformed: {0}")]
    ShareMalformed(String),

    /// Multiple shares disagree on aggregated public key, curve, or signer set
    #[error("shares inconsistent: {0}")]
    ShareInconsistent(String),

    /// Fewer shares than threshold, or threshold out of range
    #[error("threshold not met: required {required}, got {actual}")]
    ThresholdUnmet { required: usize, actual: usize },

    /// d*G != Y after Lagrange interpolation
    #[error("reconstruction mismatch: recovered scalar does not reproduce the aggregated public key")]
    ReconstructionMismatch,

    /// Malformed path string, hardened step on public-only ed25519 input,
    /// or BIP32 overflow the caller must retry with the next index
    #[error("derivation invalid: {0}")]
    DerivationInvalid(String),

    /// Chain tag not in the closed set
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    /// Underlying file read/write failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
