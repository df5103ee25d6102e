//! Cryptographic core for parsing, decrypting and reconstructing
//! threshold-signature vault files.
//!
//! Data flow for recovery: vault file -> [`container`] -> [`payload`] ->
//! ([`share`] per curve) -> [`reconstruct`] -> root private scalar ->
//! [`derive`] -> per-path private key -> [`address`] -> per-chain address.
//! For read-only address listing, [`orchestrator::list_addresses`]
//! shortcuts straight from the vault's stored public key to [`derive`] and
//! [`address`].

pub mod address;
pub mod container;
pub mod derive;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod reconstruct;
pub mod share;
pub mod types;
mod wire;

pub use error::{Error, Result};
pub use types::{
    ChildStep, Curve, DerivedKey, KeyShareRecord, LibType, RawShare, ReconstructedScalar,
    VaultRecord,
};
