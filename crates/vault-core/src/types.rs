//! Core data model for vault records, keyshares and derived keys

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Which threshold-signature family produced a vault's keyshares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibType {
    /// GG20-family threshold ECDSA
    #[serde(rename = "GG20")]
    Gg20,
    /// DKLS-family threshold ECDSA
    #[serde(rename = "DKLS")]
    Dkls,
}

/// Which curve a keyshare or derivation path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// secp256k1 (ECDSA, GG20/DKLS)
    Secp256k1,
    /// ed25519 (EdDSA, Schnorr-based)
    Ed25519,
}

/// One key-share record embedded in a vault (§3 "key_shares")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyShareRecord {
    /// Public key this share belongs to (hex, curve-dependent length)
    pub public_key: String,
    /// Opaque per-curve keyshare blob (JSON text for GG20, binary for DKLS)
    pub keyshare_blob: String,
}

/// A fully parsed vault record (§3 "Vault record")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRecord {
    pub name: String,
    pub local_party_id: String,
    /// 33-byte compressed secp256k1 point, hex, lowercased
    pub public_key_ecdsa: String,
    /// 32-byte ed25519 point, hex, lowercased
    pub public_key_eddsa: String,
    /// 32-byte chain code, hex, lowercased
    pub hex_chain_code: String,
    pub signers: Vec<String>,
    pub created_at: String,
    pub lib_type: LibType,
    pub is_encrypted: bool,
    pub key_shares: Vec<KeyShareRecord>,
}

impl VaultRecord {
    /// Decoded 32-byte chain code
    pub fn chain_code_bytes(&self) -> crate::Result<[u8; 32]> {
        let bytes = hex::decode(&self.hex_chain_code)
            .map_err(|e| crate::Error::ContainerMalformed(format!("chain code hex: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| crate::Error::ContainerMalformed("chain code must be 32 bytes".into()))
    }

    /// Decoded 33-byte compressed secp256k1 public key
    pub fn ecdsa_public_key_bytes(&self) -> crate::Result<[u8; 33]> {
        let bytes = hex::decode(&self.public_key_ecdsa)
            .map_err(|e| crate::Error::ContainerMalformed(format!("ecdsa public key hex: {e}")))?;
        bytes.try_into().map_err(|_| {
            crate::Error::ContainerMalformed("ecdsa public key must be 33 bytes".into())
        })
    }

    /// Decoded 32-byte ed25519 public key
    pub fn eddsa_public_key_bytes(&self) -> crate::Result<[u8; 32]> {
        let bytes = hex::decode(&self.public_key_eddsa)
            .map_err(|e| crate::Error::ContainerMalformed(format!("eddsa public key hex: {e}")))?;
        bytes.try_into().map_err(|_| {
            crate::Error::ContainerMalformed("eddsa public key must be 32 bytes".into())
        })
    }
}

/// Abstract (x_i, id_i, Y) triple produced by the share decoder (§4.C),
/// generic over the curve it was decoded for.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RawShare {
    /// Shamir index, big-endian bytes, non-zero
    #[zeroize(skip)]
    pub id: Vec<u8>,
    /// Local scalar share x_i, big-endian bytes
    pub scalar: Vec<u8>,
    /// Aggregated public point Y, encoded bytes (33 bytes secp256k1, 32 bytes ed25519)
    #[zeroize(skip)]
    pub public_point: Vec<u8>,
}

/// One derivation step: a child index plus whether it is hardened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildStep {
    pub index: u32,
    pub hardened: bool,
}

impl ChildStep {
    pub fn normal(index: u32) -> Self {
        Self {
            index,
            hardened: false,
        }
    }

    pub fn hardened(index: u32) -> Self {
        Self {
            index,
            hardened: true,
        }
    }

    /// The raw wire index: hardened indices have the top bit set
    pub fn wire_index(&self) -> u32 {
        if self.hardened {
            self.index | 0x8000_0000
        } else {
            self.index
        }
    }
}

/// The scalar recovered by threshold reconstruction (§4.D), zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ReconstructedScalar {
    pub curve: Curve,
    pub bytes: Vec<u8>,
}

/// A derived key, ready to be rendered into an address (§3 "Derived key")
pub struct DerivedKey {
    pub chain: crate::address::ChainTag,
    pub path: String,
    pub public_key_bytes: Vec<u8>,
    pub private_scalar: Option<Vec<u8>>,
    pub address: String,
    /// WIF / base58 / hex encoding of the private key, when present
    pub private_key_encoded: Option<String>,
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        if let Some(scalar) = self.private_scalar.as_mut() {
            scalar.zeroize();
        }
        if let Some(enc) = self.private_key_encoded.as_mut() {
            enc.zeroize();
        }
    }
}
