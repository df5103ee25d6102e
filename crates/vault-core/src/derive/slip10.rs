//! E. HD deriver — ed25519 SLIP-0010, hardened-only.
//!
//! The teacher has no ed25519 derivation at all; this is built the same
//! shape as the secp256k1 side in `bip32.rs` (HMAC-SHA512 over the parent
//! chain code, split into two 32-byte halves) but unlike BIP32, SLIP-0010
//! is not homomorphic: the child key is assigned directly from `I_L`
//! rather than added to the parent. Hardened-only, since ed25519 has no
//! non-hardened derivation mode.

use crate::error::{Error, Result};
use crate::types::ChildStep;
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

#[derive(Clone)]
pub struct Node {
    pub scalar: Scalar,
    pub chain_code: [u8; 32],
}

impl Node {
    pub fn from_scalar(scalar: Scalar, chain_code: [u8; 32]) -> Self {
        Self { scalar, chain_code }
    }

    pub fn public_key(&self) -> [u8; 32] {
        (&self.scalar * &ED25519_BASEPOINT_TABLE).compress().to_bytes()
    }
}

fn be_bytes(scalar: &Scalar) -> [u8; 32] {
    let mut le = scalar.to_bytes();
    le.reverse();
    le
}

fn scalar_from_be(bytes: &[u8]) -> Scalar {
    let mut le: [u8; 32] = bytes.try_into().expect("32 bytes");
    le.reverse();
    Scalar::from_bytes_mod_order(le)
}

fn ser32(index: u32) -> [u8; 4] {
    index.to_be_bytes()
}

fn derive_child(parent: &Node, step: ChildStep) -> Result<Node> {
    if !step.hardened {
        return Err(Error::DerivationInvalid(
            "ed25519 (SLIP-0010) supports hardened derivation only".into(),
        ));
    }

    let mut mac =
        HmacSha512::new_from_slice(&parent.chain_code).expect("HMAC accepts any key length");
    mac.update(&[0x00]);
    mac.update(&be_bytes(&parent.scalar));
    mac.update(&ser32(step.wire_index()));
    let result = mac.finalize().into_bytes();

    // SLIP-0010 assigns the child key directly from I_L (unlike BIP32's
    // additive tweak, ed25519 derivation is not homomorphic): child key =
    // I_L, child chain code = I_R. I_L is reduced into the scalar field so
    // the result can drive further HMAC steps and public-key computation.
    let child_scalar = scalar_from_be(&result[..32]);
    let chain_code: [u8; 32] = result[32..].try_into().unwrap();

    if child_scalar == Scalar::ZERO {
        return Err(Error::DerivationInvalid(
            "derived ed25519 scalar is zero".into(),
        ));
    }

    Ok(Node {
        scalar: child_scalar,
        chain_code,
    })
}

/// Derive along a full hardened-only path. `root` must carry the
/// reconstructed private scalar; ed25519 has no public-only derivation mode.
pub fn derive_path(root: &Node, path: &[ChildStep]) -> Result<Node> {
    let mut current = root.clone();
    for step in path {
        current = derive_child(&current, *step)?;
    }
    Ok(current)
}
