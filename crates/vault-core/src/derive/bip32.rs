//! E. HD deriver — secp256k1 BIP32 (non-hardened + hardened)
//!
//! Generalizes the teacher's `derive_non_hardened` / `KeyShare::derive_child`
//! (`types.rs`) to also support hardened steps (requires the private scalar)
//! and public-only derivation (root-only mode, used by `list_addresses`).

use crate::error::{Error, Result};
use crate::types::ChildStep;
use elliptic_curve::bigint::U256;
use elliptic_curve::ops::Reduce;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::Field;
use hmac::{Hmac, Mac};
use k256::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// One node in a BIP32 derivation chain
#[derive(Clone)]
pub struct Node {
    pub public_key: ProjectivePoint,
    pub chain_code: [u8; 32],
    pub private_scalar: Option<Scalar>,
}

impl Node {
    pub fn from_public_key(public_key_bytes: &[u8], chain_code: [u8; 32]) -> Result<Self> {
        let encoded = EncodedPoint::from_bytes(public_key_bytes)
            .map_err(|e| Error::DerivationInvalid(format!("invalid secp256k1 public key: {e}")))?;
        let affine: AffinePoint = Option::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| Error::DerivationInvalid("secp256k1 public key is not on curve".into()))?;
        Ok(Self {
            public_key: ProjectivePoint::from(affine),
            chain_code,
            private_scalar: None,
        })
    }

    pub fn from_private_scalar(scalar: Scalar, chain_code: [u8; 32]) -> Self {
        Self {
            public_key: ProjectivePoint::GENERATOR * scalar,
            chain_code,
            private_scalar: Some(scalar),
        }
    }

    pub fn compressed_public_key(&self) -> [u8; 33] {
        let mut out = [0u8; 33];
        out.copy_from_slice(self.public_key.to_affine().to_encoded_point(true).as_bytes());
        out
    }
}

fn ser32(index: u32) -> [u8; 4] {
    index.to_be_bytes()
}

fn ser256(scalar: &Scalar) -> [u8; 32] {
    scalar.to_bytes().into()
}

fn scalar_from_bytes_checked(bytes: &[u8; 32]) -> Option<Scalar> {
    // Reject I_L >= n per BIP32: the caller must retry with the next index.
    // Comparing the scalar's canonical re-encoding against the input bytes
    // detects the reduction, since `reduce_bytes` never fails itself.
    let scalar = <Scalar as Reduce<U256>>::reduce_bytes(bytes.into());
    if ser256(&scalar).as_slice() == bytes.as_slice() {
        Some(scalar)
    } else {
        None
    }
}

const MAX_RETRIES: u32 = 16;

/// Derive one child step, automatically advancing through the (vanishingly
/// rare) invalid-I_L / point-at-infinity case the way BIP32 prescribes.
fn derive_child(parent: &Node, step: ChildStep) -> Result<Node> {
    if step.hardened && parent.private_scalar.is_none() {
        return Err(Error::DerivationInvalid("hardened-needs-private".into()));
    }

    let mut index = step.wire_index();
    for _ in 0..MAX_RETRIES {
        let mut mac = HmacSha512::new_from_slice(&parent.chain_code)
            .expect("HMAC accepts any key length");

        if step.hardened {
            mac.update(&[0x00]);
            mac.update(&ser256(parent.private_scalar.as_ref().unwrap()));
        } else {
            mac.update(&parent.compressed_public_key());
        }
        mac.update(&ser32(index));

        let result = mac.finalize().into_bytes();
        let il_bytes: [u8; 32] = result[..32].try_into().unwrap();
        let ir: [u8; 32] = result[32..].try_into().unwrap();

        let Some(il) = scalar_from_bytes_checked(&il_bytes) else {
            index = index.wrapping_add(1);
            continue;
        };

        let child_public = parent.public_key + ProjectivePoint::GENERATOR * il;
        if bool::from(elliptic_curve::group::Group::is_identity(&child_public)) {
            index = index.wrapping_add(1);
            continue;
        }

        let private_scalar = parent.private_scalar.map(|k| k + il);

        return Ok(Node {
            public_key: child_public,
            chain_code: ir,
            private_scalar,
        });
    }

    Err(Error::DerivationInvalid(
        "exhausted retries for invalid I_L / point at infinity".into(),
    ))
}

/// Derive along a full path from a root node.
pub fn derive_path(root: &Node, path: &[ChildStep]) -> Result<Node> {
    let mut current = root.clone();
    for step in path {
        current = derive_child(&current, *step)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChildStep;

    fn root_with_private() -> Node {
        let scalar = Scalar::from(424242u64);
        Node::from_private_scalar(scalar, [7u8; 32])
    }

    #[test]
    fn public_and_private_derivation_agree_on_non_hardened_path() {
        let private_root = root_with_private();
        let public_root =
            Node::from_public_key(&private_root.compressed_public_key(), private_root.chain_code)
                .unwrap();

        let path = [ChildStep::normal(0), ChildStep::normal(5)];
        let private_derived = derive_path(&private_root, &path).unwrap();
        let public_derived = derive_path(&public_root, &path).unwrap();

        assert_eq!(
            private_derived.compressed_public_key(),
            public_derived.compressed_public_key()
        );
    }

    #[test]
    fn hardened_step_requires_private_scalar() {
        let private_root = root_with_private();
        let public_root =
            Node::from_public_key(&private_root.compressed_public_key(), private_root.chain_code)
                .unwrap();

        let path = [ChildStep::hardened(0)];
        let err = derive_path(&public_root, &path).unwrap_err();
        assert!(matches!(err, Error::DerivationInvalid(_)));

        // but succeeds from the private root
        assert!(derive_path(&private_root, &path).is_ok());
    }

    #[test]
    fn full_bip44_style_path_derives_deterministically() {
        let root = root_with_private();
        let path = [
            ChildStep::hardened(44),
            ChildStep::hardened(60),
            ChildStep::hardened(0),
            ChildStep::normal(0),
            ChildStep::normal(0),
        ];
        let a = derive_path(&root, &path).unwrap();
        let b = derive_path(&root, &path).unwrap();
        assert_eq!(a.compressed_public_key(), b.compressed_public_key());
        assert_eq!(a.private_scalar.unwrap(), b.private_scalar.unwrap());
    }
}
