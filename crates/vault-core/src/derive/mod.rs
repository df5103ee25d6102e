//! E. HD deriver (§4.E) — dispatches a derivation by curve to the
//! secp256k1 BIP32 walker or the ed25519 SLIP-0010 walker.

pub mod bip32;
pub mod slip10;

use crate::error::{Error, Result};
use crate::types::{ChildStep, Curve};
use elliptic_curve::bigint::U256;
use elliptic_curve::ops::Reduce;
use k256::Scalar as K256Scalar;

/// Output of walking a path: a child public key, and the child private
/// scalar when the walk started from a reconstructed private key.
pub struct DerivedNode {
    pub public_key_bytes: Vec<u8>,
    pub private_scalar_bytes: Option<Vec<u8>>,
}

fn secp256k1_scalar_from_be(bytes: &[u8]) -> Result<K256Scalar> {
    if bytes.len() != 32 {
        return Err(Error::DerivationInvalid(
            "secp256k1 scalar must be 32 bytes".into(),
        ));
    }
    let array: [u8; 32] = bytes.try_into().unwrap();
    Ok(<K256Scalar as Reduce<U256>>::reduce_bytes((&array).into()))
}

fn ed25519_scalar_from_be(bytes: &[u8]) -> Result<curve25519_dalek::scalar::Scalar> {
    if bytes.len() != 32 {
        return Err(Error::DerivationInvalid(
            "ed25519 scalar must be 32 bytes".into(),
        ));
    }
    let mut le: [u8; 32] = bytes.try_into().unwrap();
    le.reverse();
    Ok(curve25519_dalek::scalar::Scalar::from_bytes_mod_order(le))
}

/// Parse a `m/44'/60'/0'/0/0`-style path string into the tool's own
/// hardened/non-hardened step list. Grounded in the teacher's
/// `KeyShare::derive_child`, which parses the same way via the
/// `derivation_path` crate and matches on `ChildIndex::{Normal,Hardened}`.
pub fn parse_path(path: &str) -> Result<Vec<ChildStep>> {
    use derivation_path::{ChildIndex, DerivationPath};

    let parsed: DerivationPath = path
        .parse()
        .map_err(|e| Error::DerivationInvalid(format!("invalid derivation path: {e}")))?;

    Ok(parsed
        .into_iter()
        .map(|child| match child {
            ChildIndex::Normal(idx) => ChildStep::normal(*idx),
            ChildIndex::Hardened(idx) => ChildStep::hardened(*idx),
        })
        .collect())
}

/// Walk `path` from a root described by its public key, chain code, and
/// (when available) the reconstructed private scalar. `curve` selects BIP32
/// (secp256k1) or SLIP-0010 (ed25519); ed25519 requires a private scalar
/// since it has no public-only derivation mode (§4.E / §4.G item 2).
pub fn derive(
    curve: Curve,
    root_public_key: &[u8],
    root_chain_code: [u8; 32],
    root_private_scalar: Option<&[u8]>,
    path: &[ChildStep],
) -> Result<DerivedNode> {
    match curve {
        Curve::Secp256k1 => {
            let root = match root_private_scalar {
                Some(bytes) => {
                    let scalar = secp256k1_scalar_from_be(bytes)?;
                    bip32::Node::from_private_scalar(scalar, root_chain_code)
                }
                None => bip32::Node::from_public_key(root_public_key, root_chain_code)?,
            };
            let derived = bip32::derive_path(&root, path)?;
            Ok(DerivedNode {
                public_key_bytes: derived.compressed_public_key().to_vec(),
                private_scalar_bytes: derived
                    .private_scalar
                    .map(|s| -> Vec<u8> { s.to_bytes().to_vec() }),
            })
        }
        Curve::Ed25519 => {
            let scalar_bytes = root_private_scalar.ok_or_else(|| {
                Error::DerivationInvalid(
                    "ed25519 (SLIP-0010) has no public-only derivation mode".into(),
                )
            })?;
            let scalar = ed25519_scalar_from_be(scalar_bytes)?;
            let root = slip10::Node::from_scalar(scalar, root_chain_code);
            let derived = slip10::derive_path(&root, path)?;
            let mut be = derived.scalar.to_bytes();
            be.reverse();
            Ok(DerivedNode {
                public_key_bytes: derived.public_key().to_vec(),
                private_scalar_bytes: Some(be.to_vec()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChildStep;

    #[test]
    fn secp256k1_root_only_public_derivation_has_no_private_scalar() {
        let scalar = K256Scalar::from(12345u64);
        let root = bip32::Node::from_private_scalar(scalar, [1u8; 32]);
        let public_bytes = root.compressed_public_key();

        let node = derive(
            Curve::Secp256k1,
            &public_bytes,
            [1u8; 32],
            None,
            &[ChildStep::normal(0)],
        )
        .unwrap();
        assert!(node.private_scalar_bytes.is_none());
    }

    #[test]
    fn parse_path_splits_hardened_and_normal_steps() {
        let steps = parse_path("m/44'/60'/0'/0/0").unwrap();
        assert_eq!(
            steps,
            vec![
                ChildStep::hardened(44),
                ChildStep::hardened(60),
                ChildStep::hardened(0),
                ChildStep::normal(0),
                ChildStep::normal(0),
            ]
        );
    }

    #[test]
    fn parse_path_rejects_garbage() {
        assert!(parse_path("not a path").is_err());
    }

    #[test]
    fn ed25519_without_private_scalar_is_rejected() {
        let err = derive(
            Curve::Ed25519,
            &[0u8; 32],
            [1u8; 32],
            None,
            &[ChildStep::hardened(0)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DerivationInvalid(_)));
    }
}
