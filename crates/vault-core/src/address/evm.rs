//! EVM encoder — chain-agnostic by construction (§4.F). The same routine
//! serves Ethereum, Polygon, BNB Smart Chain, Avalanche C-Chain, Arbitrum
//! One, Optimism, Base and Cronos EVM: the address format never varies by
//! chain ID, only the path's `coin_type` (always `60'`) and the label do.

use crate::error::{Error, Result};
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{AffinePoint, EncodedPoint};
use tiny_keccak::{Hasher, Keccak};

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

fn uncompressed_xy(public_key: &[u8]) -> Result<[u8; 64]> {
    let encoded = EncodedPoint::from_bytes(public_key)
        .map_err(|e| Error::DerivationInvalid(format!("invalid secp256k1 public key: {e}")))?;
    let affine: AffinePoint = Option::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| Error::DerivationInvalid("secp256k1 public key is not on curve".into()))?;
    let uncompressed = affine.to_encoded_point(false);
    let bytes = uncompressed.as_bytes(); // 0x04 || X(32) || Y(32)
    bytes[1..].try_into().map_err(|_| {
        Error::DerivationInvalid("unexpected uncompressed point length".into())
    })
}

/// EIP-55 mixed-case checksum of a 40-hex-character lowercase address body
/// (no `0x` prefix).
fn eip55_checksum(lower_hex: &str) -> String {
    let hash = keccak256(lower_hex.as_bytes());
    let mut out = String::with_capacity(40);
    for (i, c) in lower_hex.chars().enumerate() {
        if c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// "0x" ‖ last 20 bytes of Keccak256(uncompressed_pub[1:]), EIP-55 checksum.
pub fn address(public_key: &[u8]) -> Result<String> {
    let xy = uncompressed_xy(public_key)?;
    let hash = keccak256(&xy);
    let tail = &hash[12..];
    let lower_hex = hex::encode(tail);
    Ok(format!("0x{}", eip55_checksum(&lower_hex)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pubkey() -> [u8; 33] {
        // A valid compressed point: 2 * G on secp256k1.
        let scalar = k256::Scalar::from(2u64);
        let point = k256::ProjectivePoint::GENERATOR * scalar;
        let mut out = [0u8; 33];
        out.copy_from_slice(point.to_affine().to_encoded_point(true).as_bytes());
        out
    }

    #[test]
    fn address_has_0x_prefix_and_is_stable() {
        let a = address(&sample_pubkey()).unwrap();
        let b = address(&sample_pubkey()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 42);
    }

    #[test]
    fn checksum_is_idempotent_on_recheck() {
        let addr = address(&sample_pubkey()).unwrap();
        let lower = addr.trim_start_matches("0x").to_ascii_lowercase();
        let rechecked = format!("0x{}", eip55_checksum(&lower));
        assert_eq!(addr, rechecked);
    }

    #[test]
    fn rejects_invalid_point() {
        let err = address(&[0u8; 33]).unwrap_err();
        assert!(matches!(err, Error::DerivationInvalid(_)));
    }
}
