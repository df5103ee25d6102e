//! Sui encoder — "0x" ‖ hex(Blake2b-256(0x00 ‖ pub_32)) (§4.F). The leading
//! 0x00 flag byte marks an ed25519-scheme Sui address, per Sui's
//! `SignatureScheme` tagging convention.

use crate::error::{Error, Result};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

const ED25519_FLAG: u8 = 0x00;

pub fn address(public_key: &[u8]) -> Result<String> {
    if public_key.len() != 32 {
        return Err(Error::DerivationInvalid(
            "Sui addresses require a 32-byte ed25519 public key".into(),
        ));
    }
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    let hash = hasher.finalize();
    Ok(format!("0x{}", hex::encode(hash)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_0x_prefix_and_32_bytes() {
        let addr = address(&[1u8; 32]).unwrap();
        assert!(addr.starts_with("0x"));
        assert_eq!(addr.len(), 2 + 64);
    }

    #[test]
    fn differs_from_raw_pubkey_hex() {
        let key = [9u8; 32];
        let addr = address(&key).unwrap();
        assert_ne!(addr, format!("0x{}", hex::encode(key)));
    }
}
