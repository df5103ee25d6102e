//! Cosmos-SDK encoder — Bech32(HRP, HASH160(pub)). Reused verbatim across
//! THORChain and every Cosmos-SDK chain in the tool's chain list; only the
//! HRP differs (§4.F).

use crate::error::{Error, Result};
use crate::address::bitcoin::hash160;
use bech32::{ToBase32, Variant};

/// Bech32(hrp, HASH160(pub)) — no witness-version byte, unlike Bitcoin
/// segwit; Cosmos-SDK bech32 addresses encode the 20-byte hash directly.
pub fn bech32_hash160_address(public_key: &[u8], hrp: &str) -> Result<String> {
    if public_key.len() != 33 {
        return Err(Error::DerivationInvalid(
            "Cosmos-SDK addresses require a 33-byte compressed secp256k1 public key".into(),
        ));
    }
    let hash = hash160(public_key);
    bech32::encode(hrp, hash.to_base32(), Variant::Bech32)
        .map_err(|e| Error::DerivationInvalid(format!("bech32 encode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pubkey() -> [u8; 33] {
        let mut k = [0u8; 33];
        k[0] = 0x03;
        for (i, b) in k[1..].iter_mut().enumerate() {
            *b = i as u8 + 9;
        }
        k
    }

    #[test]
    fn thorchain_and_cosmoshub_differ_only_by_hrp() {
        let thor = bech32_hash160_address(&sample_pubkey(), "thor").unwrap();
        let cosmos = bech32_hash160_address(&sample_pubkey(), "cosmos").unwrap();
        assert!(thor.starts_with("thor1"));
        assert!(cosmos.starts_with("cosmos1"));
        assert_eq!(
            thor.rsplit('1').next().unwrap(),
            cosmos.rsplit('1').next().unwrap()
        );
    }
}
