//! Bitcoin-family encoders: Base58Check legacy, Bech32 segwit v0,
//! P2SH-P2WPKH, CashAddr, and WIF. Parametrized by per-chain version bytes
//! so the same four routines cover Bitcoin, Litecoin, Dogecoin, Dash,
//! Zcash (T-addr) and Bitcoin Cash (§4.F).

use crate::error::{Error, Result};
use bech32::{ToBase32, Variant};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

pub const BITCOIN_P2PKH_VERSION: u8 = 0x00;
pub const BITCOIN_P2SH_VERSION: u8 = 0x05;
pub const LITECOIN_P2PKH_VERSION: u8 = 0x30;
pub const BITCOIN_WIF_VERSION: u8 = 0x80;
const ZCASH_T_VERSION: [u8; 2] = [0x1c, 0xb8];

/// RIPEMD160(SHA256(data)) — the standard Bitcoin `HASH160`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    ripe.into()
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

fn base58check(version: &[u8], payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(version.len() + payload.len() + 4);
    data.extend_from_slice(version);
    data.extend_from_slice(payload);
    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..4]);
    bs58::encode(data).into_string()
}

fn require_secp256k1_pubkey(public_key: &[u8]) -> Result<()> {
    if public_key.len() != 33 {
        return Err(Error::DerivationInvalid(
            "Bitcoin-family addresses require a 33-byte compressed secp256k1 public key".into(),
        ));
    }
    Ok(())
}

/// Base58Check(version ‖ HASH160(pub))
pub fn legacy_address(public_key: &[u8], version: u8) -> Result<String> {
    require_secp256k1_pubkey(public_key)?;
    Ok(base58check(&[version], &hash160(public_key)))
}

/// Base58Check(0x1cb8 ‖ HASH160(pub)) — Zcash transparent addresses use a
/// two-byte version prefix instead of one.
pub fn zcash_t_address(public_key: &[u8]) -> Result<String> {
    require_secp256k1_pubkey(public_key)?;
    Ok(base58check(&ZCASH_T_VERSION, &hash160(public_key)))
}

/// Bech32("bc", witness version 0, program=HASH160(pub))
pub fn segwit_v0_address(public_key: &[u8], hrp: &str) -> Result<String> {
    require_secp256k1_pubkey(public_key)?;
    let program = hash160(public_key);
    let mut groups = vec![bech32::u5::try_from_u8(0).expect("0 fits in 5 bits")];
    groups.extend(program.to_base32());
    bech32::encode(hrp, groups, Variant::Bech32)
        .map_err(|e| Error::DerivationInvalid(format!("bech32 encode failed: {e}")))
}

/// Base58Check(0x05 ‖ HASH160(OP_0 ‖ HASH160(pub))) — P2SH-wrapped P2WPKH.
pub fn p2sh_p2wpkh_address(public_key: &[u8], version: u8) -> Result<String> {
    require_secp256k1_pubkey(public_key)?;
    let mut redeem = Vec::with_capacity(21);
    redeem.push(0x00); // OP_0
    redeem.extend_from_slice(&hash160(public_key));
    Ok(base58check(&[version], &hash160(&redeem)))
}

/// Base58Check(0x80 ‖ scalar32 ‖ 0x01) — compressed-pubkey WIF.
pub fn wif(private_scalar: &[u8], version: u8) -> Result<String> {
    if private_scalar.len() != 32 {
        return Err(Error::DerivationInvalid(
            "WIF requires a 32-byte private scalar".into(),
        ));
    }
    let mut payload = Vec::with_capacity(33);
    payload.extend_from_slice(private_scalar);
    payload.push(0x01);
    Ok(base58check(&[version], &payload))
}

const CASHADDR_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

fn cashaddr_polymod(values: &[u8]) -> u64 {
    const GENERATOR: [u64; 5] = [
        0x98f2bc8e61,
        0x79b76d99e2,
        0xf33e5fb3c4,
        0xae2eabe2a8,
        0x1e4f43e470,
    ];
    let mut checksum: u64 = 1;
    for &value in values {
        let top = checksum >> 35;
        checksum = ((checksum & 0x07ff_ffff_ff) << 5) ^ u64::from(value);
        for (i, gen) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 != 0 {
                checksum ^= gen;
            }
        }
    }
    checksum ^ 1
}

fn cashaddr_prefix_expand(prefix: &str) -> Vec<u8> {
    let mut out: Vec<u8> = prefix.bytes().map(|b| b & 0x1f).collect();
    out.push(0);
    out
}

fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv = (1u32 << to_bits) - 1;
    let mut out = Vec::new();
    for &value in data {
        acc = (acc << from_bits) | u32::from(value);
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad && bits > 0 {
        out.push(((acc << (to_bits - bits)) & maxv) as u8);
    }
    out
}

/// CashAddr("bitcoincash", P2KH, HASH160(pub)) — Bitcoin Cash's bech32
/// variant. Distinct charset/polymod from BIP-173, so implemented directly
/// against the public CashAddr specification rather than the `bech32` crate.
pub fn cashaddr_address(public_key: &[u8]) -> Result<String> {
    require_secp256k1_pubkey(public_key)?;
    const PREFIX: &str = "bitcoincash";
    const VERSION_BYTE_P2KH_160: u8 = 0x00;

    let hash = hash160(public_key);
    let mut payload = vec![VERSION_BYTE_P2KH_160];
    payload.extend_from_slice(&hash);
    let payload_5bit = convert_bits(&payload, 8, 5, true);

    let mut checksum_input = cashaddr_prefix_expand(PREFIX);
    checksum_input.extend_from_slice(&payload_5bit);
    checksum_input.extend_from_slice(&[0u8; 8]);
    let polymod = cashaddr_polymod(&checksum_input);

    let mut checksum_5bit = Vec::with_capacity(8);
    for i in 0..8 {
        checksum_5bit.push(((polymod >> (5 * (7 - i))) & 0x1f) as u8);
    }

    let mut body = String::with_capacity(payload_5bit.len() + 8);
    for &v in payload_5bit.iter().chain(checksum_5bit.iter()) {
        body.push(CASHADDR_CHARSET[v as usize] as char);
    }

    Ok(format!("{PREFIX}:{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pubkey() -> [u8; 33] {
        let mut k = [0u8; 33];
        k[0] = 0x02;
        for (i, b) in k[1..].iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        k
    }

    #[test]
    fn legacy_address_starts_with_expected_prefix() {
        let addr = legacy_address(&sample_pubkey(), BITCOIN_P2PKH_VERSION).unwrap();
        assert!(addr.starts_with('1'));
    }

    #[test]
    fn segwit_address_has_bc1_prefix() {
        let addr = segwit_v0_address(&sample_pubkey(), "bc").unwrap();
        assert!(addr.starts_with("bc1"));
    }

    #[test]
    fn p2sh_p2wpkh_starts_with_3() {
        let addr = p2sh_p2wpkh_address(&sample_pubkey(), BITCOIN_P2SH_VERSION).unwrap();
        assert!(addr.starts_with('3'));
    }

    #[test]
    fn cashaddr_round_trips_prefix_and_is_stable() {
        let a = cashaddr_address(&sample_pubkey()).unwrap();
        let b = cashaddr_address(&sample_pubkey()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("bitcoincash:"));
    }

    #[test]
    fn wif_rejects_wrong_length_scalar() {
        let err = wif(&[0u8; 31], BITCOIN_WIF_VERSION).unwrap_err();
        assert!(matches!(err, Error::DerivationInvalid(_)));
    }

    #[test]
    fn wif_starts_with_k_or_l_for_compressed_mainnet() {
        let addr = wif(&[7u8; 32], BITCOIN_WIF_VERSION).unwrap();
        assert!(addr.starts_with('K') || addr.starts_with('L'));
    }
}
