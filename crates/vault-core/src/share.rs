//! C. Share decoder — opaque per-curve keyshare blobs into (x_i, id_i, Y)
//!
//! The `keyshare_blob` embedded in each `KeyShareRecord` is itself a
//! structured blob: JSON-shaped for GG20, binary for DKLS (§4.C). Both
//! flavors are decoded through the same `decode_share` entry point into the
//! curve-agnostic `RawShare` triple; a share whose `Y` disagrees with the
//! vault's advertised aggregated key for that curve is rejected before it
//! ever reaches the reconstructor.

use crate::error::{Error, Result};
use crate::types::RawShare;
use serde_json::Value;

/// Which family produced a keyshare blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareFlavor {
    Gg20,
    Dkls,
}

/// Look up a JSON object key case-insensitively, trying several aliases
/// in order (the field names vary slightly across GG20 implementations).
fn lookup_str<'a>(obj: &'a serde_json::Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    for (key, value) in obj {
        let lower = key.to_ascii_lowercase();
        if aliases.iter().any(|a| a.eq_ignore_ascii_case(&lower)) {
            if let Some(s) = value.as_str() {
                return Some(s);
            }
        }
    }
    None
}

/// Decode a big integer that may be hex (optionally `0x`-prefixed) or decimal,
/// returning its big-endian byte representation with no leading zero byte
/// (beyond what's needed to hold the value).
fn decode_bigint(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    if let Some(hex_part) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return hex::decode(pad_even(hex_part))
            .map_err(|e| Error::ShareMalformed(format!("invalid hex big integer: {e}")));
    }
    // No `0x` prefix: GG20/tss-lib big integers are base-10 strings, and an
    // all-hex-digit decimal value (e.g. "10", "16") is not distinguishable
    // from hex without the prefix, so decimal is the only sound default.
    decode_decimal(trimmed)
}

fn pad_even(s: &str) -> String {
    if s.len() % 2 == 0 {
        s.to_string()
    } else {
        format!("0{s}")
    }
}

fn decode_decimal(s: &str) -> Result<Vec<u8>> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::ShareMalformed(format!("not a valid integer: {s}")));
    }
    let mut digits: Vec<u8> = s.bytes().map(|b| b - b'0').collect();
    let mut bytes_rev = Vec::new();
    while digits.iter().any(|&d| d != 0) {
        let mut remainder = 0u32;
        let mut next_digits = Vec::with_capacity(digits.len());
        for &d in &digits {
            let acc = remainder * 10 + u32::from(d);
            next_digits.push((acc / 256) as u8);
            remainder = acc % 256;
        }
        // strip leading zeros from next_digits for the next iteration
        let first_nonzero = next_digits.iter().position(|&d| d != 0).unwrap_or(next_digits.len());
        digits = next_digits[first_nonzero..].to_vec();
        bytes_rev.push(remainder as u8);
    }
    if bytes_rev.is_empty() {
        bytes_rev.push(0);
    }
    bytes_rev.reverse();
    Ok(bytes_rev)
}

fn decode_gg20(blob: &str) -> Result<RawShare> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| Error::ShareMalformed(format!("GG20 blob is not valid JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::ShareMalformed("GG20 blob is not a JSON object".into()))?;

    let scalar_str = lookup_str(obj, &["x_i", "xi", "secret_share", "share"])
        .ok_or_else(|| Error::ShareMalformed("GG20 blob missing local scalar share (x_i)".into()))?;
    let id_str = lookup_str(obj, &["id_i", "shamir_id", "id", "party_id", "index"])
        .ok_or_else(|| Error::ShareMalformed("GG20 blob missing shamir index (id_i)".into()))?;
    let y_str = lookup_str(obj, &["y", "pub_key", "public_key", "pubkey"])
        .ok_or_else(|| Error::ShareMalformed("GG20 blob missing aggregated public key (Y)".into()))?;

    let scalar = decode_bigint(scalar_str)?;
    let id = decode_bigint(id_str)?;
    let public_point =
        hex::decode(y_str.trim_start_matches("0x")).map_err(|e| Error::ShareMalformed(format!("invalid Y hex: {e}")))?;

    if id.iter().all(|&b| b == 0) {
        return Err(Error::ShareMalformed("shamir index must be non-zero".into()));
    }

    Ok(RawShare {
        id,
        scalar,
        public_point,
    })
}

fn decode_dkls(_blob: &[u8]) -> Result<RawShare> {
    Err(Error::ShareMalformed(
        "DKLS binary keyshare layout is not supported by this decoder".into(),
    ))
}

/// Decode a keyshare blob into its abstract `(x_i, id_i, Y)` triple and
/// verify `Y` agrees with the vault's advertised aggregated public key for
/// this curve.
pub fn decode_share(
    blob: &str,
    flavor: ShareFlavor,
    expected_public_key: &[u8],
) -> Result<RawShare> {
    let share = match flavor {
        ShareFlavor::Gg20 => decode_gg20(blob)?,
        ShareFlavor::Dkls => decode_dkls(blob.as_bytes())?,
    };

    if share.public_point != expected_public_key {
        return Err(Error::ShareInconsistent(
            "share's aggregated public key Y does not match the vault's advertised key".into(),
        ));
    }

    Ok(share)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_gg20_blob() {
        let y = "02".to_string() + &"11".repeat(32);
        let blob = format!(r#"{{"x_i":"0x1a2b","id_i":"0x01","pub_key":"{y}"}}"#);
        let y_bytes = hex::decode(&y).unwrap();
        let share = decode_share(&blob, ShareFlavor::Gg20, &y_bytes).unwrap();
        assert_eq!(share.scalar, vec![0x1a, 0x2b]);
        assert_eq!(share.id, vec![0x01]);
    }

    #[test]
    fn decodes_decimal_id() {
        let y = "02".to_string() + &"11".repeat(32);
        let blob = format!(r#"{{"x_i":"255","id_i":"3","y":"{y}"}}"#);
        let y_bytes = hex::decode(&y).unwrap();
        let share = decode_share(&blob, ShareFlavor::Gg20, &y_bytes).unwrap();
        assert_eq!(share.scalar, vec![0xff]);
        assert_eq!(share.id, vec![0x03]);
    }

    #[test]
    fn decodes_decimal_values_that_look_like_hex() {
        // "16" and "42" are even-length, all-hex-digit strings that must
        // still be read as base-10 (16 and 42), not as hex 0x16/0x42.
        let y = "02".to_string() + &"11".repeat(32);
        let blob = format!(r#"{{"x_i":"16","id_i":"42","y":"{y}"}}"#);
        let y_bytes = hex::decode(&y).unwrap();
        let share = decode_share(&blob, ShareFlavor::Gg20, &y_bytes).unwrap();
        assert_eq!(share.scalar, vec![16]);
        assert_eq!(share.id, vec![42]);
    }

    #[test]
    fn rejects_mismatched_public_key() {
        let y = "02".to_string() + &"11".repeat(32);
        let other_y = "02".to_string() + &"22".repeat(32);
        let blob = format!(r#"{{"x_i":"01","id_i":"01","y":"{y}"}}"#);
        let other_bytes = hex::decode(&other_y).unwrap();
        let err = decode_share(&blob, ShareFlavor::Gg20, &other_bytes).unwrap_err();
        assert!(matches!(err, Error::ShareInconsistent(_)));
    }

    #[test]
    fn rejects_zero_id() {
        let y = "02".to_string() + &"11".repeat(32);
        let blob = format!(r#"{{"x_i":"01","id_i":"00","y":"{y}"}}"#);
        let y_bytes = hex::decode(&y).unwrap();
        let err = decode_share(&blob, ShareFlavor::Gg20, &y_bytes).unwrap_err();
        assert!(matches!(err, Error::ShareMalformed(_)));
    }

    #[test]
    fn dkls_is_rejected_explicitly() {
        let err = decode_share("whatever", ShareFlavor::Dkls, &[]).unwrap_err();
        assert!(matches!(err, Error::ShareMalformed(_)));
    }
}
