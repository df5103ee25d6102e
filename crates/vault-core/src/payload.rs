//! B. Payload decoder — inner length-delimited vault record (§3, §6 "Level 4")

use crate::error::{Error, Result};
use crate::types::{KeyShareRecord, LibType, VaultRecord};
use crate::wire::{self, WireType};

const FIELD_NAME: u32 = 1;
const FIELD_PUBLIC_KEY_ECDSA: u32 = 2;
const FIELD_PUBLIC_KEY_EDDSA: u32 = 3;
const FIELD_SIGNERS: u32 = 4;
const FIELD_CREATED_AT: u32 = 5;
const FIELD_HEX_CHAIN_CODE: u32 = 6;
const FIELD_KEY_SHARES: u32 = 7;
const FIELD_LOCAL_PARTY_ID: u32 = 8;
const FIELD_LIB_TYPE: u32 = 9;
const FIELD_IS_ENCRYPTED: u32 = 10;

const KEY_SHARE_FIELD_PUBLIC_KEY: u32 = 1;
const KEY_SHARE_FIELD_BLOB: u32 = 2;

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::ContainerMalformed(format!("{what} not valid UTF-8: {e}")))
}

fn hex_field(bytes: &[u8], what: &str, expected_len: usize) -> Result<String> {
    let s = utf8(bytes, what)?;
    let decoded = hex::decode(&s).map_err(|e| Error::ContainerMalformed(format!("{what} hex: {e}")))?;
    if decoded.len() != expected_len {
        return Err(Error::ContainerMalformed(format!(
            "{what} must decode to {expected_len} bytes, got {}",
            decoded.len()
        )));
    }
    Ok(s.to_ascii_lowercase())
}

fn parse_key_share(bytes: &[u8]) -> Result<KeyShareRecord> {
    let fields = wire::parse_message(bytes)?;
    let mut public_key = None;
    let mut keyshare_blob = None;

    for field in fields {
        match field.number {
            KEY_SHARE_FIELD_PUBLIC_KEY if field.wire_type == WireType::LengthDelimited => {
                public_key = Some(utf8(field.bytes, "key_share.public_key")?);
            }
            KEY_SHARE_FIELD_BLOB if field.wire_type == WireType::LengthDelimited => {
                keyshare_blob = Some(utf8(field.bytes, "key_share.keyshare_blob")?);
            }
            _ => {}
        }
    }

    Ok(KeyShareRecord {
        public_key: public_key
            .ok_or_else(|| Error::ContainerMalformed("key_share missing public_key".into()))?,
        keyshare_blob: keyshare_blob
            .ok_or_else(|| Error::ContainerMalformed("key_share missing keyshare_blob".into()))?,
    })
}

fn parse_lib_type(bytes: &[u8]) -> Result<LibType> {
    match utf8(bytes, "lib_type")?.to_ascii_uppercase().as_str() {
        "GG20" => Ok(LibType::Gg20),
        "DKLS" => Ok(LibType::Dkls),
        other => Err(Error::ContainerMalformed(format!("unknown lib_type {other}"))),
    }
}

/// Decode the inner vault record from a structured (possibly already
/// decrypted) byte payload.
pub fn decode(inner_bytes: &[u8]) -> Result<VaultRecord> {
    let fields = wire::parse_message(inner_bytes)?;

    let mut name = None;
    let mut public_key_ecdsa = None;
    let mut public_key_eddsa = None;
    let mut signers = Vec::new();
    let mut created_at = None;
    let mut hex_chain_code = None;
    let mut key_shares = Vec::new();
    let mut local_party_id = None;
    let mut lib_type = None;
    let mut is_encrypted = false;

    for field in fields {
        if field.wire_type != WireType::LengthDelimited && field.number != FIELD_IS_ENCRYPTED {
            continue;
        }
        match field.number {
            FIELD_NAME => name = Some(utf8(field.bytes, "name")?),
            FIELD_PUBLIC_KEY_ECDSA => {
                public_key_ecdsa = Some(hex_field(field.bytes, "public_key_ecdsa", 33)?)
            }
            FIELD_PUBLIC_KEY_EDDSA => {
                public_key_eddsa = Some(hex_field(field.bytes, "public_key_eddsa", 32)?)
            }
            FIELD_SIGNERS => signers.push(utf8(field.bytes, "signers")?),
            FIELD_CREATED_AT => created_at = Some(utf8(field.bytes, "created_at")?),
            FIELD_HEX_CHAIN_CODE => {
                hex_chain_code = Some(hex_field(field.bytes, "hex_chain_code", 32)?)
            }
            FIELD_KEY_SHARES => key_shares.push(parse_key_share(field.bytes)?),
            FIELD_LOCAL_PARTY_ID => local_party_id = Some(utf8(field.bytes, "local_party_id")?),
            FIELD_LIB_TYPE => lib_type = Some(parse_lib_type(field.bytes)?),
            FIELD_IS_ENCRYPTED if field.wire_type == WireType::Varint => {
                is_encrypted = field.varint != 0;
            }
            _ => {} // unknown fields are ignored
        }
    }

    Ok(VaultRecord {
        name: name.ok_or_else(|| Error::ContainerMalformed("missing name".into()))?,
        local_party_id: local_party_id
            .ok_or_else(|| Error::ContainerMalformed("missing local_party_id".into()))?,
        public_key_ecdsa: public_key_ecdsa
            .ok_or_else(|| Error::ContainerMalformed("missing public_key_ecdsa".into()))?,
        public_key_eddsa: public_key_eddsa
            .ok_or_else(|| Error::ContainerMalformed("missing public_key_eddsa".into()))?,
        hex_chain_code: hex_chain_code
            .ok_or_else(|| Error::ContainerMalformed("missing hex_chain_code".into()))?,
        signers,
        created_at: created_at.unwrap_or_default(),
        lib_type: lib_type.unwrap_or(LibType::Gg20),
        is_encrypted,
        key_shares,
    })
}

/// Encode a vault record back into the inner wire format. Exposed for
/// fixture construction in tests and for `--export`.
pub fn encode(record: &VaultRecord) -> Vec<u8> {
    let mut out = Vec::new();
    wire::encode_bytes_field(&mut out, FIELD_NAME, record.name.as_bytes());
    wire::encode_bytes_field(
        &mut out,
        FIELD_PUBLIC_KEY_ECDSA,
        record.public_key_ecdsa.as_bytes(),
    );
    wire::encode_bytes_field(
        &mut out,
        FIELD_PUBLIC_KEY_EDDSA,
        record.public_key_eddsa.as_bytes(),
    );
    for signer in &record.signers {
        wire::encode_bytes_field(&mut out, FIELD_SIGNERS, signer.as_bytes());
    }
    wire::encode_bytes_field(&mut out, FIELD_CREATED_AT, record.created_at.as_bytes());
    wire::encode_bytes_field(
        &mut out,
        FIELD_HEX_CHAIN_CODE,
        record.hex_chain_code.as_bytes(),
    );
    for share in &record.key_shares {
        let mut share_bytes = Vec::new();
        wire::encode_bytes_field(
            &mut share_bytes,
            KEY_SHARE_FIELD_PUBLIC_KEY,
            share.public_key.as_bytes(),
        );
        wire::encode_bytes_field(
            &mut share_bytes,
            KEY_SHARE_FIELD_BLOB,
            share.keyshare_blob.as_bytes(),
        );
        wire::encode_bytes_field(&mut out, FIELD_KEY_SHARES, &share_bytes);
    }
    wire::encode_bytes_field(
        &mut out,
        FIELD_LOCAL_PARTY_ID,
        record.local_party_id.as_bytes(),
    );
    let lib_type_str = match record.lib_type {
        LibType::Gg20 => "GG20",
        LibType::Dkls => "DKLS",
    };
    wire::encode_bytes_field(&mut out, FIELD_LIB_TYPE, lib_type_str.as_bytes());
    wire::encode_varint_field(&mut out, FIELD_IS_ENCRYPTED, record.is_encrypted as u64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VaultRecord {
        VaultRecord {
            name: "qa-fast".into(),
            local_party_id: "party-1".into(),
            public_key_ecdsa: "02".to_string() + &"ab".repeat(32),
            public_key_eddsa: "cd".repeat(32),
            hex_chain_code: "ef".repeat(32),
            signers: vec!["party-1".into(), "party-2".into()],
            created_at: "2024-01-01T00:00:00Z".into(),
            lib_type: LibType::Gg20,
            is_encrypted: true,
            key_shares: vec![
                KeyShareRecord {
                    public_key: "02".to_string() + &"ab".repeat(32),
                    keyshare_blob: "{\"x_i\":\"01\"}".into(),
                },
                KeyShareRecord {
                    public_key: "cd".repeat(32),
                    keyshare_blob: "{\"x_i\":\"02\"}".into(),
                },
            ],
        }
    }

    #[test]
    fn round_trips_all_core_fields() {
        let record = sample();
        let bytes = encode(&record);
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.name, record.name);
        assert_eq!(decoded.local_party_id, record.local_party_id);
        assert_eq!(decoded.public_key_ecdsa, record.public_key_ecdsa);
        assert_eq!(decoded.public_key_eddsa, record.public_key_eddsa);
        assert_eq!(decoded.hex_chain_code, record.hex_chain_code);
        assert_eq!(decoded.signers, record.signers);
        assert_eq!(decoded.is_encrypted, record.is_encrypted);
        assert_eq!(decoded.key_shares.len(), 2);
        assert_eq!(decoded.key_shares[0].keyshare_blob, "{\"x_i\":\"01\"}");
    }

    #[test]
    fn rejects_truncated_chain_code() {
        let mut record = sample();
        record.hex_chain_code = "ef".repeat(16); // 16 bytes instead of 32
        let bytes = encode(&record);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::ContainerMalformed(_)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let record = sample();
        let mut bytes = encode(&record);
        wire::encode_bytes_field(&mut bytes, 200, b"from a future schema version");
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.name, record.name);
    }
}
