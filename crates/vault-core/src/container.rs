//! A. Container codec — outer armored envelope, password-based decryption
//!
//! A vault file is UTF-8 text: base64 of a length-prefixed outer message
//! carrying `vault_bytes` (opaque) and `is_encrypted` (bool). When encrypted,
//! `vault_bytes` is `nonce(12) || ciphertext || tag(16)` under AES-256-GCM
//! with an empty AAD, keyed by `SHA-256(password_utf8)`.

use crate::error::{Error, Result};
use crate::wire;
use aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

const OUTER_FIELD_VAULT_BYTES: u32 = 1;
const OUTER_FIELD_IS_ENCRYPTED: u32 = 2;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

struct OuterMessage {
    vault_bytes: Vec<u8>,
    is_encrypted: bool,
}

fn parse_outer(buf: &[u8]) -> Result<OuterMessage> {
    let fields = wire::parse_message(buf)?;
    let mut vault_bytes = None;
    let mut is_encrypted = false;

    for field in fields {
        match field.number {
            OUTER_FIELD_VAULT_BYTES => vault_bytes = Some(field.bytes.to_vec()),
            OUTER_FIELD_IS_ENCRYPTED => is_encrypted = field.varint != 0,
            _ => {} // unknown fields are ignored
        }
    }

    Ok(OuterMessage {
        vault_bytes: vault_bytes
            .ok_or_else(|| Error::ContainerMalformed("missing vault_bytes field".into()))?,
        is_encrypted,
    })
}

fn derive_key(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

fn decrypt(vault_bytes: &[u8], password: &str) -> Result<Vec<u8>> {
    if vault_bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::ContainerMalformed(
            "encrypted vault_bytes shorter than nonce+tag".into(),
        ));
    }
    let (nonce_bytes, rest) = vault_bytes.split_at(NONCE_LEN);
    let key = derive_key(password);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| Error::ContainerMalformed("invalid AES-256 key length".into()))?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, rest).map_err(|_| Error::BadPassword)
}

/// Strip ASCII whitespace the way a pasted/armored text blob commonly picks up
fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Read and, if necessary, decrypt a vault file's bytes, returning the inner
/// (still-structured) payload bytes for the payload decoder (component B).
pub fn read_bytes(raw: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::ContainerMalformed(format!("not valid UTF-8: {e}")))?;
    let stripped = strip_whitespace(text);

    let decoded = BASE64.decode(&stripped)
        .map_err(|e| Error::ContainerMalformed(format!("base64 decode: {e}")))?;

    let outer = parse_outer(&decoded)?;

    if !outer.is_encrypted {
        return Ok(outer.vault_bytes);
    }

    let password = password
        .filter(|p| !p.is_empty())
        .ok_or(Error::BadPassword)?;
    decrypt(&outer.vault_bytes, password)
}

/// Read and, if necessary, decrypt a vault file from disk.
pub fn read_file(path: &std::path::Path, password: Option<&str>) -> Result<Vec<u8>> {
    let raw = std::fs::read(path)?;
    read_bytes(&raw, password)
}

/// Encode an outer message. Exposed for building test fixtures and for the
/// `--export` round-trip; not needed by the read path.
pub fn encode_outer(vault_bytes: &[u8], is_encrypted: bool) -> Vec<u8> {
    let mut out = Vec::new();
    wire::encode_bytes_field(&mut out, OUTER_FIELD_VAULT_BYTES, vault_bytes);
    wire::encode_varint_field(&mut out, OUTER_FIELD_IS_ENCRYPTED, is_encrypted as u64);
    out
}

/// Encrypt inner bytes the same way `decrypt` expects them, for fixtures and
/// for `export`-with-password flows.
pub fn encrypt(inner_bytes: &[u8], password: &str) -> Vec<u8> {
    use rand::RngCore;

    let key = derive_key(password);
    let cipher = Aes256Gcm::new_from_slice(&key).expect("32-byte key");
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, inner_bytes)
        .expect("AES-GCM encryption over well-formed buffers cannot fail");

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unencrypted_round_trip() {
        let inner = b"hello vault".to_vec();
        let outer = encode_outer(&inner, false);
        let armored = BASE64.encode(&outer);

        let read_back = read_bytes(armored.as_bytes(), None).unwrap();
        assert_eq!(read_back, inner);
    }

    #[test]
    fn encrypted_round_trip() {
        let inner = b"secret payload bytes".to_vec();
        let encrypted = encrypt(&inner, "correct horse battery staple");
        let outer = encode_outer(&encrypted, true);
        let armored = BASE64.encode(&outer);

        let read_back = read_bytes(armored.as_bytes(), Some("correct horse battery staple")).unwrap();
        assert_eq!(read_back, inner);
    }

    #[test]
    fn wrong_password_is_bad_password() {
        let inner = b"secret payload bytes".to_vec();
        let encrypted = encrypt(&inner, "right password");
        let outer = encode_outer(&encrypted, true);
        let armored = BASE64.encode(&outer);

        let err = read_bytes(armored.as_bytes(), Some("wrong password")).unwrap_err();
        assert!(matches!(err, Error::BadPassword));
    }

    #[test]
    fn missing_password_on_encrypted_vault_is_bad_password() {
        let inner = b"secret payload bytes".to_vec();
        let encrypted = encrypt(&inner, "right password");
        let outer = encode_outer(&encrypted, true);
        let armored = BASE64.encode(&outer);

        let err = read_bytes(armored.as_bytes(), None).unwrap_err();
        assert!(matches!(err, Error::BadPassword));
    }

    #[test]
    fn whitespace_in_armor_is_tolerated() {
        let inner = b"hello vault".to_vec();
        let outer = encode_outer(&inner, false);
        let armored = BASE64.encode(&outer);
        let wrapped: String = armored
            .as_bytes()
            .chunks(16)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");

        let read_back = read_bytes(wrapped.as_bytes(), None).unwrap();
        assert_eq!(read_back, inner);
    }
}
