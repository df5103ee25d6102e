//! Solana encoder — Base58(pub_32) (§4.F).

use crate::error::{Error, Result};

pub fn address(public_key: &[u8]) -> Result<String> {
    if public_key.len() != 32 {
        return Err(Error::DerivationInvalid(
            "Solana addresses require a 32-byte ed25519 public key".into(),
        ));
    }
    Ok(bs58::encode(public_key).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_and_is_stable() {
        let key = [7u8; 32];
        assert_eq!(address(&key).unwrap(), address(&key).unwrap());
    }

    #[test]
    fn rejects_wrong_length() {
        let err = address(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, Error::DerivationInvalid(_)));
    }
}
