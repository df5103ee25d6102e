//! G. Orchestrator (§4.G) — binds components A-F: validates inputs, selects
//! curve per chain, routes derivation, assembles the per-chain result
//! record. This is the only module that touches more than one of A-F.

use crate::address::{self, ChainTag};
use crate::container;
use crate::derive;
use crate::error::{Error, Result};
use crate::payload;
use crate::reconstruct;
use crate::share::{self, ShareFlavor};
use crate::types::{ChildStep, Curve, DerivedKey, RawShare, VaultRecord};
use tracing::instrument;

/// The full chain list, in stable enumeration order (§5 "Address
/// enumeration order is stable: chain list order, then path order").
pub const ALL_CHAINS: &[ChainTag] = &[
    ChainTag::BitcoinLegacy,
    ChainTag::BitcoinSegwit,
    ChainTag::BitcoinP2shP2wpkh,
    ChainTag::BitcoinCash,
    ChainTag::Litecoin,
    ChainTag::Dogecoin,
    ChainTag::Dash,
    ChainTag::ZcashTransparent,
    ChainTag::Ethereum,
    ChainTag::Polygon,
    ChainTag::BnbSmartChain,
    ChainTag::AvalancheC,
    ChainTag::ArbitrumOne,
    ChainTag::Optimism,
    ChainTag::Base,
    ChainTag::CronosEvm,
    ChainTag::Thorchain,
    ChainTag::CosmosHub,
    ChainTag::Kujira,
    ChainTag::Osmosis,
    ChainTag::Dydx,
    ChainTag::Solana,
    ChainTag::Sui,
];

/// One row of `list_addresses` output: a chain/path pair and the address it
/// resolves to from the vault's stored public key alone (no reconstruction).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ListedAddress {
    pub chain: ChainTag,
    pub path: String,
    pub address: String,
    /// Hex-encoded public key at this path.
    pub public_key: String,
}

fn format_path(path: &[ChildStep]) -> String {
    let mut s = String::from("m");
    for step in path {
        s.push('/');
        s.push_str(&step.index.to_string());
        if step.hardened {
            s.push('\'');
        }
    }
    s
}

fn root_public_key_for(record: &VaultRecord, curve: Curve) -> Result<Vec<u8>> {
    match curve {
        Curve::Secp256k1 => Ok(record.ecdsa_public_key_bytes()?.to_vec()),
        Curve::Ed25519 => Ok(record.eddsa_public_key_bytes()?.to_vec()),
    }
}

/// 1. `inspect(vault, password?) -> vault record` — invokes A, B only; no
/// secret material is produced.
#[instrument(skip_all)]
pub fn inspect(vault_bytes: &[u8], password: Option<&str>) -> Result<VaultRecord> {
    let inner = container::read_bytes(vault_bytes, password)?;
    payload::decode(&inner)
}

/// 2. `list_addresses(vault, password?, filter?) -> [(chain, path, address,
/// public_key)]` — invokes A, B, E, F using the root public key; no share
/// decoding, no reconstruction.
#[instrument(skip_all)]
pub fn list_addresses(
    vault_bytes: &[u8],
    password: Option<&str>,
    chains: &[ChainTag],
    path_override: Option<&[ChildStep]>,
) -> Result<Vec<ListedAddress>> {
    let record = inspect(vault_bytes, password)?;
    let selected: &[ChainTag] = if chains.is_empty() { ALL_CHAINS } else { chains };

    let mut out = Vec::with_capacity(selected.len());
    for &chain in selected {
        let curve = chain.curve();
        let root_public_key = root_public_key_for(&record, curve)?;

        // SLIP-0010 (ed25519) has no public-only derivation mode at all, so
        // the public-key path can only ever address the vault's root key.
        if curve == Curve::Ed25519 {
            let address = address::encode_address(chain, &root_public_key)?;
            out.push(ListedAddress {
                chain,
                path: format_path(&[]),
                address,
                public_key: hex::encode(&root_public_key),
            });
            continue;
        }

        let chain_code = record.chain_code_bytes()?;
        let path: Vec<ChildStep> = path_override
            .map(|p| p.to_vec())
            .unwrap_or_else(|| chain.default_path());

        let derived = derive::derive(curve, &root_public_key, chain_code, None, &path)?;
        let address = address::encode_address(chain, &derived.public_key_bytes)?;

        out.push(ListedAddress {
            chain,
            path: format_path(&path),
            address,
            public_key: hex::encode(&derived.public_key_bytes),
        });
    }
    Ok(out)
}

fn decode_shares_for_curve(record: &VaultRecord, curve: Curve) -> Result<Vec<RawShare>> {
    let flavor = match record.lib_type {
        crate::types::LibType::Gg20 => ShareFlavor::Gg20,
        crate::types::LibType::Dkls => ShareFlavor::Dkls,
    };
    let expected_hex = match curve {
        Curve::Secp256k1 => &record.public_key_ecdsa,
        Curve::Ed25519 => &record.public_key_eddsa,
    };
    let expected_bytes = hex::decode(expected_hex)
        .map_err(|e| Error::ContainerMalformed(format!("public key hex: {e}")))?;

    let mut shares = Vec::new();
    for key_share in &record.key_shares {
        if !key_share.public_key.eq_ignore_ascii_case(expected_hex) {
            continue;
        }
        shares.push(share::decode_share(
            &key_share.keyshare_blob,
            flavor,
            &expected_bytes,
        )?);
    }
    Ok(shares)
}

fn check_consistent_vaults(records: &[VaultRecord]) -> Result<()> {
    let first = &records[0];
    for record in &records[1..] {
        if record.public_key_ecdsa != first.public_key_ecdsa {
            return Err(Error::ShareInconsistent(
                "vaults disagree on the aggregated ECDSA public key".into(),
            ));
        }
        if record.public_key_eddsa != first.public_key_eddsa {
            return Err(Error::ShareInconsistent(
                "vaults disagree on the aggregated EdDSA public key".into(),
            ));
        }
        let mut a: Vec<&String> = record.signers.iter().collect();
        let mut b: Vec<&String> = first.signers.iter().collect();
        a.sort();
        b.sort();
        if a != b {
            return Err(Error::ShareInconsistent(
                "vaults disagree on the signer set".into(),
            ));
        }
    }
    Ok(())
}

/// 3. `recover(vaults[], threshold, password?, chain_filter?) ->
/// [recovered_key]` — invokes A, B, C for every input, groups shares by
/// curve, runs D once per curve, then for each target chain runs E and F.
/// Returns records that include private material.
#[instrument(skip_all)]
pub fn recover(
    vault_files: &[(&[u8], Option<&str>)],
    threshold: usize,
    chains: &[ChainTag],
    path_override: Option<&[ChildStep]>,
) -> Result<Vec<DerivedKey>> {
    if threshold < 2 {
        return Err(Error::ThresholdUnmet {
            required: 2,
            actual: threshold,
        });
    }
    if vault_files.len() < threshold {
        return Err(Error::ThresholdUnmet {
            required: threshold,
            actual: vault_files.len(),
        });
    }

    let records: Vec<VaultRecord> = vault_files
        .iter()
        .map(|(bytes, password)| inspect(bytes, *password))
        .collect::<Result<_>>()?;
    check_consistent_vaults(&records)?;

    let mut ecdsa_shares = Vec::new();
    let mut eddsa_shares = Vec::new();
    for record in &records {
        ecdsa_shares.extend(decode_shares_for_curve(record, Curve::Secp256k1)?);
        eddsa_shares.extend(decode_shares_for_curve(record, Curve::Ed25519)?);
    }

    let root = &records[0];
    let ecdsa_pub = root.ecdsa_public_key_bytes()?;
    let eddsa_pub = root.eddsa_public_key_bytes()?;
    let chain_code = root.chain_code_bytes()?;

    let ecdsa_scalar = if ecdsa_shares.is_empty() {
        None
    } else {
        Some(reconstruct::reconstruct(
            &ecdsa_shares,
            threshold,
            Curve::Secp256k1,
            &ecdsa_pub,
        )?)
    };
    let eddsa_scalar = if eddsa_shares.is_empty() {
        None
    } else {
        Some(reconstruct::reconstruct(
            &eddsa_shares,
            threshold,
            Curve::Ed25519,
            &eddsa_pub,
        )?)
    };

    // §9 open question (a): validate the public-key path and the
    // reconstructed-scalar path agree; disagreement is `share-inconsistent`.
    if let Some(scalar) = &ecdsa_scalar {
        let from_scalar = derive::derive(Curve::Secp256k1, &ecdsa_pub, chain_code, Some(&scalar.bytes), &[])?;
        if from_scalar.public_key_bytes != ecdsa_pub {
            return Err(Error::ShareInconsistent(
                "reconstructed ECDSA scalar does not reproduce the vault's stored public key".into(),
            ));
        }
    }
    if let Some(scalar) = &eddsa_scalar {
        let from_scalar = derive::derive(Curve::Ed25519, &eddsa_pub, chain_code, Some(&scalar.bytes), &[])?;
        if from_scalar.public_key_bytes != eddsa_pub {
            return Err(Error::ShareInconsistent(
                "reconstructed EdDSA scalar does not reproduce the vault's stored public key".into(),
            ));
        }
    }

    let selected: &[ChainTag] = if chains.is_empty() { ALL_CHAINS } else { chains };
    let mut out = Vec::with_capacity(selected.len());
    for &chain in selected {
        let curve = chain.curve();
        let root_scalar = match curve {
            Curve::Secp256k1 => ecdsa_scalar.as_ref(),
            Curve::Ed25519 => eddsa_scalar.as_ref(),
        };
        let Some(root_scalar) = root_scalar else {
            continue; // no shares decoded for this curve; skip chains needing it
        };
        let root_public_key = root_public_key_for(root, curve)?;

        // SLIP-0010 has no public-only derivation mode, and per the wallet
        // format Solana/Sui key their address and exported keypair off the
        // root scalar and root public key directly, with no HD child step.
        if curve == Curve::Ed25519 {
            let address = address::encode_address(chain, &root_public_key)?;
            let private_key_encoded =
                address::encode_private_key(chain, &root_scalar.bytes, &root_public_key)?;

            out.push(DerivedKey {
                chain,
                path: format_path(&[]),
                public_key_bytes: root_public_key,
                private_scalar: Some(root_scalar.bytes.clone()),
                address,
                private_key_encoded,
            });
            continue;
        }

        let path: Vec<ChildStep> = path_override
            .map(|p| p.to_vec())
            .unwrap_or_else(|| chain.default_path());

        let derived = derive::derive(
            curve,
            &root_public_key,
            chain_code,
            Some(&root_scalar.bytes),
            &path,
        )?;
        let address = address::encode_address(chain, &derived.public_key_bytes)?;
        let private_scalar = derived.private_scalar_bytes.clone();
        let private_key_encoded = match &private_scalar {
            Some(scalar_bytes) => {
                address::encode_private_key(chain, scalar_bytes, &derived.public_key_bytes)?
            }
            None => None,
        };

        out.push(DerivedKey {
            chain,
            path: format_path(&path),
            public_key_bytes: derived.public_key_bytes,
            private_scalar,
            address,
            private_key_encoded,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyShareRecord, LibType};

    fn fixture_vault(name: &str, ecdsa_pub: &str, eddsa_pub: &str, chain_code: &str) -> Vec<u8> {
        let record = VaultRecord {
            name: name.into(),
            local_party_id: "party-1".into(),
            public_key_ecdsa: ecdsa_pub.into(),
            public_key_eddsa: eddsa_pub.into(),
            hex_chain_code: chain_code.into(),
            signers: vec!["party-1".into(), "party-2".into()],
            created_at: "2024-01-01T00:00:00Z".into(),
            lib_type: LibType::Gg20,
            is_encrypted: false,
            key_shares: vec![KeyShareRecord {
                public_key: ecdsa_pub.into(),
                keyshare_blob: format!(r#"{{"x_i":"01","id_i":"01","y":"{ecdsa_pub}"}}"#),
            }],
        };
        let inner = payload::encode(&record);
        let outer = container::encode_outer(&inner, false);
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
        BASE64.encode(outer).into_bytes()
    }

    #[test]
    fn inspect_round_trips_a_minimal_fixture() {
        let ecdsa_pub = "02".to_string() + &"ab".repeat(32);
        let eddsa_pub = "cd".repeat(32);
        let chain_code = "ef".repeat(32);
        let vault = fixture_vault("qa-fast", &ecdsa_pub, &eddsa_pub, &chain_code);

        let record = inspect(&vault, None).unwrap();
        assert_eq!(record.name, "qa-fast");
        assert_eq!(record.public_key_ecdsa, ecdsa_pub);
    }

    #[test]
    fn list_addresses_uses_stored_public_key_only() {
        let ecdsa_pub_bytes = {
            let scalar = k256::Scalar::from(7u64);
            use elliptic_curve::sec1::ToEncodedPoint;
            (k256::ProjectivePoint::GENERATOR * scalar)
                .to_affine()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec()
        };
        let ecdsa_pub = hex::encode(&ecdsa_pub_bytes);
        let eddsa_pub = "cd".repeat(32);
        let chain_code = "ef".repeat(32);
        let vault = fixture_vault("qa-fast", &ecdsa_pub, &eddsa_pub, &chain_code);

        let addrs = list_addresses(&vault, None, &[ChainTag::BitcoinLegacy], None).unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs[0].address.starts_with('1'));
        assert_eq!(addrs[0].path, "m/44'/0'/0'/0/0");
    }

    #[test]
    fn recover_below_threshold_file_count_is_rejected() {
        let ecdsa_pub = "02".to_string() + &"ab".repeat(32);
        let eddsa_pub = "cd".repeat(32);
        let chain_code = "ef".repeat(32);
        let vault = fixture_vault("qa-fast", &ecdsa_pub, &eddsa_pub, &chain_code);

        let err = recover(&[(&vault, None)], 2, &[], None).unwrap_err();
        assert!(matches!(err, Error::ThresholdUnmet { .. }));
    }

    #[test]
    fn recover_rejects_threshold_below_two() {
        let ecdsa_pub = "02".to_string() + &"ab".repeat(32);
        let eddsa_pub = "cd".repeat(32);
        let chain_code = "ef".repeat(32);
        let vault = fixture_vault("qa-fast", &ecdsa_pub, &eddsa_pub, &chain_code);

        let err = recover(&[(&vault, None), (&vault, None)], 1, &[], None).unwrap_err();
        assert!(matches!(err, Error::ThresholdUnmet { .. }));
    }
}
