//! Human/JSON/YAML/CSV rendering — out of the core's scope by design, so it
//! lives entirely in the CLI layer.

use anyhow::Result;
use serde::Serialize;
use vault_core::orchestrator::ListedAddress;
use vault_core::{DerivedKey, VaultRecord};

#[derive(Serialize)]
struct VaultSummary<'a> {
    name: &'a str,
    local_party_id: &'a str,
    signer_count: usize,
    signers: &'a [String],
    public_key_ecdsa: &'a str,
    public_key_eddsa: &'a str,
    hex_chain_code: &'a str,
    lib_type: &'static str,
    is_encrypted: bool,
    key_share_count: usize,
}

fn summary_of(record: &VaultRecord) -> VaultSummary<'_> {
    VaultSummary {
        name: &record.name,
        local_party_id: &record.local_party_id,
        signer_count: record.signers.len(),
        signers: &record.signers,
        public_key_ecdsa: &record.public_key_ecdsa,
        public_key_eddsa: &record.public_key_eddsa,
        hex_chain_code: &record.hex_chain_code,
        lib_type: match record.lib_type {
            vault_core::LibType::Gg20 => "GG20",
            vault_core::LibType::Dkls => "DKLS",
        },
        is_encrypted: record.is_encrypted,
        key_share_count: record.key_shares.len(),
    }
}

/// Used by both `inspect --summary` and `info` — the spec requires their
/// output to be byte-equal (S2).
pub fn print_summary(record: &VaultRecord) {
    let s = summary_of(record);
    println!("name:              {}", s.name);
    println!("local_party_id:    {}", s.local_party_id);
    println!("signers ({}):       {}", s.signer_count, s.signers.join(", "));
    println!("public_key_ecdsa:  {}", s.public_key_ecdsa);
    println!("public_key_eddsa:  {}", s.public_key_eddsa);
    println!("hex_chain_code:    {}", s.hex_chain_code);
    println!("lib_type:          {}", s.lib_type);
    println!("is_encrypted:      {}", s.is_encrypted);
    println!("key_shares:        {}", s.key_share_count);
}

pub fn print_vault_full(record: &VaultRecord, show_keyshares: bool) {
    print_summary(record);
    println!("created_at:        {}", record.created_at);
    if show_keyshares {
        for (i, share) in record.key_shares.iter().enumerate() {
            println!("key_share[{i}].public_key:     {}", share.public_key);
            println!("key_share[{i}].keyshare_blob:  {}", share.keyshare_blob);
        }
    }
}

pub fn print_vault_json(record: &VaultRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

pub fn print_vault_yaml(record: &VaultRecord) -> Result<()> {
    println!("{}", serde_yaml::to_string(record)?);
    Ok(())
}

pub fn print_listed_addresses_human(rows: &[ListedAddress]) {
    for row in rows {
        println!("{:<24} {:<20} {}", row.chain.as_str(), row.path, row.address);
    }
}

pub fn print_listed_addresses_json(rows: &[ListedAddress]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

pub fn print_listed_addresses_csv(rows: &[ListedAddress]) {
    println!("chain,path,address,public_key");
    for row in rows {
        println!(
            "{},{},{},{}",
            row.chain.as_str(),
            row.path,
            row.address,
            row.public_key
        );
    }
}

#[derive(Serialize)]
struct RecoveredKeyView<'a> {
    chain: &'static str,
    path: &'a str,
    public_key: String,
    address: &'a str,
    private_key: Option<&'a str>,
}

fn recovered_view(key: &DerivedKey) -> RecoveredKeyView<'_> {
    RecoveredKeyView {
        chain: key.chain.as_str(),
        path: &key.path,
        public_key: hex::encode(&key.public_key_bytes),
        address: &key.address,
        private_key: key.private_key_encoded.as_deref(),
    }
}

pub fn print_recovered_keys_human(keys: &[DerivedKey]) {
    for key in keys {
        println!("chain:       {}", key.chain.as_str());
        println!("path:        {}", key.path);
        println!("address:     {}", key.address);
        println!("public_key:  {}", hex::encode(&key.public_key_bytes));
        if let Some(private) = &key.private_key_encoded {
            println!("private_key: {private}");
        }
        println!();
    }
}

pub fn print_recovered_keys_json(keys: &[DerivedKey]) -> Result<()> {
    let views: Vec<_> = keys.iter().map(recovered_view).collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

#[derive(Serialize)]
struct DiffView {
    field: &'static str,
    a: String,
    b: String,
    equal: bool,
}

pub fn diff_records(a: &VaultRecord, b: &VaultRecord) -> Vec<(&'static str, String, String, bool)> {
    let mut rows = Vec::new();
    macro_rules! field {
        ($name:literal, $a:expr, $b:expr) => {
            rows.push(($name, $a.to_string(), $b.to_string(), $a == $b));
        };
    }
    field!("name", a.name, b.name);
    field!("local_party_id", a.local_party_id, b.local_party_id);
    field!("public_key_ecdsa", a.public_key_ecdsa, b.public_key_ecdsa);
    field!("public_key_eddsa", a.public_key_eddsa, b.public_key_eddsa);
    field!("hex_chain_code", a.hex_chain_code, b.hex_chain_code);
    field!("signers", a.signers.join(","), b.signers.join(","));
    field!("is_encrypted", a.is_encrypted, b.is_encrypted);
    rows
}

pub fn print_diff_human(rows: &[(&'static str, String, String, bool)]) {
    for (field, a, b, equal) in rows {
        let marker = if *equal { "==" } else { "!=" };
        println!("{field:<18} {a:<40} {marker} {b}");
    }
}

pub fn print_diff_structured(rows: &[(&'static str, String, String, bool)], yaml: bool) -> Result<()> {
    let views: Vec<DiffView> = rows
        .iter()
        .map(|(field, a, b, equal)| DiffView {
            field,
            a: a.clone(),
            b: b.clone(),
            equal: *equal,
        })
        .collect();
    if yaml {
        println!("{}", serde_yaml::to_string(&views)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&views)?);
    }
    Ok(())
}
