//! F. Address encoder (§4.F) — one function per wire encoding, reused
//! across every concrete chain tag that encoding covers.

pub mod bitcoin;
pub mod cosmos;
pub mod evm;
pub mod solana;
pub mod sui;

use crate::error::{Error, Result};
use crate::types::Curve;
use serde::Serialize;

/// Every chain this tool can derive an address for. Bitcoin-family and
/// Cosmos-SDK tags share one encoder each, parametrized per tag; EVM tags
/// all share the single chain-agnostic Keccak/EIP-55 encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainTag {
    BitcoinLegacy,
    BitcoinSegwit,
    BitcoinP2shP2wpkh,
    BitcoinCash,
    Litecoin,
    Dogecoin,
    Dash,
    ZcashTransparent,
    Ethereum,
    Polygon,
    BnbSmartChain,
    AvalancheC,
    ArbitrumOne,
    Optimism,
    Base,
    CronosEvm,
    Thorchain,
    CosmosHub,
    Kujira,
    Osmosis,
    Dydx,
    Solana,
    Sui,
}

impl ChainTag {
    /// The curve whose reconstructed/derived key this chain's address is
    /// built from.
    pub fn curve(self) -> Curve {
        match self {
            ChainTag::Solana | ChainTag::Sui => Curve::Ed25519,
            _ => Curve::Secp256k1,
        }
    }

    /// Canonical lowercase CLI name used by `--chain`.
    pub fn as_str(self) -> &'static str {
        match self {
            ChainTag::BitcoinLegacy => "bitcoin",
            ChainTag::BitcoinSegwit => "bitcoin-segwit",
            ChainTag::BitcoinP2shP2wpkh => "bitcoin-p2sh-p2wpkh",
            ChainTag::BitcoinCash => "bitcoin-cash",
            ChainTag::Litecoin => "litecoin",
            ChainTag::Dogecoin => "dogecoin",
            ChainTag::Dash => "dash",
            ChainTag::ZcashTransparent => "zcash",
            ChainTag::Ethereum => "ethereum",
            ChainTag::Polygon => "polygon",
            ChainTag::BnbSmartChain => "bsc",
            ChainTag::AvalancheC => "avalanche",
            ChainTag::ArbitrumOne => "arbitrum",
            ChainTag::Optimism => "optimism",
            ChainTag::Base => "base",
            ChainTag::CronosEvm => "cronos",
            ChainTag::Thorchain => "thorchain",
            ChainTag::CosmosHub => "cosmoshub",
            ChainTag::Kujira => "kujira",
            ChainTag::Osmosis => "osmosis",
            ChainTag::Dydx => "dydx",
            ChainTag::Solana => "solana",
            ChainTag::Sui => "sui",
        }
    }

    pub fn from_str_loose(s: &str) -> Result<Self> {
        let all = [
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
        all.into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedChain(s.to_string()))
    }

    /// The chain's default derivation path. Secp256k1 chains use the
    /// standard BIP44 `44'/coin'/0'/0/0`; ed25519 chains (SLIP-0010,
    /// hardened-only) use the common `44'/coin'/0'` convention.
    pub fn default_path(self) -> Vec<crate::types::ChildStep> {
        use crate::types::ChildStep;
        let coin = self.default_coin_type();
        match self.curve() {
            Curve::Secp256k1 => vec![
                ChildStep::hardened(44),
                ChildStep::hardened(coin),
                ChildStep::hardened(0),
                ChildStep::normal(0),
                ChildStep::normal(0),
            ],
            Curve::Ed25519 => vec![
                ChildStep::hardened(44),
                ChildStep::hardened(coin),
                ChildStep::hardened(0),
            ],
        }
    }

    /// WIF version byte for Bitcoin-family chains that define one; `None`
    /// for chains with no standard WIF encoding.
    pub fn wif_version(self) -> Option<u8> {
        match self {
            ChainTag::BitcoinLegacy | ChainTag::BitcoinSegwit | ChainTag::BitcoinP2shP2wpkh | ChainTag::BitcoinCash => {
                Some(0x80)
            }
            ChainTag::Litecoin => Some(0xb0),
            ChainTag::Dogecoin => Some(0x9e),
            ChainTag::Dash => Some(0xcc),
            _ => None,
        }
    }

    /// BIP44 `coin_type'` for this chain's default derivation path.
    pub fn default_coin_type(self) -> u32 {
        match self {
            ChainTag::BitcoinLegacy
            | ChainTag::BitcoinSegwit
            | ChainTag::BitcoinP2shP2wpkh
            | ChainTag::BitcoinCash => 0,
            ChainTag::Litecoin => 2,
            ChainTag::Dogecoin => 3,
            ChainTag::Dash => 5,
            ChainTag::ZcashTransparent => 133,
            ChainTag::Ethereum
            | ChainTag::Polygon
            | ChainTag::BnbSmartChain
            | ChainTag::AvalancheC
            | ChainTag::ArbitrumOne
            | ChainTag::Optimism
            | ChainTag::Base
            | ChainTag::CronosEvm => 60,
            ChainTag::Thorchain => 931,
            ChainTag::CosmosHub => 118,
            ChainTag::Kujira => 118,
            ChainTag::Osmosis => 118,
            ChainTag::Dydx => 118,
            ChainTag::Solana => 501,
            ChainTag::Sui => 784,
        }
    }
}

/// Encode an address for `chain` given the relevant curve's public key
/// bytes (33-byte compressed secp256k1, or 32-byte ed25519).
pub fn encode_address(chain: ChainTag, public_key: &[u8]) -> Result<String> {
    match chain {
        ChainTag::BitcoinLegacy => bitcoin::legacy_address(public_key, bitcoin::BITCOIN_P2PKH_VERSION),
        ChainTag::BitcoinSegwit => bitcoin::segwit_v0_address(public_key, "bc"),
        ChainTag::BitcoinP2shP2wpkh => bitcoin::p2sh_p2wpkh_address(public_key, bitcoin::BITCOIN_P2SH_VERSION),
        ChainTag::BitcoinCash => bitcoin::cashaddr_address(public_key),
        ChainTag::Litecoin => bitcoin::legacy_address(public_key, bitcoin::LITECOIN_P2PKH_VERSION),
        ChainTag::Dogecoin => bitcoin::legacy_address(public_key, 0x1e),
        ChainTag::Dash => bitcoin::legacy_address(public_key, 0x4c),
        ChainTag::ZcashTransparent => bitcoin::zcash_t_address(public_key),
        ChainTag::Ethereum
        | ChainTag::Polygon
        | ChainTag::BnbSmartChain
        | ChainTag::AvalancheC
        | ChainTag::ArbitrumOne
        | ChainTag::Optimism
        | ChainTag::Base
        | ChainTag::CronosEvm => evm::address(public_key),
        ChainTag::Thorchain => cosmos::bech32_hash160_address(public_key, "thor"),
        ChainTag::CosmosHub => cosmos::bech32_hash160_address(public_key, "cosmos"),
        ChainTag::Kujira => cosmos::bech32_hash160_address(public_key, "kujira"),
        ChainTag::Osmosis => cosmos::bech32_hash160_address(public_key, "osmo"),
        ChainTag::Dydx => cosmos::bech32_hash160_address(public_key, "dydx"),
        ChainTag::Solana => solana::address(public_key),
        ChainTag::Sui => sui::address(public_key),
    }
}

/// Render a derived private scalar in whatever wallet-import format `chain`
/// conventionally uses. `None` when the private scalar is not available, or
/// when the chain has no standard import encoding (hex is then the CLI's
/// own fallback, not this function's job).
pub fn encode_private_key(
    chain: ChainTag,
    private_scalar: &[u8],
    public_key: &[u8],
) -> Result<Option<String>> {
    match chain {
        ChainTag::Solana => {
            // S6: the 64-byte keypair format is scalar ‖ public_key, base64.
            let mut keypair = Vec::with_capacity(64);
            keypair.extend_from_slice(private_scalar);
            keypair.extend_from_slice(public_key);
            use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
            Ok(Some(BASE64.encode(keypair)))
        }
        _ => match chain.wif_version() {
            Some(version) => Ok(Some(bitcoin::wif(private_scalar, version)?)),
            None => Ok(None),
        },
    }
}
