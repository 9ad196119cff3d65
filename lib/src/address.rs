// Copyright (c) 2022-2023 The MobileCoin Foundation

//! CKB address derivation
//!
//! Turns a device-returned uncompressed secp256k1 public key into the
//! blake160 lock argument and a full bech32m address: compress the key,
//! digest it with CKB's personalized blake2b, then wrap the standard
//! secp256k1/blake160 lock script reference in the checksummed text format.

use bech32::{ToBase32, Variant};
use blake2b_rs::{Blake2b, Blake2bBuilder};

use crate::Error;

/// Mainnet human readable address prefix
pub const PREFIX_MAINNET: &str = "ckb";
/// Testnet human readable address prefix
pub const PREFIX_TESTNET: &str = "ckt";

/// Personalization tag for CKB's default blake2b instance
const CKB_HASH_PERSONALIZATION: &[u8] = b"ckb-default-hash";

/// Code hash of the genesis secp256k1/blake160 sighash lock script,
/// referenced by `hash_type` "type" (0x01) in every derived address
pub const SECP256K1_BLAKE160_CODE_HASH: [u8; 32] = [
    0x9b, 0xd7, 0xe0, 0x6f, 0x3e, 0xcf, 0x4b, 0xe0, 0xf2, 0xfc, 0xd2, 0x18, 0x8b, 0x23, 0xf1,
    0xb9, 0xfc, 0xc8, 0x8e, 0x5d, 0x4b, 0x65, 0xa8, 0x63, 0x7b, 0x17, 0x72, 0x3b, 0xbd, 0xa3,
    0xcc, 0xe8,
];

/// Full address format byte (versioned address carrying a complete script)
const FORMAT_FULL: u8 = 0x00;

/// Script hash type byte, "type" (the code hash above is a type id)
const HASH_TYPE_TYPE: u8 = 0x01;

pub use ledger_ckb_apdu::key::UNCOMPRESSED_KEY_LEN;

/// Lock argument length (truncated blake2b digest, "blake160")
pub const LOCK_ARG_LEN: usize = 20;

/// CKB network selector, discriminates address prefixes only
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Fetch the bech32m prefix for this network
    pub fn to_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => PREFIX_MAINNET,
            Network::Testnet => PREFIX_TESTNET,
        }
    }

    /// Resolve a network from an address prefix
    pub fn from_prefix(value: &str) -> Option<Network> {
        match value {
            PREFIX_MAINNET => Some(Network::Mainnet),
            PREFIX_TESTNET => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// Derived address information
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AddressInfo {
    /// Uncompressed public key the address was derived from
    pub public_key: [u8; UNCOMPRESSED_KEY_LEN],
    /// blake160 of the compressed public key, the lock script argument
    pub lock_arg: [u8; LOCK_ARG_LEN],
    /// bech32m address string
    pub address: String,
}

/// Construct CKB's default blake2b instance (256-bit, personalized)
fn new_blake2b() -> Blake2b {
    Blake2bBuilder::new(32)
        .personal(CKB_HASH_PERSONALIZATION)
        .build()
}

/// Compress a SEC1 uncompressed public key, prefix byte by Y parity
pub(crate) fn compress_public_key(public_key: &[u8; UNCOMPRESSED_KEY_LEN]) -> [u8; 33] {
    let mut compressed = [0u8; 33];

    compressed[0] = match public_key[64] & 1 {
        0 => 0x02,
        _ => 0x03,
    };
    compressed[1..].copy_from_slice(&public_key[1..33]);

    compressed
}

/// blake160: first 20 bytes of the personalized blake2b-256 digest
pub(crate) fn blake160(data: &[u8]) -> [u8; LOCK_ARG_LEN] {
    let mut digest = [0u8; 32];

    let mut hasher = new_blake2b();
    hasher.update(data);
    hasher.finalize(&mut digest);

    let mut arg = [0u8; LOCK_ARG_LEN];
    arg.copy_from_slice(&digest[..LOCK_ARG_LEN]);
    arg
}

/// Derive the lock argument and address for an uncompressed public key
///
/// Deterministic per network; mainnet and testnet addresses for the same
/// key differ in prefix and checksum only.
pub fn derive_address(
    public_key: &[u8; UNCOMPRESSED_KEY_LEN],
    network: Network,
) -> Result<AddressInfo, Error> {
    let lock_arg = blake160(&compress_public_key(public_key));

    // format byte || code hash || hash type || args
    let mut payload = Vec::with_capacity(2 + SECP256K1_BLAKE160_CODE_HASH.len() + LOCK_ARG_LEN);
    payload.push(FORMAT_FULL);
    payload.extend_from_slice(&SECP256K1_BLAKE160_CODE_HASH);
    payload.push(HASH_TYPE_TYPE);
    payload.extend_from_slice(&lock_arg);

    let address = bech32::encode(network.to_prefix(), payload.to_base32(), Variant::Bech32m)?;

    Ok(AddressInfo {
        public_key: *public_key,
        lock_arg,
        address,
    })
}
