// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Nervos CKB app communication
//!
//! This module provides a protocol specification and reference implementation for communication
//! with the CKB hardware wallet application.
//!
//! APDUs use a primitive binary encoding to simplify implementation with unsupported languages
//! and platforms. Derivation paths are encoded big-endian as expected by the on-device parser;
//! everything travelling inside a serialized transaction payload follows the schema encoding of
//! the transaction itself and is out of scope here.
//!
//! Variable-length operations (transaction and message signing) are streamed to the device in
//! [`MAX_CHUNK_LEN`]-byte frames, with stream progress signalled via the P1 header byte, see
//! [`sign::SignP1`].

#![no_std]

extern crate alloc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod app_info;
pub mod key;
pub mod path;
pub mod prelude;
pub mod sign;
pub mod wallet_id;

mod helpers;

/// Nervos CKB APDU Class
pub const CKB_APDU_CLA: u8 = 0x80;

/// Maximum data length per signing frame, chosen to stay under the
/// per-exchange APDU payload ceiling while leaving header room
pub const MAX_CHUNK_LEN: usize = 230;

/// Nervos CKB APDU instruction codes
#[derive(
    Copy, Clone, Debug, PartialEq, IntoPrimitive, TryFromPrimitive, strum::Display, strum::EnumIter,
)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    GetAppVersion = 0x00,

    /// Fetch wallet identifier
    GetWalletId = 0x01,

    /// Derive a public key for a BIP32 path
    GetPublicKey = 0x02,

    /// Sign an annotated transaction (chunked)
    SignTransaction = 0x03,

    /// Fetch an extended public key (key + chain code) for a BIP32 path
    GetExtendedPublicKey = 0x04,

    /// Sign a tagged message (chunked)
    SignMessage = 0x06,

    /// Fetch application build (git) hash
    GetAppGitHash = 0x09,
}
