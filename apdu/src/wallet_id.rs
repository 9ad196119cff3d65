// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Wallet identifier APDUs

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, CKB_APDU_CLA};
use crate::helpers::arr;

/// Wallet identifier length
pub const WALLET_ID_LEN: usize = 32;

/// Fetch wallet identifier APDU (zero length request)
///
/// The identifier is stable for a given seed and is used by hosts to
/// recognise a previously paired device.
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct WalletIdReq;

impl ApduStatic for WalletIdReq {
    const CLA: u8 = CKB_APDU_CLA;
    const INS: u8 = Instruction::GetWalletId as u8;
}

/// Wallet identifier response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                           WALLET_ID                           /
/// /                          (32 bytes)                           /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct WalletIdResp {
    /// Seed-derived wallet identifier
    #[encdec(with = "arr")]
    pub id: [u8; WALLET_ID_LEN],
}

impl WalletIdResp {
    /// Create a new [`WalletIdResp`] APDU
    pub fn new(id: [u8; WALLET_ID_LEN]) -> Self {
        Self { id }
    }
}
