// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Prelude for commonly used APDU types

pub use crate::app_info::{AppGitHashReq, AppGitHashResp, AppVersionReq, AppVersionResp};
pub use crate::key::{
    ExtendedPublicKeyReq, ExtendedPublicKeyResp, PublicKeyReq, PublicKeyResp, CHAIN_CODE_LEN,
    UNCOMPRESSED_KEY_LEN,
};
pub use crate::path::{BipPath, PathError, HARDENED};
pub use crate::sign::{
    MsgSignChunk, MsgSignInit, SignP1, SignResp, TxSignChunk, MESSAGE_MAGIC, SIGNATURE_LEN,
};
pub use crate::wallet_id::{WalletIdReq, WalletIdResp, WALLET_ID_LEN};
pub use crate::{Instruction, CKB_APDU_CLA, MAX_CHUNK_LEN};
