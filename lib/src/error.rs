// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_ckb_apdu::path::PathError;

/// Ledger CKB API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed derivation path
    #[error("invalid derivation path: {0}")]
    InvalidPath(PathError),

    /// Per-input context transactions do not line up with transaction inputs
    #[error("context transaction count mismatch (inputs: {inputs}, contexts: {contexts})")]
    MismatchedContext {
        /// Number of inputs in the transaction being signed
        inputs: usize,
        /// Number of context transactions supplied
        contexts: usize,
    },

    /// Transport failure, passed through from the underlying device link
    #[error("transport error: {0}")]
    Transport(#[from] ledger_lib::Error),

    /// Response or payload too short / malformed for a required fixed field
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// Address text encoding failed
    #[error("address encoding failed: {0}")]
    Encoding(#[from] bech32::Error),
}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Self::InvalidPath(e)
    }
}
