// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ledger Nervos CKB API Library
//!
//! Host-side interface to the CKB hardware wallet application: address
//! derivation, extended public keys, and transaction / message signing,
//! generic over [`ledger_lib::Device`] transports. Private keys never leave
//! the device; signing operations stream an annotated transaction (raw
//! transaction plus per-input source context) so the device can render an
//! intelligible confirmation prompt.
//!
//! Connect to a device with [`ledger_lib::LedgerProvider`] (or any other
//! [`Device`] implementation), wrap it in a [`DeviceHandle`], and drive the
//! operations from there. One operation at a time per handle; the device
//! protocol is strictly sequential.

/// Re-export `ledger-lib` for transport access
pub use ledger_lib::{self, Device};

/// Re-export `ledger-ckb-apdu` for consumers
pub use ledger_ckb_apdu::{self as apdu, path::BipPath};

mod error;
pub use error::Error;

mod handle;
pub use handle::{AppVersion, DeviceHandle, ExtendedPublicKey, Signature, WalletId};

/// Generic device handle (abstract over transport types)
pub type GenericHandle = DeviceHandle<ledger_lib::transport::GenericDevice>;

mod address;
pub use address::{derive_address, AddressInfo, Network, SECP256K1_BLAKE160_CODE_HASH};

pub mod tx;

mod channel;
