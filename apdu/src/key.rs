// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Public key derivation APDUs
//!
//! The device returns SEC1 uncompressed secp256k1 keys, length-prefixed so
//! hosts can parse responses without magic offsets. Compression and address
//! derivation happen host-side.

use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, CKB_APDU_CLA};
use crate::path::BipPath;

/// SEC1 uncompressed public key length
pub const UNCOMPRESSED_KEY_LEN: usize = 65;

/// BIP32 chain code length
pub const CHAIN_CODE_LEN: usize = 32;

/// Public key request APDU
///
/// Requests the uncompressed public key for the provided derivation path.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   NUM_COMPS   |                COMPONENT_0...                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                  (4 big-endian bytes each)                    /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct PublicKeyReq {
    /// Derivation path for the requested key
    pub path: BipPath,
}

impl PublicKeyReq {
    /// Create a new [`PublicKeyReq`] APDU
    pub fn new(path: BipPath) -> Self {
        Self { path }
    }
}

impl ApduStatic for PublicKeyReq {
    const CLA: u8 = CKB_APDU_CLA;
    const INS: u8 = Instruction::GetPublicKey as u8;
}

impl Encode for PublicKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for PublicKeyReq {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        let (path, n) = BipPath::decode_owned(buff)?;
        Ok((Self { path }, n))
    }
}

/// Public key response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    KEY_LEN    |                 PUBLIC_KEY...                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /              (SEC1 uncompressed, KEY_LEN bytes)               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PublicKeyResp<'a> {
    /// Uncompressed public key
    pub public_key: &'a [u8],
}

impl<'a> PublicKeyResp<'a> {
    /// Create a new [`PublicKeyResp`] APDU
    pub fn new(public_key: &'a [u8]) -> Self {
        Self { public_key }
    }
}

impl<'a> Encode for PublicKeyResp<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.public_key.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.public_key.len() > u8::MAX as usize {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < 1 + self.public_key.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.public_key.len() as u8;
        buff[1..][..self.public_key.len()].copy_from_slice(self.public_key);

        Ok(1 + self.public_key.len())
    }
}

impl<'a> Decode<'a> for PublicKeyResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let key_len = buff[0] as usize;
        if buff.len() < 1 + key_len {
            return Err(ApduError::InvalidLength);
        }

        Ok((
            Self {
                public_key: &buff[1..][..key_len],
            },
            1 + key_len,
        ))
    }
}

/// Extended public key request APDU, encoding matches [`PublicKeyReq`]
#[derive(Clone, PartialEq, Debug)]
pub struct ExtendedPublicKeyReq {
    /// Derivation path for the requested key
    pub path: BipPath,
}

impl ExtendedPublicKeyReq {
    /// Create a new [`ExtendedPublicKeyReq`] APDU
    pub fn new(path: BipPath) -> Self {
        Self { path }
    }
}

impl ApduStatic for ExtendedPublicKeyReq {
    const CLA: u8 = CKB_APDU_CLA;
    const INS: u8 = Instruction::GetExtendedPublicKey as u8;
}

impl Encode for ExtendedPublicKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for ExtendedPublicKeyReq {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        let (path, n) = BipPath::decode_owned(buff)?;
        Ok((Self { path }, n))
    }
}

/// Extended public key response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    KEY_LEN    |                 PUBLIC_KEY...                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /              (SEC1 uncompressed, KEY_LEN bytes)               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          CHAIN_CODE                           /
/// /                          (32 bytes)                           /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ExtendedPublicKeyResp<'a> {
    /// Uncompressed public key
    pub public_key: &'a [u8],
    /// BIP32 chain code
    pub chain_code: &'a [u8],
}

impl<'a> ExtendedPublicKeyResp<'a> {
    /// Create a new [`ExtendedPublicKeyResp`] APDU
    pub fn new(public_key: &'a [u8], chain_code: &'a [u8]) -> Self {
        Self {
            public_key,
            chain_code,
        }
    }
}

impl<'a> Encode for ExtendedPublicKeyResp<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.public_key.len() + self.chain_code.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.public_key.len() > u8::MAX as usize || self.chain_code.len() != CHAIN_CODE_LEN {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < 1 + self.public_key.len() + CHAIN_CODE_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[index] = self.public_key.len() as u8;
        index += 1;

        buff[index..][..self.public_key.len()].copy_from_slice(self.public_key);
        index += self.public_key.len();

        buff[index..][..CHAIN_CODE_LEN].copy_from_slice(self.chain_code);
        index += CHAIN_CODE_LEN;

        Ok(index)
    }
}

impl<'a> Decode<'a> for ExtendedPublicKeyResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let key_len = buff[0] as usize;
        if buff.len() < 1 + key_len + CHAIN_CODE_LEN {
            return Err(ApduError::InvalidLength);
        }

        Ok((
            Self {
                public_key: &buff[1..][..key_len],
                chain_code: &buff[1 + key_len..][..CHAIN_CODE_LEN],
            },
            1 + key_len + CHAIN_CODE_LEN,
        ))
    }
}
