// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application information APDUs

use core::fmt::{self, Display};

use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, CKB_APDU_CLA};

/// Fetch application version APDU (zero length request)
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AppVersionReq;

impl ApduStatic for AppVersionReq {
    const CLA: u8 = CKB_APDU_CLA;
    const INS: u8 = Instruction::GetAppVersion as u8;
}

/// Application version response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AppVersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl AppVersionResp {
    /// Create a new [`AppVersionResp`] APDU
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Display for AppVersionResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fetch application build hash APDU (zero length request)
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AppGitHashReq;

impl ApduStatic for AppGitHashReq {
    const CLA: u8 = CKB_APDU_CLA;
    const INS: u8 = Instruction::GetAppGitHash as u8;
}

/// Application build hash response APDU, carries the raw git revision
/// bytes of the running app
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AppGitHashResp<'a> {
    pub hash: &'a [u8],
}

impl<'a> AppGitHashResp<'a> {
    /// Create a new [`AppGitHashResp`] APDU
    pub fn new(hash: &'a [u8]) -> Self {
        Self { hash }
    }
}

impl<'a> Encode for AppGitHashResp<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.hash.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.hash.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.hash.len()].copy_from_slice(self.hash);

        Ok(self.hash.len())
    }
}

impl<'a> Decode<'a> for AppGitHashResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        Ok((Self { hash: buff }, buff.len()))
    }
}
