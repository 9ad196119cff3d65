// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing APDUs
//!
//! Transaction and message signing are the two variable-length operations and
//! share a chunked framing: payloads are split into [`MAX_CHUNK_LEN`][crate::MAX_CHUNK_LEN]
//! byte frames with stream progress carried in the P1 header byte ([`SignP1`]).
//!
//! Transaction signing streams the serialized annotated transaction directly,
//! the first frame doubling as stream initialisation (P1 `0x00`). Message
//! signing sends a separate init frame carrying the derivation path and
//! display mode, then streams the tagged message. Either way the device sees
//! a strictly ordered stream with a single terminal frame, and only the
//! terminal frame's response carries the signature.

use encdec::{Decode, DecodeOwned, Encode};
use ledger_proto::{ApduHeader, ApduReq};

use super::{ApduError, Instruction, CKB_APDU_CLA};
use crate::path::BipPath;

/// Recoverable signature length: r (32) || s (32) || recovery id (1)
pub const SIGNATURE_LEN: usize = 65;

/// Domain separation tag prefixed to message-signing payloads,
/// distinguishing them from transaction signing
pub const MESSAGE_MAGIC: &[u8; 15] = b"Nervos Message:";

bitflags::bitflags! {
    /// P1 stream markers for chunked signing commands
    pub struct SignP1: u8 {
        /// Frame continues an in-progress stream
        const CONTINUE = 0x01;
        /// Frame terminates the stream, set together with [`SignP1::CONTINUE`]
        const FINAL = 0x80;
    }
}

impl SignP1 {
    /// Marker for the terminal frame of a stream
    pub const fn last() -> Self {
        Self::from_bits_truncate(Self::CONTINUE.bits() | Self::FINAL.bits())
    }
}

/// Transaction signing chunk APDU
///
/// Carries one frame of the serialized annotated transaction. The first
/// frame is sent with an empty P1 (stream start), later frames with
/// [`SignP1::CONTINUE`], and the terminal frame with [`SignP1::last`].
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             DATA                              /
/// /                  (0..=MAX_CHUNK_LEN bytes)                    /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxSignChunk<'a> {
    /// Stream position marker
    pub p1: SignP1,
    /// Frame payload
    pub data: &'a [u8],
}

impl<'a> TxSignChunk<'a> {
    /// Create a new [`TxSignChunk`] APDU
    pub fn new(p1: SignP1, data: &'a [u8]) -> Self {
        Self { p1, data }
    }
}

impl<'a> ApduReq<'a> for TxSignChunk<'a> {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: CKB_APDU_CLA,
            ins: Instruction::SignTransaction as u8,
            p1: self.p1.bits(),
            p2: 0,
        }
    }
}

impl<'a> Encode for TxSignChunk<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.data.len() > crate::MAX_CHUNK_LEN {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.data.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.data.len()].copy_from_slice(self.data);

        Ok(self.data.len())
    }
}

impl<'a> Decode<'a> for TxSignChunk<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        Ok((Self { p1: SignP1::empty(), data: buff }, buff.len()))
    }
}

/// Message signing init APDU
///
/// Opens a message-signing stream: P2 carries the display mode (non-zero to
/// render the message as hex on-device), the data is the path encoding.
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
pub struct MsgSignInit {
    /// Derivation path for the signing key
    pub path: BipPath,
    /// Render the message as hex on-device rather than as text
    pub display_hex: bool,
}

impl MsgSignInit {
    /// Create a new [`MsgSignInit`] APDU
    pub fn new(path: BipPath, display_hex: bool) -> Self {
        Self { path, display_hex }
    }
}

impl<'a> ApduReq<'a> for MsgSignInit {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: CKB_APDU_CLA,
            ins: Instruction::SignMessage as u8,
            p1: SignP1::empty().bits(),
            p2: self.display_hex as u8,
        }
    }
}

impl Encode for MsgSignInit {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        self.path.encode(buff)
    }
}

impl DecodeOwned for MsgSignInit {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        let (path, n) = BipPath::decode_owned(buff)?;
        Ok((Self { path, display_hex: false }, n))
    }
}

/// Message signing chunk APDU
///
/// Carries one frame of the tagged message ([`MESSAGE_MAGIC`] || message).
/// All frames are marked [`SignP1::CONTINUE`] except the terminal frame
/// ([`SignP1::last`]); initialisation is a separate [`MsgSignInit`] frame.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MsgSignChunk<'a> {
    /// Stream position marker
    pub p1: SignP1,
    /// Frame payload
    pub data: &'a [u8],
}

impl<'a> MsgSignChunk<'a> {
    /// Create a new [`MsgSignChunk`] APDU
    pub fn new(p1: SignP1, data: &'a [u8]) -> Self {
        Self { p1, data }
    }
}

impl<'a> ApduReq<'a> for MsgSignChunk<'a> {
    fn header(&self) -> ApduHeader {
        ApduHeader {
            cla: CKB_APDU_CLA,
            ins: Instruction::SignMessage as u8,
            p1: self.p1.bits(),
            p2: 0,
        }
    }
}

impl<'a> Encode for MsgSignChunk<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.data.len() > crate::MAX_CHUNK_LEN {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.data.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.data.len()].copy_from_slice(self.data);

        Ok(self.data.len())
    }
}

impl<'a> Decode<'a> for MsgSignChunk<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        Ok((Self { p1: SignP1::empty(), data: buff }, buff.len()))
    }
}

/// Signing response APDU
///
/// Intermediate frames answer with an empty body; the terminal frame
/// answers with the recoverable signature in the first
/// [`SIGNATURE_LEN`] bytes. Validation of the length is left to the
/// caller so truncated responses surface as protocol errors rather
/// than transport failures.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignResp<'a> {
    /// Raw response body
    pub data: &'a [u8],
}

impl<'a> SignResp<'a> {
    /// Create a new [`SignResp`] APDU
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Encode for SignResp<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.data.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.data.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..self.data.len()].copy_from_slice(self.data);

        Ok(self.data.len())
    }
}

impl<'a> Decode<'a> for SignResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        Ok((Self { data: buff }, buff.len()))
    }
}
