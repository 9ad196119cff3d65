// Copyright (c) 2022-2023 The MobileCoin Foundation

//! BIP32 derivation path codec
//!
//! Paths are parsed from the usual `44'/309'/0'/0/0` notation (or accepted as
//! pre-built component lists) and carried over the wire as one length byte
//! followed by four big-endian bytes per component, the header encoding shared
//! by key derivation, extended-key retrieval and both signing operations.

use alloc::vec::Vec;
use core::fmt::{self, Display};
use core::str::FromStr;

use byteorder::{BigEndian, ByteOrder};
use encdec::{DecodeOwned, Encode};

use crate::ApduError;

/// Hardened derivation marker, set on the high bit of a component
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum component count representable in the one-byte length prefix
pub const MAX_PATH_COMPONENTS: usize = 255;

/// BIP32 derivation path
///
/// Immutable once built, components carry the [`HARDENED`] bit where marked.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BipPath {
    components: Vec<u32>,
}

/// Path parsing / construction errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PathError {
    /// Path contains no components
    Empty,
    /// Segment is not a decimal number
    InvalidComponent,
    /// Hardening marker in a position other than the segment end
    MisplacedHardening,
    /// Component value does not fit in 31 bits prior to hardening
    ComponentOverflow,
    /// More components than the length prefix can carry
    TooManyComponents,
}

impl Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => write!(f, "empty derivation path"),
            PathError::InvalidComponent => write!(f, "non-numeric path component"),
            PathError::MisplacedHardening => write!(f, "misplaced hardening marker"),
            PathError::ComponentOverflow => write!(f, "path component out of range"),
            PathError::TooManyComponents => {
                write!(f, "more than {MAX_PATH_COMPONENTS} path components")
            }
        }
    }
}

impl BipPath {
    /// Build a path from raw components (hardened bits already applied)
    pub fn new(components: Vec<u32>) -> Result<Self, PathError> {
        if components.is_empty() {
            return Err(PathError::Empty);
        }
        if components.len() > MAX_PATH_COMPONENTS {
            return Err(PathError::TooManyComponents);
        }

        Ok(Self { components })
    }

    /// Fetch path components
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Encoded length on the wire (length prefix plus four bytes per component)
    pub fn encoded_len(&self) -> usize {
        1 + self.components.len() * 4
    }
}

impl FromStr for BipPath {
    type Err = PathError;

    /// Parse a path from `44'/309'/0'/0/0` notation, `m/` prefix optional,
    /// `'` or `h` marking hardened components
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("m/").unwrap_or(s);
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let mut components = Vec::new();
        for segment in s.split('/') {
            let (digits, hardened) = match segment.strip_suffix(['\'', 'h']) {
                Some(d) => (d, true),
                None => (segment, false),
            };

            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                // Distinguish a stray marker from plain garbage
                match digits.contains(['\'', 'h']) {
                    true => return Err(PathError::MisplacedHardening),
                    false => return Err(PathError::InvalidComponent),
                }
            }

            let v: u32 = digits.parse().map_err(|_| PathError::ComponentOverflow)?;
            if v >= HARDENED {
                return Err(PathError::ComponentOverflow);
            }

            components.push(if hardened { v | HARDENED } else { v });
        }

        Self::new(components)
    }
}

impl TryFrom<&[u32]> for BipPath {
    type Error = PathError;

    fn try_from(components: &[u32]) -> Result<Self, Self::Error> {
        Self::new(components.to_vec())
    }
}

impl TryFrom<Vec<u32>> for BipPath {
    type Error = PathError;

    fn try_from(components: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(components)
    }
}

impl Display for BipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i != 0 {
                write!(f, "/")?;
            }
            match c & HARDENED {
                0 => write!(f, "{c}")?,
                _ => write!(f, "{}'", c & !HARDENED)?,
            }
        }
        Ok(())
    }
}

impl Encode for BipPath {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.encoded_len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encoded_len() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.components.len() as u8;

        let mut index = 1;
        for c in &self.components {
            BigEndian::write_u32(&mut buff[index..][..4], *c);
            index += 4;
        }

        Ok(index)
    }
}

impl DecodeOwned for BipPath {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let count = buff[0] as usize;
        if buff.len() < 1 + count * 4 {
            return Err(ApduError::InvalidLength);
        }

        let mut components = Vec::with_capacity(count);
        let mut index = 1;
        for _ in 0..count {
            components.push(BigEndian::read_u32(&buff[index..][..4]));
            index += 4;
        }

        match Self::new(components) {
            Ok(p) => Ok((p, index)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}
