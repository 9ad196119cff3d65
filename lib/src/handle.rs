// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for connected ledger devices
//!
//! This provides methods for interacting with the CKB app
//! and is generic over [ledger_lib::Device]

use std::time::Duration;

use async_trait::async_trait;
use ledger_lib::Device;
use ledger_proto::{ApduBase, ApduReq};
use log::debug;

use ledger_ckb_apdu::{
    app_info::{AppGitHashReq, AppGitHashResp, AppVersionReq, AppVersionResp},
    key::{ExtendedPublicKeyReq, ExtendedPublicKeyResp, PublicKeyReq, PublicKeyResp},
    path::BipPath,
    sign::{MsgSignChunk, MsgSignInit, SignP1, SignResp, TxSignChunk, MESSAGE_MAGIC, SIGNATURE_LEN},
    wallet_id::{WalletIdReq, WalletIdResp, WALLET_ID_LEN},
};

use crate::{
    address::{derive_address, AddressInfo, Network, UNCOMPRESSED_KEY_LEN},
    channel::frames,
    tx::{AnnotatedTransaction, RawTransaction},
    Error,
};

/// CKB handle for a connected ledger [Device].
///
/// This is generic over [Device] types to support different
/// underlying transports / providers. Methods take `&mut self`: the device
/// protocol is strictly sequential, so the handle owns the transport and no
/// two operations may overlap.
pub struct DeviceHandle<T: Device> {
    /// Device handle for communication
    t: T,
    /// Timeout for user acknowledgements
    user_timeout_s: usize,
    /// Timeout for APDU requests
    request_timeout_s: usize,
}

/// Create a [DeviceHandle] wrapper from a type implementing [Device]
impl<T: Device> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self {
            t,
            user_timeout_s: 30,
            request_timeout_s: 2,
        }
    }
}

/// Application version triple
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl std::fmt::Display for AppVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Seed-derived wallet identifier
pub type WalletId = [u8; WALLET_ID_LEN];

/// Extended public key (key material plus BIP32 chain code)
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    /// Uncompressed public key
    pub public_key: [u8; UNCOMPRESSED_KEY_LEN],
    /// BIP32 chain code
    pub chain_code: [u8; 32],
}

impl std::fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedPublicKey")
            .field("public_key", &hex::encode(self.public_key))
            .field("chain_code", &hex::encode(self.chain_code))
            .finish()
    }
}

/// Recoverable secp256k1 signature: r (32) || s (32) || recovery id (1)
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    /// Fetch raw signature bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Fetch the recovery id
    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    /// Take a signature from the first [`SIGNATURE_LEN`] bytes of a
    /// terminal-frame response
    fn try_from(data: &[u8]) -> Result<Self, Error> {
        match data.get(..SIGNATURE_LEN) {
            Some(d) => {
                let mut s = [0u8; SIGNATURE_LEN];
                s.copy_from_slice(d);
                Ok(Self(s))
            }
            None => Err(Error::Protocol("signature response too short")),
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl<T: Device + Send> DeviceHandle<T> {
    /// Create a new device handle
    pub fn new(t: T) -> Self {
        Self::from(t)
    }

    /// Borrow the underlying device
    pub fn inner(&self) -> &T {
        &self.t
    }

    /// Unwrap the handle, returning the underlying device
    pub fn into_inner(self) -> T {
        self.t
    }

    /// Helper to fetch user interaction timeout
    fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_s as u64)
    }

    /// Helper to fetch APDU request timeout
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s as u64)
    }

    /// Fetch CKB application version
    pub async fn app_version(&mut self) -> Result<AppVersion, Error> {
        let mut buff = [0u8; 256];

        debug!("Requesting app version");

        let resp = self
            .t
            .request::<AppVersionResp>(AppVersionReq, &mut buff, self.request_timeout())
            .await?;

        Ok(AppVersion {
            major: resp.major,
            minor: resp.minor,
            patch: resp.patch,
        })
    }

    /// Fetch CKB application build (git) hash
    pub async fn app_git_hash(&mut self) -> Result<Vec<u8>, Error> {
        let mut buff = [0u8; 256];

        debug!("Requesting app git hash");

        let resp = self
            .t
            .request::<AppGitHashResp>(AppGitHashReq, &mut buff, self.request_timeout())
            .await?;

        Ok(resp.hash.to_vec())
    }

    /// Fetch the seed-derived wallet identifier
    pub async fn wallet_id(&mut self) -> Result<WalletId, Error> {
        let mut buff = [0u8; 256];

        debug!("Requesting wallet id");

        let resp = self
            .t
            .request::<WalletIdResp>(WalletIdReq, &mut buff, self.request_timeout())
            .await?;

        Ok(resp.id)
    }

    /// Derive the public key for `path` on-device and compute the matching
    /// lock argument and address host-side
    pub async fn address(
        &mut self,
        path: &BipPath,
        network: Network,
    ) -> Result<AddressInfo, Error> {
        let mut buff = [0u8; 256];

        debug!("Requesting public key for path {path}");

        let resp = self
            .t
            .request::<PublicKeyResp>(
                PublicKeyReq::new(path.clone()),
                &mut buff,
                self.user_timeout(),
            )
            .await?;

        let public_key: &[u8; UNCOMPRESSED_KEY_LEN] = resp
            .public_key
            .try_into()
            .map_err(|_| Error::Protocol("unexpected public key length"))?;

        derive_address(public_key, network)
    }

    /// Fetch the extended public key (key + chain code) for `path`
    pub async fn extended_public_key(
        &mut self,
        path: &BipPath,
    ) -> Result<ExtendedPublicKey, Error> {
        let mut buff = [0u8; 256];

        debug!("Requesting extended public key for path {path}");

        let resp = self
            .t
            .request::<ExtendedPublicKeyResp>(
                ExtendedPublicKeyReq::new(path.clone()),
                &mut buff,
                self.user_timeout(),
            )
            .await?;

        let public_key: [u8; UNCOMPRESSED_KEY_LEN] = resp
            .public_key
            .try_into()
            .map_err(|_| Error::Protocol("unexpected public key length"))?;
        let chain_code: [u8; 32] = resp
            .chain_code
            .try_into()
            .map_err(|_| Error::Protocol("unexpected chain code length"))?;

        Ok(ExtendedPublicKey {
            public_key,
            chain_code,
        })
    }

    /// Sign a raw transaction.
    ///
    /// `sources` carries the full transaction behind each input, in input
    /// order. An empty `witnesses` list selects the single placeholder
    /// witness, an omitted `change_path` defaults to `sign_path`.
    pub async fn sign_transaction(
        &mut self,
        sign_path: &BipPath,
        raw: RawTransaction,
        witnesses: Vec<Vec<u8>>,
        sources: Vec<RawTransaction>,
        change_path: Option<&BipPath>,
    ) -> Result<Signature, Error> {
        let tx = AnnotatedTransaction::build(
            sign_path.clone(),
            raw,
            witnesses,
            sources,
            change_path.cloned(),
        )?;

        self.sign_annotated_transaction(&tx).await
    }

    /// Sign a prebuilt annotated transaction.
    ///
    /// The serialized transaction is streamed in order, the first frame
    /// doubling as stream initialisation; the terminal frame's response
    /// carries the signature after on-device confirmation.
    pub async fn sign_annotated_transaction(
        &mut self,
        tx: &AnnotatedTransaction,
    ) -> Result<Signature, Error> {
        let mut buff = [0u8; 256];

        let payload = tx.encode();
        let frames = frames(&payload, SignP1::empty());

        debug!(
            "Signing transaction ({} bytes, {} frames)",
            payload.len(),
            frames.len()
        );

        let mut signature = None;
        for (p1, chunk) in frames {
            let last = p1.contains(SignP1::FINAL);

            // Only the terminal frame waits on user confirmation
            let timeout = match last {
                true => self.user_timeout(),
                false => self.request_timeout(),
            };

            let resp = self
                .t
                .request::<SignResp>(TxSignChunk::new(p1, chunk), &mut buff, timeout)
                .await?;

            if last {
                signature = Some(Signature::try_from(resp.data)?);
            }
        }

        signature.ok_or(Error::Protocol("missing terminal frame response"))
    }

    /// Sign a message with the key at `path`.
    ///
    /// The message is prefixed with the fixed domain tag before signing so
    /// a signed message can never double as a signed transaction.
    /// `display_hex` renders the message as hex on-device rather than text.
    pub async fn sign_message(
        &mut self,
        path: &BipPath,
        message: &[u8],
        display_hex: bool,
    ) -> Result<Signature, Error> {
        let mut buff = [0u8; 256];

        debug!("Signing {} byte message with path {path}", message.len());

        // Init frame: path and display mode
        self.t
            .request::<SignResp>(
                MsgSignInit::new(path.clone(), display_hex),
                &mut buff,
                self.request_timeout(),
            )
            .await?;

        // Tagged payload, streamed as continuations of the init frame
        let mut payload = Vec::with_capacity(MESSAGE_MAGIC.len() + message.len());
        payload.extend_from_slice(MESSAGE_MAGIC);
        payload.extend_from_slice(message);

        let mut signature = None;
        for (p1, chunk) in frames(&payload, SignP1::CONTINUE) {
            let last = p1.contains(SignP1::FINAL);

            let timeout = match last {
                true => self.user_timeout(),
                false => self.request_timeout(),
            };

            let resp = self
                .t
                .request::<SignResp>(MsgSignChunk::new(p1, chunk), &mut buff, timeout)
                .await?;

            if last {
                signature = Some(Signature::try_from(resp.data)?);
            }
        }

        signature.ok_or(Error::Protocol("missing terminal frame response"))
    }
}

/// Re-export [Device] trait for CKB [DeviceHandle]
#[async_trait]
impl<T: Device + Send> Device for DeviceHandle<T> {
    async fn request<'a, 'b, RESP: ApduBase<'b>>(
        &mut self,
        request: impl ApduReq<'a> + Send,
        buff: &'b mut [u8],
        timeout: Duration,
    ) -> Result<RESP, ledger_lib::Error> {
        self.t.request(request, buff, timeout).await
    }
}
