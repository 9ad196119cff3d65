// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transaction signing: annotation, framing and signature extraction

use std::str::FromStr;

use ledger_ckb::{
    apdu::{path::BipPath, MAX_CHUNK_LEN},
    tx::AnnotatedTransaction,
    DeviceHandle, Error,
};

mod helpers;
use helpers::{sample_raw_tx, sample_source_tx, setup, MockDevice};

fn path() -> BipPath {
    BipPath::from_str("44'/309'/0'/0/0").unwrap()
}

fn annotated() -> AnnotatedTransaction {
    AnnotatedTransaction::build(
        path(),
        sample_raw_tx(),
        vec![],
        vec![sample_source_tx()],
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn sign_transaction_streams_ordered_frames() {
    setup();

    let payload = annotated().encode();
    let frame_count = payload.len().div_ceil(MAX_CHUNK_LEN);
    assert!(frame_count > 1, "fixture must span multiple frames");

    // Intermediate frames answer empty, the terminal frame with a signature
    let signature = [0x5au8; 65];
    let mut responses = vec![vec![]; frame_count - 1];
    responses.push(signature.to_vec());

    let mut d = DeviceHandle::from(MockDevice::new(responses));

    let sig = d
        .sign_transaction(
            &path(),
            sample_raw_tx(),
            vec![],
            vec![sample_source_tx()],
            None,
        )
        .await
        .unwrap();
    assert_eq!(sig.as_bytes(), &signature);

    let frames = &d.inner().frames;
    assert_eq!(frames.len(), frame_count);

    // Class / instruction / marker sequence: start, continue*, final
    for (i, f) in frames.iter().enumerate() {
        assert_eq!((f.cla, f.ins), (0x80, 0x03));
        let expected_p1 = match (i, i + 1 == frames.len()) {
            (_, true) => 0x81,
            (0, false) => 0x00,
            _ => 0x01,
        };
        assert_eq!(f.p1, expected_p1, "frame {i}");
    }

    // Frames reassemble to the serialized annotated transaction
    let sent: Vec<u8> = frames.iter().flat_map(|f| f.data.clone()).collect();
    assert_eq!(sent, payload);

    for f in &frames[..frames.len() - 1] {
        assert_eq!(f.data.len(), MAX_CHUNK_LEN);
    }
}

#[tokio::test]
async fn sign_annotated_transaction_prebuilt() {
    setup();

    let tx = annotated();
    let frame_count = tx.encode().len().div_ceil(MAX_CHUNK_LEN);

    let mut responses = vec![vec![]; frame_count - 1];
    responses.push(vec![0x11u8; 70]);

    let mut d = DeviceHandle::from(MockDevice::new(responses));

    // Longer responses are fine, the signature is the first 65 bytes
    let sig = d.sign_annotated_transaction(&tx).await.unwrap();
    assert_eq!(sig.as_bytes(), &[0x11u8; 65]);
    assert_eq!(sig.recovery_id(), 0x11);
}

#[tokio::test]
async fn sign_transaction_context_mismatch() {
    setup();

    let mut d = DeviceHandle::from(MockDevice::default());

    // One input but no context transactions: refused before any exchange
    let r = d
        .sign_transaction(&path(), sample_raw_tx(), vec![], vec![], None)
        .await;

    assert!(matches!(
        r,
        Err(Error::MismatchedContext {
            inputs: 1,
            contexts: 0
        })
    ));
    assert!(d.inner().frames.is_empty());
}

#[tokio::test]
async fn sign_transaction_short_signature_response() {
    setup();

    let tx = annotated();
    let frame_count = tx.encode().len().div_ceil(MAX_CHUNK_LEN);

    // Terminal response shorter than a signature
    let mut responses = vec![vec![]; frame_count - 1];
    responses.push(vec![0xee; 64]);

    let mut d = DeviceHandle::from(MockDevice::new(responses));

    let r = d.sign_annotated_transaction(&tx).await;
    assert!(matches!(r, Err(Error::Protocol(_))));
}
