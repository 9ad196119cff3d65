// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Message signing: init frame, domain tag and chunked streaming

use std::str::FromStr;

use ledger_ckb::{
    apdu::{path::BipPath, sign::MESSAGE_MAGIC, MAX_CHUNK_LEN},
    DeviceHandle,
};

mod helpers;
use helpers::{setup, MockDevice};

fn path() -> BipPath {
    BipPath::from_str("44'/309'/0'/0/0").unwrap()
}

#[tokio::test]
async fn sign_message_short() {
    setup();

    let signature = [0x77u8; 65];
    let mut d = DeviceHandle::from(MockDevice::new([vec![], signature.to_vec()]));

    let sig = d.sign_message(&path(), b"hello ckb", false).await.unwrap();
    assert_eq!(sig.as_bytes(), &signature);

    let frames = &d.inner().frames;
    assert_eq!(frames.len(), 2);

    // Init frame: path encoding, display mode in P2
    let init = &frames[0];
    assert_eq!((init.cla, init.ins, init.p1, init.p2), (0x80, 0x06, 0x00, 0x00));
    assert_eq!(
        hex::encode(&init.data),
        "058000002c80000135800000000000000000000000"
    );

    // Single terminal data frame carrying the tagged message
    let data = &frames[1];
    assert_eq!(data.p1, 0x81);

    let mut expected = MESSAGE_MAGIC.to_vec();
    expected.extend_from_slice(b"hello ckb");
    assert_eq!(data.data, expected);
}

#[tokio::test]
async fn sign_message_display_hex_flag() {
    setup();

    let mut d = DeviceHandle::from(MockDevice::new([vec![], vec![0u8; 65]]));

    d.sign_message(&path(), &[0xde, 0xad], true).await.unwrap();

    assert_eq!(d.inner().frames[0].p2, 0x01);
}

#[tokio::test]
async fn sign_message_multi_chunk() {
    setup();

    let message = vec![0x61u8; 500];
    let tagged_len = MESSAGE_MAGIC.len() + message.len();
    let chunks = tagged_len.div_ceil(MAX_CHUNK_LEN);
    assert_eq!(chunks, 3);

    let mut responses = vec![vec![]; 1 + chunks - 1];
    responses.push(vec![0x33u8; 65]);

    let mut d = DeviceHandle::from(MockDevice::new(responses));

    d.sign_message(&path(), &message, false).await.unwrap();

    let frames = &d.inner().frames;
    assert_eq!(frames.len(), 1 + chunks);

    // All data frames are continuations, terminal frame marked final
    assert_eq!(frames[1].p1, 0x01);
    assert_eq!(frames[2].p1, 0x01);
    assert_eq!(frames[3].p1, 0x81);

    // Reassembled stream is the tagged message
    let sent: Vec<u8> = frames[1..].iter().flat_map(|f| f.data.clone()).collect();
    assert_eq!(&sent[..MESSAGE_MAGIC.len()], MESSAGE_MAGIC);
    assert_eq!(&sent[MESSAGE_MAGIC.len()..], message);
}
