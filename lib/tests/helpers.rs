// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Shared test helpers: logging setup, a scripted in-memory [`Device`]
//! standing in for a simulator, and sample transaction fixtures.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use encdec::{Decode, Encode};
use log::LevelFilter;
use simplelog::SimpleLogger;

use ledger_ckb::ledger_lib::{self, Device};
use ledger_ckb::tx::{CellDep, CellInput, CellOutput, OutPoint, RawTransaction, Script};
use ledger_proto::{ApduBase, ApduReq};

/// Setup test logging
pub fn setup() {
    let _ = SimpleLogger::init(LevelFilter::Debug, simplelog::Config::default());
}

/// One recorded request frame
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

/// Scripted in-memory device: records every frame sent and answers each
/// exchange with the next queued response body
#[derive(Default)]
pub struct MockDevice {
    pub frames: Vec<Frame>,
    pub responses: VecDeque<Vec<u8>>,
}

impl MockDevice {
    pub fn new(responses: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            frames: vec![],
            responses: responses.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn request<'a, 'b, RESP: ApduBase<'b>>(
        &mut self,
        request: impl ApduReq<'a> + Send,
        buff: &'b mut [u8],
        _timeout: Duration,
    ) -> Result<RESP, ledger_lib::Error> {
        let header = request.header();

        let mut data = [0u8; 256];
        let n = request.encode(&mut data).expect("request encode failed");

        self.frames.push(Frame {
            cla: header.cla,
            ins: header.ins,
            p1: header.p1,
            p2: header.p2,
            data: data[..n].to_vec(),
        });

        let resp = self.responses.pop_front().expect("unscripted exchange");

        let (body, _) = buff.split_at_mut(resp.len());
        body.copy_from_slice(&resp);

        let (decoded, _) = RESP::decode(body).expect("response decode failed");

        Ok(decoded)
    }
}

/// One-input / one-output transaction used across signing tests
pub fn sample_raw_tx() -> RawTransaction {
    RawTransaction {
        version: 0,
        cell_deps: vec![CellDep {
            out_point: OutPoint {
                tx_hash: [0xaa; 32],
                index: 0,
            },
            dep_type: 1,
        }],
        header_deps: vec![],
        inputs: vec![CellInput {
            since: 0,
            previous_output: OutPoint {
                tx_hash: [0xbb; 32],
                index: 1,
            },
        }],
        outputs: vec![CellOutput {
            capacity: 100_0000_0000,
            lock: Script {
                code_hash: [0x9b; 32],
                hash_type: 1,
                args: vec![0x11; 20],
            },
            type_script: None,
        }],
        outputs_data: vec![vec![]],
    }
}

/// Source transaction producing the output spent by [`sample_raw_tx`]
pub fn sample_source_tx() -> RawTransaction {
    RawTransaction {
        inputs: vec![CellInput {
            since: 0,
            previous_output: OutPoint {
                tx_hash: [0xcc; 32],
                index: 0,
            },
        }],
        ..sample_raw_tx()
    }
}
