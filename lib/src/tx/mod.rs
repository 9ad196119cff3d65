// Copyright (c) 2022-2023 The MobileCoin Foundation

//! CKB transaction model and annotated-transaction construction
//!
//! The device refuses to sign a bare raw transaction: it needs the full
//! transaction behind every spent input to check values and render a
//! meaningful confirmation prompt. [`AnnotatedTransaction::build`] bundles a
//! raw transaction with those per-input source transactions, the signing and
//! change paths, and the witness set into the structure the device streams
//! and validates.

use ledger_ckb_apdu::path::BipPath;

use crate::Error;

mod codec;

/// Reference to an output of a prior transaction
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct OutPoint {
    /// Hash of the transaction holding the output
    pub tx_hash: [u8; 32],
    /// Output index within that transaction
    pub index: u32,
}

/// Consumed live cell plus its maturity constraint
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CellInput {
    /// Since value gating when the input may be consumed
    pub since: u64,
    /// Output being spent
    pub previous_output: OutPoint,
}

/// Code or dep-group dependency of a transaction
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CellDep {
    /// Cell carrying the dependency
    pub out_point: OutPoint,
    /// Dependency kind (0 code, 1 dep group)
    pub dep_type: u8,
}

/// Lock or type script reference
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Script {
    /// Hash identifying the script code
    pub code_hash: [u8; 32],
    /// Interpretation of `code_hash` (0 data, 1 type)
    pub hash_type: u8,
    /// Script arguments
    pub args: Vec<u8>,
}

/// Newly created cell
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CellOutput {
    /// Capacity in shannon
    pub capacity: u64,
    /// Lock script guarding the cell
    pub lock: Script,
    /// Optional type script
    pub type_script: Option<Script>,
}

/// Raw CKB transaction, caller-owned and read-only to this crate
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RawTransaction {
    pub version: u32,
    pub cell_deps: Vec<CellDep>,
    pub header_deps: Vec<[u8; 32]>,
    pub inputs: Vec<CellInput>,
    pub outputs: Vec<CellOutput>,
    pub outputs_data: Vec<Vec<u8>>,
}

/// Transaction input paired with the full transaction that produced the
/// output it spends, index-aligned with the raw input list
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AnnotatedCellInput {
    pub input: CellInput,
    pub source: RawTransaction,
}

/// Raw transaction with inputs replaced by their annotated form; all other
/// fields pass through untouched
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AnnotatedRawTransaction {
    pub version: u32,
    pub cell_deps: Vec<CellDep>,
    pub header_deps: Vec<[u8; 32]>,
    pub inputs: Vec<AnnotatedCellInput>,
    pub outputs: Vec<CellOutput>,
    pub outputs_data: Vec<Vec<u8>>,
}

/// Signing request streamed to the device
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AnnotatedTransaction {
    /// Path of the key the device signs with
    pub sign_path: BipPath,
    /// Path of the change output key, used for on-device change detection
    pub change_path: BipPath,
    /// Input count, redundant with `raw.inputs` for streaming validation
    pub input_count: u32,
    /// Annotated raw transaction
    pub raw: AnnotatedRawTransaction,
    /// Witness set the signature will be committed into
    pub witnesses: Vec<Vec<u8>>,
}

/// Serialized WitnessArgs with a zeroed 65-byte lock slot, the default
/// witness when a caller supplies none: 16-byte table header (size +
/// three field offsets), then the lock field as a 65-byte item
pub const SIGHASH_WITNESS_PLACEHOLDER: [u8; 85] = {
    let mut w = [0u8; 85];
    w[0] = 0x55; // total size
    w[4] = 0x10; // lock offset
    w[8] = 0x55; // input_type offset (absent)
    w[12] = 0x55; // output_type offset (absent)
    w[16] = 0x41; // lock length
    w
};

impl AnnotatedTransaction {
    /// Build an annotated transaction from a raw transaction and the source
    /// transaction of each input.
    ///
    /// `sources` must hold exactly one transaction per input, in input
    /// order; the pairing is positional. An empty `witnesses` list selects
    /// a single [`SIGHASH_WITNESS_PLACEHOLDER`], and an omitted
    /// `change_path` defaults to `sign_path`.
    pub fn build(
        sign_path: BipPath,
        raw: RawTransaction,
        witnesses: Vec<Vec<u8>>,
        sources: Vec<RawTransaction>,
        change_path: Option<BipPath>,
    ) -> Result<Self, Error> {
        if sources.len() != raw.inputs.len() {
            return Err(Error::MismatchedContext {
                inputs: raw.inputs.len(),
                contexts: sources.len(),
            });
        }

        let witnesses = match witnesses.is_empty() {
            true => vec![SIGHASH_WITNESS_PLACEHOLDER.to_vec()],
            false => witnesses,
        };

        let change_path = change_path.unwrap_or_else(|| sign_path.clone());

        let RawTransaction {
            version,
            cell_deps,
            header_deps,
            inputs,
            outputs,
            outputs_data,
        } = raw;

        let input_count = inputs.len() as u32;

        let inputs = inputs
            .into_iter()
            .zip(sources)
            .map(|(input, source)| AnnotatedCellInput { input, source })
            .collect();

        Ok(Self {
            sign_path,
            change_path,
            input_count,
            raw: AnnotatedRawTransaction {
                version,
                cell_deps,
                header_deps,
                inputs,
                outputs,
                outputs_data,
            },
            witnesses,
        })
    }
}

#[cfg(test)]
mod test {
    use core::str::FromStr;

    use super::*;

    pub(crate) fn test_output() -> CellOutput {
        CellOutput {
            capacity: 100_0000_0000,
            lock: Script {
                code_hash: crate::address::SECP256K1_BLAKE160_CODE_HASH,
                hash_type: 1,
                args: vec![0x11; 20],
            },
            type_script: None,
        }
    }

    pub(crate) fn test_raw_tx() -> RawTransaction {
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
            outputs: vec![test_output()],
            outputs_data: vec![vec![]],
        }
    }

    pub(crate) fn test_source_tx() -> RawTransaction {
        RawTransaction {
            version: 0,
            cell_deps: vec![],
            header_deps: vec![],
            inputs: vec![CellInput {
                since: 0,
                previous_output: OutPoint {
                    tx_hash: [0xcc; 32],
                    index: 0,
                },
            }],
            outputs: vec![test_output()],
            outputs_data: vec![vec![]],
        }
    }

    #[test]
    fn build_defaults() {
        let path = BipPath::from_str("44'/309'/0'/0/0").unwrap();

        let tx = AnnotatedTransaction::build(
            path.clone(),
            test_raw_tx(),
            vec![],
            vec![test_source_tx()],
            None,
        )
        .unwrap();

        // No witnesses supplied: exactly one placeholder
        assert_eq!(tx.witnesses, vec![SIGHASH_WITNESS_PLACEHOLDER.to_vec()]);
        // Change path defaults to the signing path
        assert_eq!(tx.change_path, path);
        assert_eq!(tx.input_count, 1);
        assert_eq!(tx.raw.inputs[0].source, test_source_tx());
    }

    #[test]
    fn build_keeps_explicit_arguments() {
        let sign = BipPath::from_str("44'/309'/0'/0/0").unwrap();
        let change = BipPath::from_str("44'/309'/0'/1/0").unwrap();
        let witness = vec![0xee; 12];

        let tx = AnnotatedTransaction::build(
            sign,
            test_raw_tx(),
            vec![witness.clone()],
            vec![test_source_tx()],
            Some(change.clone()),
        )
        .unwrap();

        assert_eq!(tx.witnesses, vec![witness]);
        assert_eq!(tx.change_path, change);
    }

    #[test]
    fn build_rejects_context_mismatch() {
        let path = BipPath::from_str("44'/309'/0'/0/0").unwrap();

        // One input, zero context transactions
        let r = AnnotatedTransaction::build(path, test_raw_tx(), vec![], vec![], None);

        assert!(matches!(
            r,
            Err(Error::MismatchedContext {
                inputs: 1,
                contexts: 0
            })
        ));
    }

    #[test]
    fn placeholder_witness_layout() {
        // 16-byte WitnessArgs header + 4-byte lock length + 65 zero bytes
        assert_eq!(
            hex::encode(SIGHASH_WITNESS_PLACEHOLDER),
            concat!(
                "5500000010000000550000005500000041000000",
                "00000000000000000000000000000000000000000000000000000000000000000000",
                "00000000000000000000000000000000000000000000000000000000000000"
            ),
        );
    }
}
