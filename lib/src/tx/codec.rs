// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Molecule-layout transaction codec
//!
//! The device consumes the annotated transaction in the molecule encoding of
//! its schema: numbers little-endian, fixed-size vectors as a count header
//! plus items, variable-size vectors and tables as a total size followed by
//! per-item offsets. Only the structures this crate streams or accepts are
//! implemented; decoding is offset-checked throughout and surfaces any
//! out-of-range access as [`Error::Protocol`] rather than slicing blindly.

use byteorder::{ByteOrder, LittleEndian};

use ledger_ckb_apdu::path::BipPath;

use super::{
    AnnotatedCellInput, AnnotatedRawTransaction, AnnotatedTransaction, CellDep, CellInput,
    CellOutput, OutPoint, RawTransaction, Script,
};
use crate::Error;

/// Serialized size of an `OutPoint` (tx hash + index)
const OUT_POINT_LEN: usize = 36;
/// Serialized size of a `CellInput` (since + out point)
const CELL_INPUT_LEN: usize = 44;
/// Serialized size of a `CellDep` (out point + dep type)
const CELL_DEP_LEN: usize = 37;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn put_u32(out: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, v);
    out.extend_from_slice(&b);
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    let mut b = [0u8; 8];
    LittleEndian::write_u64(&mut b, v);
    out.extend_from_slice(&b);
}

/// Assemble a table / dynvec: total size, one offset per field, fields
fn offset_block(fields: &[Vec<u8>]) -> Vec<u8> {
    let header = 4 + 4 * fields.len();
    let total = header + fields.iter().map(Vec::len).sum::<usize>();

    let mut out = Vec::with_capacity(total);
    put_u32(&mut out, total as u32);

    let mut offset = header;
    for f in fields {
        put_u32(&mut out, offset as u32);
        offset += f.len();
    }
    for f in fields {
        out.extend_from_slice(f);
    }

    out
}

/// Assemble a fixvec: item count then items
fn fixvec(count: usize, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    put_u32(&mut out, count as u32);
    out.extend_from_slice(body);
    out
}

/// `Bytes` is a fixvec of single bytes
fn bytes(data: &[u8]) -> Vec<u8> {
    fixvec(data.len(), data)
}

fn encode_out_point(out: &mut Vec<u8>, op: &OutPoint) {
    out.extend_from_slice(&op.tx_hash);
    put_u32(out, op.index);
}

fn encode_cell_input(out: &mut Vec<u8>, input: &CellInput) {
    put_u64(out, input.since);
    encode_out_point(out, &input.previous_output);
}

fn encode_cell_deps(deps: &[CellDep]) -> Vec<u8> {
    let mut body = Vec::with_capacity(deps.len() * CELL_DEP_LEN);
    for d in deps {
        encode_out_point(&mut body, &d.out_point);
        body.push(d.dep_type);
    }
    fixvec(deps.len(), &body)
}

fn encode_header_deps(deps: &[[u8; 32]]) -> Vec<u8> {
    let mut body = Vec::with_capacity(deps.len() * 32);
    for d in deps {
        body.extend_from_slice(d);
    }
    fixvec(deps.len(), &body)
}

fn encode_inputs(inputs: &[CellInput]) -> Vec<u8> {
    let mut body = Vec::with_capacity(inputs.len() * CELL_INPUT_LEN);
    for i in inputs {
        encode_cell_input(&mut body, i);
    }
    fixvec(inputs.len(), &body)
}

fn encode_script(s: &Script) -> Vec<u8> {
    offset_block(&[s.code_hash.to_vec(), vec![s.hash_type], bytes(&s.args)])
}

fn encode_output(o: &CellOutput) -> Vec<u8> {
    let mut capacity = Vec::with_capacity(8);
    put_u64(&mut capacity, o.capacity);

    let type_script = match &o.type_script {
        Some(s) => encode_script(s),
        None => vec![],
    };

    offset_block(&[capacity, encode_script(&o.lock), type_script])
}

fn encode_outputs(outputs: &[CellOutput]) -> Vec<u8> {
    let items: Vec<_> = outputs.iter().map(encode_output).collect();
    offset_block(&items)
}

fn encode_outputs_data(data: &[Vec<u8>]) -> Vec<u8> {
    let items: Vec<_> = data.iter().map(|d| bytes(d)).collect();
    offset_block(&items)
}

/// `Bip32` is a fixvec of little-endian path components
fn encode_bip32(path: &BipPath) -> Vec<u8> {
    let components = path.components();
    let mut body = Vec::with_capacity(components.len() * 4);
    for c in components {
        put_u32(&mut body, *c);
    }
    fixvec(components.len(), &body)
}

impl RawTransaction {
    /// Serialize into the molecule transaction layout
    pub fn encode(&self) -> Vec<u8> {
        let mut version = Vec::with_capacity(4);
        put_u32(&mut version, self.version);

        offset_block(&[
            version,
            encode_cell_deps(&self.cell_deps),
            encode_header_deps(&self.header_deps),
            encode_inputs(&self.inputs),
            encode_outputs(&self.outputs),
            encode_outputs_data(&self.outputs_data),
        ])
    }
}

impl AnnotatedCellInput {
    fn encode(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(CELL_INPUT_LEN);
        encode_cell_input(&mut input, &self.input);

        offset_block(&[input, self.source.encode()])
    }
}

impl AnnotatedRawTransaction {
    fn encode(&self) -> Vec<u8> {
        let mut version = Vec::with_capacity(4);
        put_u32(&mut version, self.version);

        let inputs: Vec<_> = self.inputs.iter().map(AnnotatedCellInput::encode).collect();

        offset_block(&[
            version,
            encode_cell_deps(&self.cell_deps),
            encode_header_deps(&self.header_deps),
            offset_block(&inputs),
            encode_outputs(&self.outputs),
            encode_outputs_data(&self.outputs_data),
        ])
    }
}

impl AnnotatedTransaction {
    /// Serialize into the device's annotated transaction layout
    pub fn encode(&self) -> Vec<u8> {
        let mut input_count = Vec::with_capacity(4);
        put_u32(&mut input_count, self.input_count);

        offset_block(&[
            encode_bip32(&self.sign_path),
            encode_bip32(&self.change_path),
            input_count,
            self.raw.encode(),
            offset_block(&self.witnesses.iter().map(|w| bytes(w)).collect::<Vec<_>>()),
        ])
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn u32_at(buf: &[u8], offset: usize) -> Result<u32, Error> {
    match buf.get(offset..offset + 4) {
        Some(b) => Ok(LittleEndian::read_u32(b)),
        None => Err(Error::Protocol("truncated length field")),
    }
}

/// Split a table into its fields, checking the size header and that the
/// offset list is in-bounds and monotonic
fn table_fields(buf: &[u8], count: usize) -> Result<Vec<&[u8]>, Error> {
    let total = u32_at(buf, 0)? as usize;
    if total != buf.len() {
        return Err(Error::Protocol("table size disagrees with payload"));
    }

    let header = 4 + 4 * count;
    let mut offsets = Vec::with_capacity(count + 1);
    for i in 0..count {
        offsets.push(u32_at(buf, 4 + 4 * i)? as usize);
    }
    offsets.push(total);

    if count > 0 && offsets[0] != header {
        return Err(Error::Protocol("unexpected table field count"));
    }

    let mut fields = Vec::with_capacity(count);
    for w in offsets.windows(2) {
        let (start, end) = (w[0], w[1]);
        if start > end || end > buf.len() {
            return Err(Error::Protocol("table offsets out of range"));
        }
        fields.push(&buf[start..end]);
    }

    Ok(fields)
}

/// Split a dynvec into its items, item count derived from the first offset
fn dynvec_items(buf: &[u8]) -> Result<Vec<&[u8]>, Error> {
    let total = u32_at(buf, 0)? as usize;
    if total != buf.len() {
        return Err(Error::Protocol("vector size disagrees with payload"));
    }
    if total == 4 {
        return Ok(vec![]);
    }

    let first = u32_at(buf, 4)? as usize;
    if first < 8 || first % 4 != 0 {
        return Err(Error::Protocol("malformed vector offsets"));
    }

    table_fields(buf, first / 4 - 1)
}

/// Split a fixvec of `item_len`-sized items
fn fixvec_items(buf: &[u8], item_len: usize) -> Result<Vec<&[u8]>, Error> {
    let count = u32_at(buf, 0)? as usize;

    let body = count
        .checked_mul(item_len)
        .ok_or(Error::Protocol("vector item count overflow"))?;
    if buf.len() != 4 + body {
        return Err(Error::Protocol("vector size disagrees with item count"));
    }

    Ok(buf[4..].chunks(item_len).collect())
}

/// Decode a `Bytes` field (fixvec of single bytes)
fn decode_bytes(buf: &[u8]) -> Result<Vec<u8>, Error> {
    let count = u32_at(buf, 0)? as usize;
    if buf.len() != 4 + count {
        return Err(Error::Protocol("byte string length mismatch"));
    }

    Ok(buf[4..].to_vec())
}

fn decode_array<const N: usize>(buf: &[u8]) -> Result<[u8; N], Error> {
    match <[u8; N]>::try_from(buf) {
        Ok(a) => Ok(a),
        Err(_) => Err(Error::Protocol("fixed field length mismatch")),
    }
}

fn decode_out_point(buf: &[u8]) -> Result<OutPoint, Error> {
    if buf.len() != OUT_POINT_LEN {
        return Err(Error::Protocol("out point length mismatch"));
    }

    Ok(OutPoint {
        tx_hash: decode_array(&buf[..32])?,
        index: u32_at(buf, 32)?,
    })
}

fn decode_cell_input(buf: &[u8]) -> Result<CellInput, Error> {
    if buf.len() != CELL_INPUT_LEN {
        return Err(Error::Protocol("cell input length mismatch"));
    }

    Ok(CellInput {
        since: LittleEndian::read_u64(&buf[..8]),
        previous_output: decode_out_point(&buf[8..])?,
    })
}

fn decode_cell_dep(buf: &[u8]) -> Result<CellDep, Error> {
    if buf.len() != CELL_DEP_LEN {
        return Err(Error::Protocol("cell dep length mismatch"));
    }

    Ok(CellDep {
        out_point: decode_out_point(&buf[..OUT_POINT_LEN])?,
        dep_type: buf[OUT_POINT_LEN],
    })
}

fn decode_script(buf: &[u8]) -> Result<Script, Error> {
    let fields = table_fields(buf, 3)?;

    Ok(Script {
        code_hash: decode_array(fields[0])?,
        hash_type: *fields[1]
            .first()
            .ok_or(Error::Protocol("missing hash type"))?,
        args: decode_bytes(fields[2])?,
    })
}

fn decode_output(buf: &[u8]) -> Result<CellOutput, Error> {
    let fields = table_fields(buf, 3)?;

    if fields[0].len() != 8 {
        return Err(Error::Protocol("capacity length mismatch"));
    }

    Ok(CellOutput {
        capacity: LittleEndian::read_u64(fields[0]),
        lock: decode_script(fields[1])?,
        type_script: match fields[2].is_empty() {
            true => None,
            false => Some(decode_script(fields[2])?),
        },
    })
}

impl RawTransaction {
    /// Decode a molecule-serialized raw transaction
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let fields = table_fields(buf, 6)?;

        if fields[0].len() != 4 {
            return Err(Error::Protocol("version length mismatch"));
        }

        Ok(Self {
            version: LittleEndian::read_u32(fields[0]),
            cell_deps: fixvec_items(fields[1], CELL_DEP_LEN)?
                .into_iter()
                .map(decode_cell_dep)
                .collect::<Result<_, _>>()?,
            header_deps: fixvec_items(fields[2], 32)?
                .into_iter()
                .map(decode_array)
                .collect::<Result<_, _>>()?,
            inputs: fixvec_items(fields[3], CELL_INPUT_LEN)?
                .into_iter()
                .map(decode_cell_input)
                .collect::<Result<_, _>>()?,
            outputs: dynvec_items(fields[4])?
                .into_iter()
                .map(decode_output)
                .collect::<Result<_, _>>()?,
            outputs_data: dynvec_items(fields[5])?
                .into_iter()
                .map(decode_bytes)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod test {
    use core::str::FromStr;

    use super::super::test::{test_raw_tx, test_source_tx};
    use super::*;

    // Byte-for-byte molecule encoding of `test_raw_tx`
    const RAW_TX_HEX: &str = concat!(
        "f20000001c00000020000000490000004d0000007d000000e6000000000000000100",
        "0000aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        "000000000100000000010000000000000000000000bbbbbbbbbbbbbbbbbbbbbbbbbb",
        "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb010000006900000008000000610000",
        "0010000000180000006100000000e40b54020000004900000010000000300000003100",
        "00009bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce801",
        "1400000011111111111111111111111111111111111111110c000000080000000000",
        "0000"
    );

    #[test]
    fn raw_transaction_encode_fixture() {
        assert_eq!(hex::encode(test_raw_tx().encode()), RAW_TX_HEX);
    }

    #[test]
    fn raw_transaction_decode_fixture() {
        let buf = hex::decode(RAW_TX_HEX).unwrap();
        assert_eq!(RawTransaction::decode(&buf).unwrap(), test_raw_tx());
    }

    #[test]
    fn raw_transaction_decode_rejects_truncation() {
        let buf = hex::decode(RAW_TX_HEX).unwrap();

        // Any truncation must surface as a protocol error, never a panic
        for n in [0, 3, 4, 16, 100, buf.len() - 1] {
            assert!(
                matches!(RawTransaction::decode(&buf[..n]), Err(Error::Protocol(_))),
                "no error for truncation at {n}"
            );
        }
    }

    #[test]
    fn raw_transaction_decode_rejects_bad_offsets() {
        let mut buf = hex::decode(RAW_TX_HEX).unwrap();

        // Point the second field offset past the end of the buffer
        buf[8] = 0xff;
        assert!(matches!(
            RawTransaction::decode(&buf),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn annotated_transaction_encode_fixture() {
        let path = BipPath::from_str("44'/309'/0'/0/0").unwrap();

        let tx = AnnotatedTransaction::build(
            path,
            test_raw_tx(),
            vec![],
            vec![test_source_tx()],
            None,
        )
        .unwrap();

        let encoded = tx.encode();
        assert_eq!(encoded.len(), 636);

        // Header: total size then the five field offsets
        assert_eq!(
            hex::encode(&encoded[..24]),
            "7c0200001800000030000000480000004c0000001b020000"
        );
        // Sign path as a little-endian component fixvec
        assert_eq!(
            hex::encode(&encoded[24..48]),
            "050000002c00008035010080000000800000000000000000"
        );
    }

    #[test]
    fn type_script_roundtrip() {
        let mut tx = test_raw_tx();
        tx.outputs[0].type_script = Some(Script {
            code_hash: [0xdd; 32],
            hash_type: 0,
            args: vec![1, 2, 3],
        });

        assert_eq!(RawTransaction::decode(&tx.encode()).unwrap(), tx);
    }

    #[test]
    fn empty_vectors_roundtrip() {
        let tx = RawTransaction::default();

        let encoded = tx.encode();
        assert_eq!(RawTransaction::decode(&encoded).unwrap(), tx);
    }
}
