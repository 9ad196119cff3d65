// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Chunked signing stream framing
//!
//! Both variable-length operations split their payload into
//! [`MAX_CHUNK_LEN`]-byte frames sent strictly in order, one exchange at a
//! time, with stream position carried in P1 (see [`SignP1`]). The two
//! instructions differ only in how the stream starts: transaction signing
//! folds initialisation into the first data frame (empty P1 marker), message
//! signing opens with a separate init frame so every data frame is a
//! continuation. The terminal frame always carries `CONTINUE | FINAL`, and
//! an empty payload still produces exactly one (empty) terminal frame.

use ledger_ckb_apdu::{sign::SignP1, MAX_CHUNK_LEN};

/// Split a payload into `(marker, chunk)` frames.
///
/// `first` is the marker for the leading frame of a multi-frame stream:
/// [`SignP1::empty`] when the frame doubles as stream initialisation,
/// [`SignP1::CONTINUE`] when an init frame was already sent. The terminal
/// marker wins when the first frame is also the last.
pub(crate) fn frames(payload: &[u8], first: SignP1) -> Vec<(SignP1, &[u8])> {
    let count = payload.len().div_ceil(MAX_CHUNK_LEN).max(1);

    (0..count)
        .map(|i| {
            let chunk = &payload[i * MAX_CHUNK_LEN..((i + 1) * MAX_CHUNK_LEN).min(payload.len())];
            let p1 = match (i, i + 1 == count) {
                (_, true) => SignP1::last(),
                (0, false) => first,
                (_, false) => SignP1::CONTINUE,
            };
            (p1, chunk)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_payload_single_terminal_frame() {
        let f = frames(&[], SignP1::empty());

        assert_eq!(f.len(), 1);
        assert_eq!(f[0].0, SignP1::last());
        assert!(f[0].1.is_empty());
    }

    #[test]
    fn single_chunk_is_terminal() {
        let payload = vec![0xabu8; 100];

        let f = frames(&payload, SignP1::empty());

        assert_eq!(f.len(), 1);
        assert_eq!(f[0], (SignP1::last(), &payload[..]));
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let k = 3;
        let payload = vec![0xcdu8; k * MAX_CHUNK_LEN];

        let f = frames(&payload, SignP1::empty());

        // Exactly k frames: init+data, continuation, terminal
        assert_eq!(f.len(), k);
        assert_eq!(f[0].0, SignP1::empty());
        assert_eq!(f[1].0, SignP1::CONTINUE);
        assert_eq!(f[2].0, SignP1::last());

        for (_, c) in &f {
            assert_eq!(c.len(), MAX_CHUNK_LEN);
        }
    }

    #[test]
    fn remainder_lands_in_terminal_frame() {
        let payload = vec![0u8; 2 * MAX_CHUNK_LEN + 1];

        let f = frames(&payload, SignP1::CONTINUE);

        assert_eq!(f.len(), 3);
        // Separate-init streams mark the first data frame as continuation
        assert_eq!(f[0].0, SignP1::CONTINUE);
        assert_eq!(f[1].0, SignP1::CONTINUE);
        assert_eq!(f[2].0, SignP1::last());
        assert_eq!(f[2].1.len(), 1);
    }

    #[test]
    fn frames_reassemble_to_payload() {
        let payload: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();

        let f = frames(&payload, SignP1::empty());
        let joined: Vec<u8> = f.iter().flat_map(|(_, c)| c.iter().copied()).collect();

        assert_eq!(joined, payload);
    }
}
