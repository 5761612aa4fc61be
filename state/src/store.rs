//! Record framing shared by all ledger stores
//!
//! A frame is the compact JSON encoding of one [`Tx`] followed by `\n`.
//! JSON escapes control characters inside strings, so the newline can only
//! appear as the terminator.

use statedb_core::{LedgerError, LedgerResult, Tx};
use std::io::BufRead;

/// Frame terminator
pub const FRAME_DELIMITER: u8 = b'\n';

/// Encode a transaction as one complete frame
pub fn encode_frame(tx: &Tx) -> LedgerResult<Vec<u8>> {
    let mut frame =
        serde_json::to_vec(tx).map_err(|e| LedgerError::SerializationError(e.to_string()))?;
    frame.push(FRAME_DELIMITER);
    Ok(frame)
}

/// Decode one frame. `index` is the record's position in the log, used for errors.
pub fn decode_frame(frame: &[u8], index: u64) -> LedgerResult<Tx> {
    let body = match frame.split_last() {
        Some((&FRAME_DELIMITER, body)) => body,
        _ => {
            return Err(LedgerError::CorruptRecord {
                index,
                reason: "unterminated frame".into(),
            })
        }
    };

    serde_json::from_slice(body).map_err(|e| LedgerError::CorruptRecord {
        index,
        reason: e.to_string(),
    })
}

/// Iterator over the frames of a buffered reader.
///
/// Stops after the first error, so a corrupt record is always the last item.
pub struct RecordReader<R> {
    reader: R,
    index: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Number of frames read so far
    pub fn position(&self) -> u64 {
        self.index
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = LedgerResult<Tx>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(FRAME_DELIMITER, &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                let index = self.index;
                self.index += 1;
                let result = decode_frame(&self.buf, index);
                if result.is_err() {
                    self.done = true;
                }
                Some(result)
            }
            Err(e) => {
                self.done = true;
                Some(Err(LedgerError::Io(e)))
            }
        }
    }
}
