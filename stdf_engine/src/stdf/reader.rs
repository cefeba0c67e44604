//! Lazy record stream over an STDF container.
//!
//! The stream is forward-only and non-restartable: it owns its reader and
//! yields each raw record exactly once; re-scanning means reopening the
//! source. Only structural integrity is checked here (the length field must
//! be satisfiable), never field contents.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use super::error::{Result, StdfError};
use super::records::ByteOrder;

/// Every record starts with REC_LEN u16, REC_TYP u8, REC_SUB u8.
pub const RECORD_HEADER_LEN: usize = 4;

/// One raw record as read from the stream: its (type, subtype) pair and the
/// exact bytes of its span, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub typ: u8,
    pub sub: u8,
    pub bytes: Vec<u8>,
}

impl RawRecord {
    /// Total byte length of the record span, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Lazy, finite, non-restartable sequence of raw records in file order.
pub struct RecordStream {
    reader: BufReader<File>,
    byte_order: ByteOrder,
    offset: u64,
    done: bool,
}

impl RecordStream {
    /// Open a validated container for sequential record reading.
    pub fn open(path: &Path, byte_order: ByteOrder) -> Result<Self> {
        let file = File::open(path)?;
        Ok(RecordStream {
            reader: BufReader::new(file),
            byte_order,
            offset: 0,
            done: false,
        })
    }

    /// Byte offset of the next record to be produced.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_record(&mut self) -> Result<Option<RawRecord>> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        let mut filled = 0;
        while filled < RECORD_HEADER_LEN {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) if filled == 0 => return Ok(None), // clean end of stream
                Ok(0) => {
                    return Err(StdfError::malformed(
                        self.offset,
                        format!("truncated record header ({filled} of {RECORD_HEADER_LEN} bytes)"),
                    ));
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let rec_len = self.byte_order.u16([header[0], header[1]]) as usize;
        let mut bytes = Vec::with_capacity(RECORD_HEADER_LEN + rec_len);
        bytes.extend_from_slice(&header);
        bytes.resize(RECORD_HEADER_LEN + rec_len, 0);
        match self.reader.read_exact(&mut bytes[RECORD_HEADER_LEN..]) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(StdfError::malformed(
                    self.offset,
                    format!("record declares {rec_len} payload bytes past end of file"),
                ));
            }
            Err(err) => return Err(err.into()),
        }

        let record = RawRecord {
            typ: header[2],
            sub: header[3],
            bytes,
        };
        self.offset += record.len() as u64;
        Ok(Some(record))
    }
}

impl Iterator for RecordStream {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
