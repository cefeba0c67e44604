//! Rewriter: replay the index's raw records to a new file.
//!
//! Output is byte-for-byte whatever `records_by_offset` currently holds, in
//! ascending-offset order, with no separators or re-encoding. Edits are made
//! by mutating the index before calling this.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::error::{Result, StdfError};
use super::index::StdfIndex;

/// Write every record in the index to `dest` in ascending-offset order.
///
/// With `overwrite` false, an existing destination fails with
/// [`StdfError::DestinationExists`] before any byte is written.
pub fn write_index(index: &StdfIndex, dest: &Path, overwrite: bool) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(dest).map_err(|err| {
        if err.kind() == std::io::ErrorKind::AlreadyExists {
            StdfError::DestinationExists(dest.to_path_buf())
        } else {
            StdfError::Io(err)
        }
    })?;

    let mut writer = BufWriter::new(file);
    let mut bytes_written = 0u64;
    for record in index.records_by_offset.values() {
        writer.write_all(record.bytes())?;
        bytes_written += record.len() as u64;
    }
    writer.flush()?;

    info!(
        dest = %dest.display(),
        records = index.record_count(),
        bytes = bytes_written,
        "rewrote STDF container",
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdf::index::build_index;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(typ: u8, sub: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u16).to_le_bytes().to_vec();
        bytes.push(typ);
        bytes.push(sub);
        bytes.extend_from_slice(payload);
        bytes
    }

    fn write_stdf(path: &Path, records: &[Vec<u8>]) -> Vec<u8> {
        let mut all = Vec::new();
        for rec in records {
            all.extend_from_slice(rec);
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(&all).unwrap();
        file.flush().unwrap();
        all
    }

    #[test]
    fn write_index__no_mutation__then_byte_identical_round_trip() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("input.stdf");
        let original = write_stdf(
            &src,
            &[
                record(0, 10, &[2, 4]),
                record(5, 10, &[1, 1]),
                record(5, 20, &[1, 1, 0]),
            ],
        );

        let index = build_index(&src).unwrap();
        let dest = dir.path().join("output.stdf");
        write_index(&index, &dest, false).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), original);
    }

    #[test]
    fn write_index__record_dropped_from_index__then_omitted_from_output() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("input.stdf");
        let dropped = record(50, 30, b"\x04note");
        write_stdf(&src, &[record(0, 10, &[2, 4]), dropped.clone()]);

        let mut index = build_index(&src).unwrap();
        let offset = 6u64;
        index.records_by_offset.remove(&offset);
        if let Some(offsets) = index.records_by_type.get_mut(&crate::stdf::RecordId::Dtr) {
            offsets.retain(|&o| o != offset);
        }

        let dest = dir.path().join("output.stdf");
        write_index(&index, &dest, false).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), record(0, 10, &[2, 4]));
    }

    #[test]
    fn write_index__existing_dest_without_overwrite__then_untouched() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("input.stdf");
        write_stdf(&src, &[record(0, 10, &[2, 4])]);
        let index = build_index(&src).unwrap();

        let dest = dir.path().join("existing.stdf");
        fs::write(&dest, b"precious").unwrap();

        let err = write_index(&index, &dest, false).unwrap_err();
        assert!(matches!(err, StdfError::DestinationExists(_)));
        assert_eq!(fs::read(&dest).unwrap(), b"precious");
    }

    #[test]
    fn write_index__existing_dest_with_overwrite__then_replaced() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("input.stdf");
        let original = write_stdf(&src, &[record(0, 10, &[2, 4])]);
        let index = build_index(&src).unwrap();

        let dest = dir.path().join("existing.stdf");
        fs::write(&dest, b"stale contents that are longer").unwrap();

        write_index(&index, &dest, true).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), original);
    }
}
