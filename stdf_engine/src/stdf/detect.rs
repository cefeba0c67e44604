//! Container detection: sniff the FAR prologue for byte order and STDF
//! version before any record is consumed.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::error::{Result, StdfError};
use super::records::ByteOrder;

/// Supported STDF version tag (V4 record table only).
pub const STDF_V4: u8 = 4;

/// The first record of every STDF file is a FAR: REC_LEN u16, REC_TYP 0,
/// REC_SUB 10, CPU_TYPE u8, STDF_VER u8.
const FAR_PROLOGUE_LEN: usize = 6;

/// Cheap validity probe. True when the file starts with a well-formed FAR.
pub fn is_stdf_container(path: &Path) -> bool {
    endian_and_version(path).is_ok()
}

/// Detect the container's byte order and format version from its FAR record.
///
/// CPU_TYPE 1 means big-endian, 2 means little-endian. REC_LEN must decode
/// to 2 under the detected order (the FAR payload is exactly CPU_TYPE and
/// STDF_VER), which cross-checks the order against the length field.
pub fn endian_and_version(path: &Path) -> Result<(ByteOrder, u8)> {
    let mut file = File::open(path)?;
    let mut prologue = [0u8; FAR_PROLOGUE_LEN];
    match file.read_exact(&mut prologue) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
            return Err(StdfError::not_a_container(path));
        }
        Err(err) => return Err(err.into()),
    }

    let (rec_typ, rec_sub) = (prologue[2], prologue[3]);
    if (rec_typ, rec_sub) != (0, 10) {
        return Err(StdfError::not_a_container(path));
    }

    let byte_order = match prologue[4] {
        1 => ByteOrder::Big,
        2 => ByteOrder::Little,
        _ => return Err(StdfError::not_a_container(path)),
    };

    let version = prologue[5];
    if version != STDF_V4 {
        return Err(StdfError::not_a_container(path));
    }

    if byte_order.u16([prologue[0], prologue[1]]) != 2 {
        return Err(StdfError::not_a_container(path));
    }

    Ok((byte_order, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn detect__little_endian_far__then_order_and_version() {
        let file = file_with(&[2, 0, 0, 10, 2, 4]);
        let (order, version) = endian_and_version(file.path()).unwrap();
        assert_eq!(order, ByteOrder::Little);
        assert_eq!(version, STDF_V4);
        assert!(is_stdf_container(file.path()));
    }

    #[test]
    fn detect__big_endian_far__then_order_and_version() {
        let file = file_with(&[0, 2, 0, 10, 1, 4]);
        let (order, version) = endian_and_version(file.path()).unwrap();
        assert_eq!(order, ByteOrder::Big);
        assert_eq!(version, STDF_V4);
    }

    #[test]
    fn detect__wrong_type_pair__then_not_a_container() {
        let file = file_with(&[2, 0, 1, 10, 2, 4]);
        let err = endian_and_version(file.path()).unwrap_err();
        assert!(matches!(err, StdfError::NotAContainer { .. }));
        assert!(!is_stdf_container(file.path()));
    }

    #[test]
    fn detect__unknown_cpu_type__then_not_a_container() {
        let file = file_with(&[2, 0, 0, 10, 9, 4]);
        let err = endian_and_version(file.path()).unwrap_err();
        assert!(matches!(err, StdfError::NotAContainer { .. }));
    }

    #[test]
    fn detect__unsupported_version__then_not_a_container() {
        let file = file_with(&[2, 0, 0, 10, 2, 3]);
        let err = endian_and_version(file.path()).unwrap_err();
        assert!(matches!(err, StdfError::NotAContainer { .. }));
    }

    #[test]
    fn detect__rec_len_disagrees_with_order__then_not_a_container() {
        // Big-endian REC_LEN bytes with a little-endian CPU_TYPE tag.
        let file = file_with(&[0, 2, 0, 10, 2, 4]);
        let err = endian_and_version(file.path()).unwrap_err();
        assert!(matches!(err, StdfError::NotAContainer { .. }));
    }

    #[test]
    fn detect__file_shorter_than_prologue__then_not_a_container() {
        let file = file_with(&[2, 0, 0]);
        let err = endian_and_version(file.path()).unwrap_err();
        assert!(matches!(err, StdfError::NotAContainer { .. }));
    }

    #[test]
    fn detect__missing_file__then_io_error() {
        let err = endian_and_version(Path::new("/nonexistent/lot.stdf")).unwrap_err();
        assert!(matches!(err, StdfError::Io(_)));
    }
}
