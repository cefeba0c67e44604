//! STDF container indexing: detection, lazy record streaming, single-pass
//! index building with part correlation, test-summary extraction, and
//! verbatim rewriting.

pub mod detect;
pub mod error;
pub mod index;
pub mod reader;
pub mod records;
pub mod summary;
pub mod writer;

// Re-export main types
pub use detect::{endian_and_version, is_stdf_container, STDF_V4};
pub use error::{Result, StdfError};
pub use index::{build_index, build_index_with_progress, RecordRef, StdfIndex};
pub use reader::{RawRecord, RecordStream, RECORD_HEADER_LEN};
pub use records::{decode_tsr, head_and_site, ByteOrder, CorrelationKind, RecordId, TsrFields};
pub use summary::{summarize, TestSummary};
pub use writer::write_index;
