//! Test-summary extraction: a second, index-only pass over the TSR offsets.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::error::{Result, StdfError};
use super::index::StdfIndex;
use super::records::{decode_tsr, RecordId};

/// Test number to the set of (test name, test type) pairs seen across all
/// TSR records. Set semantics collapse repeated reports of the same pair.
pub type TestSummary = BTreeMap<u32, BTreeSet<(String, String)>>;

/// Build the test summary from an already-built index. Idempotent: the index
/// is only read, never mutated.
pub fn summarize(index: &StdfIndex) -> Result<TestSummary> {
    let mut summary = TestSummary::new();
    for &offset in index.offsets_of(RecordId::Tsr) {
        let record = index.records_by_offset.get(&offset).ok_or_else(|| {
            StdfError::internal(format!("TSR offset {offset} missing from offset index"))
        })?;
        let fields = decode_tsr(index.byte_order(), offset, record.bytes())?;
        summary
            .entry(fields.test_num)
            .or_default()
            .insert((fields.test_nam, fields.test_typ));
    }
    debug!(tests = summary.len(), "extracted test summary");
    Ok(summary)
}
