//! Single-pass index builder and part correlator.
//!
//! One scan over the record stream produces three views: offsets grouped by
//! record type, raw records keyed by offset (ascending-offset order is the
//! authoritative replay order for rewriting), and per-device parts keyed by
//! a monotonically assigned part number. Correlation state lives in a map
//! local to the pass and is gone when the pass ends.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use super::detect;
use super::error::{Result, StdfError};
use super::records::{head_and_site, ByteOrder, CorrelationKind, RecordId};
use super::reader::{RawRecord, RecordStream};

/// One record's byte offset plus its exact raw span, header included.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    offset: u64,
    bytes: Vec<u8>,
}

impl RecordRef {
    pub fn new(offset: u64, bytes: Vec<u8>) -> Self {
        Self { offset, bytes }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// In-memory index of one STDF container.
///
/// The maps are public on purpose: after the build pass, callers edit the
/// container by dropping, inserting, or replacing entries here and then
/// replaying the result through [`crate::stdf::writer::write_index`].
#[derive(Debug)]
pub struct StdfIndex {
    byte_order: ByteOrder,
    version: u8,
    /// Record offsets grouped by type, in file order.
    pub records_by_type: HashMap<RecordId, Vec<u64>>,
    /// Every record keyed by its byte offset; ascending order is replay order.
    pub records_by_offset: BTreeMap<u64, RecordRef>,
    /// Part number (monotonic from 1) to the ordered offsets of that part:
    /// its PIR, any PTR/FTR/MPR results, and its PRR.
    pub parts: BTreeMap<u32, Vec<u64>>,
}

impl StdfIndex {
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn record_count(&self) -> usize {
        self.records_by_offset.len()
    }

    /// Offsets of every record of the given type, in file order.
    pub fn offsets_of(&self, id: RecordId) -> &[u64] {
        self.records_by_type
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Build the index for a container, with no progress reporting.
pub fn build_index(path: &Path) -> Result<StdfIndex> {
    build_index_with_progress(path, |_| {})
}

/// Build the index, invoking `progress` with cumulative bytes processed
/// after each record. The sink is observational only.
pub fn build_index_with_progress<F>(path: &Path, mut progress: F) -> Result<StdfIndex>
where
    F: FnMut(u64),
{
    let (byte_order, version) = detect::endian_and_version(path)?;
    debug!(
        path = %path.display(),
        ?byte_order,
        version,
        "indexing STDF container",
    );

    let stream = RecordStream::open(path, byte_order)?;
    let index = IndexBuilder::new(byte_order, version).run(stream, &mut progress)?;

    info!(
        path = %path.display(),
        records = index.record_count(),
        parts = index.parts.len(),
        "indexed STDF container",
    );
    Ok(index)
}

/// Carries the pass-local correlation state; consumed by [`Self::run`].
struct IndexBuilder {
    index: StdfIndex,
    /// (head, site) to currently open part number. Transient.
    parts_in_process: HashMap<(i8, i8), u32>,
    next_part: u32,
}

impl IndexBuilder {
    fn new(byte_order: ByteOrder, version: u8) -> Self {
        Self {
            index: StdfIndex {
                byte_order,
                version,
                records_by_type: HashMap::new(),
                records_by_offset: BTreeMap::new(),
                parts: BTreeMap::new(),
            },
            parts_in_process: HashMap::new(),
            next_part: 1,
        }
    }

    fn run<F>(mut self, stream: RecordStream, progress: &mut F) -> Result<StdfIndex>
    where
        F: FnMut(u64),
    {
        let mut offset = 0u64;
        for record in stream {
            let record = record?;
            let id = RecordId::from_type_pair(self.index.version, record.typ, record.sub)
                .ok_or_else(|| {
                    StdfError::malformed(
                        offset,
                        format!("unknown record type ({}, {})", record.typ, record.sub),
                    )
                })?;
            let len = record.len() as u64;
            self.observe(id, offset, record)?;
            offset += len;
            progress(offset);
        }

        if !self.parts_in_process.is_empty() {
            // end of stream with parts never closed; they stay in `parts`
            for (&(head, site), &part) in &self.parts_in_process {
                warn!(part, head, site, "part still open at end of stream");
            }
        }
        Ok(self.index)
    }

    fn observe(&mut self, id: RecordId, offset: u64, record: RawRecord) -> Result<()> {
        let kind = id.correlation_kind();
        let pair = match kind {
            CorrelationKind::NotRelevant => None,
            _ => Some(head_and_site(id, offset, &record.bytes)?),
        };

        self.index
            .records_by_type
            .entry(id)
            .or_default()
            .push(offset);
        self.index
            .records_by_offset
            .insert(offset, RecordRef::new(offset, record.bytes));

        match (kind, pair) {
            (CorrelationKind::PartOpen, Some((head, site))) => {
                if let Some(&part) = self.parts_in_process.get(&(head, site)) {
                    return Err(StdfError::ReentrantPartOpen { head, site, part });
                }
                let part = self.next_part;
                self.next_part += 1;
                self.parts_in_process.insert((head, site), part);
                self.index.parts.insert(part, vec![offset]);
            }
            (CorrelationKind::PartClose, Some((head, site))) => {
                let part = self.parts_in_process.remove(&(head, site)).ok_or_else(|| {
                    StdfError::UnmatchedPartRecord {
                        record: id,
                        head,
                        site,
                    }
                })?;
                self.append_to_part(part, offset)?;
            }
            (CorrelationKind::TestResult, Some((head, site))) => {
                let part = *self.parts_in_process.get(&(head, site)).ok_or_else(|| {
                    StdfError::UnmatchedPartRecord {
                        record: id,
                        head,
                        site,
                    }
                })?;
                self.append_to_part(part, offset)?;
            }
            (CorrelationKind::NotRelevant, None) => {}
            (kind, pair) => {
                return Err(StdfError::internal(format!(
                    "correlation dispatch mismatch for {id}: {kind:?} with pair {pair:?}"
                )));
            }
        }
        Ok(())
    }

    fn append_to_part(&mut self, part: u32, offset: u64) -> Result<()> {
        self.index
            .parts
            .get_mut(&part)
            .ok_or_else(|| {
                StdfError::internal(format!("open part {part} has no offset sequence"))
            })?
            .push(offset);
        Ok(())
    }
}
