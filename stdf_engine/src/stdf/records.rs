//! STDF V4 record identification and the narrow byte-level decoding the
//! indexing pass needs: the (type, subtype) lookup table, the closed set of
//! correlation-relevant kinds, fixed-position head/site extraction, and the
//! TSR field reads used by the summary extractor.

use std::fmt;

use super::error::{Result, StdfError};

/// Byte order of the container, detected once from the FAR prologue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        }
    }

    pub fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Logical identifier of an STDF V4 record, resolved from its
/// (REC_TYP, REC_SUB) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Far,
    Atr,
    Vur,
    Mir,
    Mrr,
    Pcr,
    Hbr,
    Sbr,
    Pmr,
    Pgr,
    Plr,
    Rdr,
    Sdr,
    Psr,
    Nmr,
    Cnr,
    Ssr,
    Cdr,
    Wir,
    Wrr,
    Wcr,
    Pir,
    Prr,
    Tsr,
    Ptr,
    Mpr,
    Ftr,
    Str,
    Bps,
    Eps,
    Gdr,
    Dtr,
}

impl RecordId {
    /// Resolve a (REC_TYP, REC_SUB) pair against the record table for the
    /// given STDF version. Only V4 has a table; unknown pairs return `None`.
    pub fn from_type_pair(version: u8, typ: u8, sub: u8) -> Option<Self> {
        if version != 4 {
            return None;
        }
        let id = match (typ, sub) {
            (0, 10) => RecordId::Far,
            (0, 20) => RecordId::Atr,
            (0, 30) => RecordId::Vur,
            (1, 10) => RecordId::Mir,
            (1, 20) => RecordId::Mrr,
            (1, 30) => RecordId::Pcr,
            (1, 40) => RecordId::Hbr,
            (1, 50) => RecordId::Sbr,
            (1, 60) => RecordId::Pmr,
            (1, 62) => RecordId::Pgr,
            (1, 63) => RecordId::Plr,
            (1, 70) => RecordId::Rdr,
            (1, 80) => RecordId::Sdr,
            (1, 90) => RecordId::Psr,
            (1, 91) => RecordId::Nmr,
            (1, 92) => RecordId::Cnr,
            (1, 93) => RecordId::Ssr,
            (1, 94) => RecordId::Cdr,
            (2, 10) => RecordId::Wir,
            (2, 20) => RecordId::Wrr,
            (2, 30) => RecordId::Wcr,
            (5, 10) => RecordId::Pir,
            (5, 20) => RecordId::Prr,
            (10, 30) => RecordId::Tsr,
            (15, 10) => RecordId::Ptr,
            (15, 15) => RecordId::Mpr,
            (15, 20) => RecordId::Ftr,
            (15, 30) => RecordId::Str,
            (20, 10) => RecordId::Bps,
            (20, 20) => RecordId::Eps,
            (50, 10) => RecordId::Gdr,
            (50, 30) => RecordId::Dtr,
            _ => return None,
        };
        Some(id)
    }

    pub fn correlation_kind(self) -> CorrelationKind {
        match self {
            RecordId::Pir => CorrelationKind::PartOpen,
            RecordId::Prr => CorrelationKind::PartClose,
            RecordId::Ptr | RecordId::Ftr | RecordId::Mpr => CorrelationKind::TestResult,
            _ => CorrelationKind::NotRelevant,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordId::Far => "FAR",
            RecordId::Atr => "ATR",
            RecordId::Vur => "VUR",
            RecordId::Mir => "MIR",
            RecordId::Mrr => "MRR",
            RecordId::Pcr => "PCR",
            RecordId::Hbr => "HBR",
            RecordId::Sbr => "SBR",
            RecordId::Pmr => "PMR",
            RecordId::Pgr => "PGR",
            RecordId::Plr => "PLR",
            RecordId::Rdr => "RDR",
            RecordId::Sdr => "SDR",
            RecordId::Psr => "PSR",
            RecordId::Nmr => "NMR",
            RecordId::Cnr => "CNR",
            RecordId::Ssr => "SSR",
            RecordId::Cdr => "CDR",
            RecordId::Wir => "WIR",
            RecordId::Wrr => "WRR",
            RecordId::Wcr => "WCR",
            RecordId::Pir => "PIR",
            RecordId::Prr => "PRR",
            RecordId::Tsr => "TSR",
            RecordId::Ptr => "PTR",
            RecordId::Mpr => "MPR",
            RecordId::Ftr => "FTR",
            RecordId::Str => "STR",
            RecordId::Bps => "BPS",
            RecordId::Eps => "EPS",
            RecordId::Gdr => "GDR",
            RecordId::Dtr => "DTR",
        };
        f.write_str(name)
    }
}

/// Role a record plays in part correlation. Closed over the five relevant
/// kinds; everything else is `NotRelevant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationKind {
    /// PIR: opens a part for its (head, site).
    PartOpen,
    /// PRR: closes the open part for its (head, site).
    PartClose,
    /// PTR, FTR, MPR: a single test outcome within the open part.
    TestResult,
    NotRelevant,
}

/// Extract (HEAD_NUM, SITE_NUM) as two signed 8-bit values at fixed byte
/// positions within the raw record, bypassing full field decoding.
///
/// PIR and PRR carry the pair right after the 4-byte record header; PTR, FTR
/// and MPR carry it after the header plus a 4-byte TEST_NUM. Calling this for
/// any other record kind is a defect in the caller.
pub fn head_and_site(id: RecordId, offset: u64, raw: &[u8]) -> Result<(i8, i8)> {
    let pos = match id {
        RecordId::Pir | RecordId::Prr => 4,
        RecordId::Ptr | RecordId::Ftr | RecordId::Mpr => 8,
        other => {
            return Err(StdfError::internal(format!(
                "head/site extraction requested for {other}"
            )))
        }
    };
    if raw.len() < pos + 2 {
        return Err(StdfError::malformed(
            offset,
            format!("{id} record too short for head/site at byte {pos}"),
        ));
    }
    Ok((raw[pos] as i8, raw[pos + 1] as i8))
}

/// Forward-only cursor over one record's payload, honoring the detected byte
/// order. Returns `None` once the record's optional tail has ended.
struct FieldCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> FieldCursor<'a> {
    fn new(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self {
            bytes,
            pos: 0,
            order,
        }
    }

    fn skip(&mut self, count: usize) {
        self.pos = self.pos.saturating_add(count);
    }

    fn u1(&mut self) -> Option<u8> {
        let value = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(value)
    }

    fn u4(&mut self) -> Option<u32> {
        let raw = self.bytes.get(self.pos..self.pos + 4)?;
        self.pos += 4;
        Some(self.order.u32([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn c1(&mut self) -> Option<char> {
        self.u1().map(char::from)
    }

    /// Variable-length string: one length byte followed by that many chars.
    /// `None` when the length byte itself is absent (optional tail ended);
    /// `Some(Err)` when the declared characters are cut off.
    fn cn(&mut self) -> Option<Result<String>> {
        let len = self.u1()? as usize;
        let Some(raw) = self.bytes.get(self.pos..self.pos + len) else {
            return Some(Err(StdfError::internal(format!(
                "Cn field declares {len} bytes but only {} remain",
                self.bytes.len() - self.pos
            ))));
        };
        self.pos += len;
        Some(Ok(String::from_utf8_lossy(raw).into_owned()))
    }
}

/// The three TSR fields the summary extractor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsrFields {
    pub test_num: u32,
    pub test_nam: String,
    /// Normalized to uppercase.
    pub test_typ: String,
}

/// Decode TEST_NUM, TEST_NAM and TEST_TYP from a raw TSR record.
///
/// TSR layout after the 4-byte header: HEAD_NUM U1, SITE_NUM U1, TEST_TYP C1,
/// TEST_NUM U4, EXEC_CNT U4, FAIL_CNT U4, ALRM_CNT U4, TEST_NAM Cn, ...
/// TEST_NAM sits in the optional tail and decodes to an empty string when the
/// record ends before it.
pub fn decode_tsr(order: ByteOrder, offset: u64, raw: &[u8]) -> Result<TsrFields> {
    let payload = raw.get(4..).unwrap_or(&[]);
    let mut cursor = FieldCursor::new(payload, order);
    cursor.skip(2); // HEAD_NUM, SITE_NUM
    let test_typ = cursor.c1();
    let test_num = cursor
        .u4()
        .ok_or_else(|| StdfError::malformed(offset, "TSR record ends before TEST_NUM"))?;
    cursor.skip(12); // EXEC_CNT, FAIL_CNT, ALRM_CNT
    let test_nam = match cursor.cn() {
        Some(Ok(name)) => name,
        Some(Err(_)) => {
            return Err(StdfError::malformed(
                offset,
                "TSR TEST_NAM is truncated".to_string(),
            ))
        }
        None => String::new(),
    };
    Ok(TsrFields {
        test_num,
        test_nam,
        test_typ: test_typ
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default(),
    })
}
