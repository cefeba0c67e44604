pub mod app;
pub mod stdf;

pub use stdf::{
    build_index, build_index_with_progress, summarize, write_index, ByteOrder, RecordId,
    RecordRef, StdfError, StdfIndex, TestSummary,
};
