use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::stdf::{self, StdfIndex};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stdf_engine",
    author,
    version,
    about = "Index, summarize, and rewrite STDF V4 test-result files",
    long_about = None
)]
pub struct Args {
    /// Path to the STDF container to index
    pub input: PathBuf,

    /// Emit record and part statistics as JSON
    #[arg(long)]
    pub stats: bool,

    /// Emit the per-test summary (from TSR records) as JSON
    #[arg(long)]
    pub summary: bool,

    /// Rewrite the indexed records verbatim to this path
    #[arg(long, value_name = "PATH")]
    pub rewrite: Option<PathBuf>,

    /// Allow the rewrite destination to be replaced if it exists
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: PathBuf,
    pub stats: bool,
    pub summary: bool,
    pub rewrite: Option<PathBuf>,
    pub overwrite: bool,
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            input: value.input,
            stats: value.stats,
            summary: value.summary,
            rewrite: value.rewrite,
            overwrite: value.overwrite,
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Serialize)]
struct IndexStats {
    records: usize,
    parts: usize,
    records_by_type: BTreeMap<String, usize>,
}

impl IndexStats {
    fn from_index(index: &StdfIndex) -> Self {
        Self {
            records: index.record_count(),
            parts: index.parts.len(),
            records_by_type: index
                .records_by_type
                .iter()
                .map(|(id, offsets)| (id.to_string(), offsets.len()))
                .collect(),
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let index = stdf::build_index_with_progress(&config.input, |bytes| {
        debug!(bytes, "indexing progress");
    })
    .with_context(|| format!("failed to index {}", config.input.display()))?;

    if config.stats {
        let stats = IndexStats::from_index(&index);
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    if config.summary {
        let summary = stdf::summarize(&index)
            .with_context(|| format!("failed to summarize {}", config.input.display()))?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if let Some(dest) = &config.rewrite {
        stdf::write_index(&index, dest, config.overwrite)
            .with_context(|| format!("failed to rewrite to {}", dest.display()))?;
    }

    Ok(())
}
