//! Epiallele pattern extraction.
//!
//! Given a [`ReadTable`] and a [`TargetRegion`], the extractor
//!
//! 1. scans all reads once, selecting reads that overlap the target and
//!    counting how often every position carries an in-context call
//!    ([`scan_positions`]);
//! 2. keeps positions observed in enough reads plus any highlight positions
//!    ([`ColumnSet`]);
//! 3. scans the reads again, recording each read's calls at the kept
//!    positions and its bases at highlight positions, and folding both into
//!    an FNV-1a fingerprint ([`PatternBuilder`]);
//! 4. assembles the results into a [`PatternTable`].
//!
//! Reads with identical calls at the kept positions and identical
//! highlighted bases share a fingerprint, which makes the `pattern` column
//! directly usable for grouping.
//!
//! ```no_run
//! use epipattern::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut builder = ReadTableBuilder::new();
//! builder.push_read("chr1", Strand::Forward, 100, b"..Z..z", b"ACGTCG");
//! let reads = builder.build()?;
//!
//! let target = reads.region("chr1", 100, 110)?;
//! let config = PatternConfig::from_context(Context::CG).with_min_ctx_freq(0.5);
//! let table = extract_patterns(&reads, &target, &config)?;
//! println!("{}", table.data());
//! # Ok(())
//! # }
//! ```

mod assemble;
mod builder;
mod classify;
mod config;
mod filter;
mod fingerprint;
mod scan;

pub use assemble::{
    PatternColumn,
    PatternTable,
};
pub use builder::{
    PatternBuilder,
    PatternColumns,
    PatternRecord,
};
pub use classify::{
    call_dtype,
    CallCode,
    ContextMap,
    CALL_LABELS,
};
pub use config::PatternConfig;
pub use filter::ColumnSet;
pub use fingerprint::{
    format_fingerprint,
    Fnv1a,
};
use log::info;
pub use scan::{
    scan_positions,
    PositionCounts,
    ReadWindow,
};

use crate::data_structs::{
    ReadTable,
    TargetRegion,
};
use crate::error::PatternError;
use crate::utils::CancelToken;

/// Runs extractions over one read table.
///
/// Every call to [`PatternExtractor::extract`] builds its own position
/// counts and column buffers; the read table is only borrowed.
#[derive(Debug, Clone)]
pub struct PatternExtractor<'a> {
    reads:   &'a ReadTable,
    config:  PatternConfig,
    ctx_map: ContextMap,
    cancel:  Option<CancelToken>,
}

impl<'a> PatternExtractor<'a> {
    /// Validates `config` and prepares the context lookup table.
    pub fn try_new(
        reads: &'a ReadTable,
        config: PatternConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let ctx_map = ContextMap::new(config.context.as_bytes());
        Ok(Self {
            reads,
            config,
            ctx_map,
            cancel: None,
        })
    }

    /// Makes both passes poll `token` every 65536 reads.
    pub fn with_cancel(
        mut self,
        token: CancelToken,
    ) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    pub fn extract(
        &self,
        target: &TargetRegion,
    ) -> anyhow::Result<PatternTable> {
        let seqname = self
            .reads
            .seqnames()
            .get(target.rname() as usize)
            .ok_or_else(|| {
                PatternError::contract(format!(
                    "target chromosome id {} is not in the read table",
                    target.rname()
                ))
            })?;
        let seqnames_dtype = self.reads.seqnames_dtype();
        let cancel = self.cancel.as_ref();

        let counts =
            scan_positions(self.reads, target, &self.config, &self.ctx_map, cancel)?;
        if counts.n_reads() == 0 {
            info!("No reads overlap {}:{}-{}", seqname, target.start(), target.end());
            return Ok(PatternTable::empty(&seqnames_dtype, 0)?);
        }

        let columns =
            ColumnSet::select(&counts, self.config.min_ctx_freq, &self.config.highlight);
        let (records, buffers) =
            PatternBuilder::new(self.reads, &self.config, &self.ctx_map, cancel)
                .build(target, &columns, counts.n_reads())?;

        info!(
            "{}:{}-{}: {} patterns from {} reads, {} columns",
            seqname,
            target.start(),
            target.end(),
            records.len(),
            counts.n_reads(),
            columns.len()
        );
        Ok(PatternTable::assemble(
            records,
            buffers,
            counts.n_reads(),
            seqname,
            &seqnames_dtype,
        )?)
    }
}

/// Extracts patterns of `reads` over `target` in one call.
pub fn extract_patterns(
    reads: &ReadTable,
    target: &TargetRegion,
    config: &PatternConfig,
) -> anyhow::Result<PatternTable> {
    PatternExtractor::try_new(reads, config.clone())?.extract(target)
}
