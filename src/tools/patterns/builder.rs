use std::hash::Hasher;

use itertools::Itertools;
use log::debug;

use super::classify::{
    CallCode,
    ContextMap,
};
use super::config::PatternConfig;
use super::filter::ColumnSet;
use super::fingerprint::Fnv1a;
use super::scan::qualifying_reads;
use crate::data_structs::typedef::{
    CountType,
    DensityType,
    PosType,
};
use crate::data_structs::{
    ReadTable,
    Strand,
    TargetRegion,
};
use crate::utils::CancelToken;

/// Summary of one read that carried at least one in-context call at a
/// selected position.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecord {
    pub strand:      Strand,
    /// First position of the scanned window.
    pub start:       PosType,
    /// Last position of the scanned window.
    pub end:         PosType,
    /// In-context calls at selected positions.
    pub nbase:       CountType,
    /// Fraction of `nbase` that is methylated.
    pub beta:        DensityType,
    pub fingerprint: u64,
}

/// Code buffers, one per output column and one slot per emitted record.
#[derive(Debug, Clone, Default)]
pub struct PatternColumns {
    frequent:  Vec<(PosType, Vec<CallCode>)>,
    highlight: Vec<(PosType, Vec<CallCode>)>,
}

impl PatternColumns {
    /// Allocates `capacity` missing slots for every column.
    fn allocate(
        columns: &ColumnSet,
        capacity: usize,
    ) -> Self {
        let alloc = |positions: &[PosType]| {
            positions
                .iter()
                .map(|pos| (*pos, vec![CallCode::MISSING; capacity]))
                .collect_vec()
        };
        Self {
            frequent:  alloc(&columns.positions),
            highlight: alloc(&columns.highlight),
        }
    }

    fn truncate(
        &mut self,
        len: usize,
    ) {
        for (_, codes) in self.frequent.iter_mut().chain(self.highlight.iter_mut()) {
            codes.truncate(len);
        }
    }

    pub fn n_columns(&self) -> usize {
        self.frequent.len() + self.highlight.len()
    }

    /// All columns ordered by position. Frequent and highlight positions
    /// never coincide.
    pub fn into_sorted(self) -> Vec<(PosType, Vec<CallCode>)> {
        self.frequent
            .into_iter()
            .merge_by(self.highlight, |a, b| a.0 < b.0)
            .collect()
    }
}

/// Second pass over the reads: fills pattern columns and fingerprints every
/// read that has calls at selected positions.
pub struct PatternBuilder<'a> {
    reads:   &'a ReadTable,
    config:  &'a PatternConfig,
    ctx_map: &'a ContextMap,
    cancel:  Option<&'a CancelToken>,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(
        reads: &'a ReadTable,
        config: &'a PatternConfig,
        ctx_map: &'a ContextMap,
        cancel: Option<&'a CancelToken>,
    ) -> Self {
        Self {
            reads,
            config,
            ctx_map,
            cancel,
        }
    }

    /// Builds records for `target`. `n_reads` is the number of qualifying
    /// reads found by the first pass and bounds the number of records.
    pub fn build(
        &self,
        target: &TargetRegion,
        columns: &ColumnSet,
        n_reads: usize,
    ) -> anyhow::Result<(Vec<PatternRecord>, PatternColumns)> {
        let mut buffers = PatternColumns::allocate(columns, n_reads);
        let mut records = Vec::with_capacity(n_reads);

        for item in qualifying_reads(self.reads, target, self.config, self.cancel) {
            let (read, window) = item?;
            let slot = records.len();
            let mut hasher = Fnv1a::new();
            let mut meth: CountType = 0;
            let mut total: CountType = 0;

            for i in window.range() {
                let byte = read.call[i];
                if !self.ctx_map.contains(byte) {
                    continue;
                }
                let pos = window.position(i);
                if let Some(col) = columns.position_index(pos) {
                    let code = CallCode::from_call(byte);
                    buffers.frequent[col].1[slot] = code;
                    meth += code.is_methylated() as CountType;
                    total += 1;
                    hasher.add(pos, byte);
                }
            }
            if total == 0 {
                continue;
            }

            for (col, pos) in columns.highlight.iter().enumerate() {
                let Some(off) = window.offset_of(*pos) else {
                    continue;
                };
                let base = read.seq[off];
                if self.ctx_map.contains(base) {
                    buffers.highlight[col].1[slot] = CallCode::from_base(base);
                    hasher.add(*pos, base);
                }
            }

            records.push(PatternRecord {
                strand:      read.strand,
                start:       window.effective_start(),
                end:         window.effective_end(),
                nbase:       total,
                beta:        meth as DensityType / total as DensityType,
                fingerprint: hasher.finish(),
            });
        }

        buffers.truncate(records.len());
        debug!(
            "Built {} patterns from {} qualifying reads over {} columns",
            records.len(),
            n_reads,
            buffers.n_columns()
        );
        Ok((records, buffers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::ReadTableBuilder;

    fn build(
        reads: &ReadTable,
        config: &PatternConfig,
        columns: &ColumnSet,
    ) -> (Vec<PatternRecord>, PatternColumns) {
        let ctx_map = ContextMap::new(config.context.as_bytes());
        let target = reads.region("chr1", 100, 110).unwrap();
        PatternBuilder::new(reads, config, &ctx_map, None)
            .build(&target, columns, reads.len())
            .unwrap()
    }

    #[test]
    fn test_records_and_codes() {
        let mut builder = ReadTableBuilder::new();
        builder
            .push_read("chr1", Strand::Forward, 100, b"Z.z.Z", b"CGCGC")
            .push_read("chr1", Strand::Forward, 100, b"..h..", b"ACCTA");
        let reads = builder.build().unwrap();
        let columns = ColumnSet {
            positions: vec![100, 102, 104],
            highlight: vec![],
        };
        let (records, buffers) = build(&reads, &PatternConfig::default(), &columns);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nbase, 3);
        assert_eq!(records[0].start, 100);
        assert_eq!(records[0].end, 104);
        assert!((records[0].beta - 2.0 / 3.0).abs() < 1e-12);

        let sorted = buffers.into_sorted();
        assert_eq!(sorted.len(), 3);
        assert_eq!(sorted[1].0, 102);
        assert_eq!(sorted[1].1, vec![CallCode::from_call(b'z')]);
    }

    #[test]
    fn test_unselected_positions_ignored() {
        let mut builder = ReadTableBuilder::new();
        builder
            .push_read("chr1", Strand::Forward, 100, b"Z.z", b"CGC")
            .push_read("chr1", Strand::Forward, 100, b"Z.Z", b"CGC");
        let reads = builder.build().unwrap();
        let columns = ColumnSet {
            positions: vec![100],
            highlight: vec![],
        };
        let (records, _) = build(&reads, &PatternConfig::default(), &columns);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fingerprint, records[1].fingerprint);
    }

    #[test]
    fn test_build_cancelled() {
        let mut builder = ReadTableBuilder::new();
        builder.push_read("chr1", Strand::Forward, 100, b"Z.z", b"CGC");
        let reads = builder.build().unwrap();
        let config = PatternConfig::default();
        let ctx_map = ContextMap::new(config.context.as_bytes());
        let target = reads.region("chr1", 100, 110).unwrap();
        let columns = ColumnSet {
            positions: vec![100, 102],
            highlight: vec![],
        };
        let token = CancelToken::new();
        token.cancel();

        let err = PatternBuilder::new(&reads, &config, &ctx_map, Some(&token))
            .build(&target, &columns, reads.len())
            .unwrap_err();
        assert!(crate::error::is_cancelled(&err));
    }

    #[test]
    fn test_highlight_bases() {
        let mut builder = ReadTableBuilder::new();
        builder
            .push_read("chr1", Strand::Forward, 100, b"Z....", b"CGATA")
            .push_read("chr1", Strand::Forward, 100, b"Z....", b"CGGTA")
            .push_read("chr1", Strand::Forward, 100, b"Z.", b"CG");
        let reads = builder.build().unwrap();
        let columns = ColumnSet {
            positions: vec![100],
            highlight: vec![102],
        };
        let (records, buffers) = build(&reads, &PatternConfig::default(), &columns);
        assert_eq!(records.len(), 3);
        assert_ne!(records[0].fingerprint, records[1].fingerprint);

        let sorted = buffers.into_sorted();
        assert_eq!(sorted[1].0, 102);
        assert_eq!(sorted[1].1, vec![
            CallCode::from_base(b'A'),
            CallCode::from_base(b'G'),
            CallCode::MISSING
        ]);
    }
}
