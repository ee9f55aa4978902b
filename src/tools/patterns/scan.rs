use std::ops::Range;

use anyhow::bail;
use hashbrown::HashMap;
use log::debug;

use super::classify::ContextMap;
use super::config::PatternConfig;
use crate::data_structs::reads::ReadView;
use crate::data_structs::typedef::{
    CountType,
    PosType,
};
use crate::data_structs::{
    ReadTable,
    Strand,
    TargetRegion,
};
use crate::error::PatternError;
use crate::utils::CancelToken;

/// Cancellation is polled whenever the read index has these bits clear,
/// i.e. every 65536 reads.
pub(crate) const CHECKPOINT_MASK: usize = 0xFFFF;

const MIN_RESERVE: usize = 0xFFFF;
const MAX_RESERVE: usize = 1 << 22;

/// Returns an error if `cancel` was triggered and `idx` is a checkpoint.
#[inline(always)]
pub(crate) fn checkpoint(
    idx: usize,
    cancel: Option<&CancelToken>,
) -> anyhow::Result<()> {
    if idx & CHECKPOINT_MASK == 0 {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                debug!("Cancellation requested at read {}", idx);
                bail!(PatternError::Cancelled);
            }
        }
    }
    Ok(())
}

/// Part of a read that takes part in the extraction, in call-string offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadWindow {
    start:  PosType,
    begin:  usize,
    end:    usize,
    offset: PosType,
}

impl ReadWindow {
    /// Matches a read against the target. Returns `None` if the read lies on
    /// another chromosome or overlaps the target by less than
    /// `min_overlap` bases.
    pub fn new(
        read: &ReadView,
        target: &TargetRegion,
        config: &PatternConfig,
    ) -> Option<Self> {
        if read.rname != target.rname() {
            return None;
        }
        let start = read.start as i64;
        let len = read.call.len() as i64;
        let over_start = start.max(target.start() as i64);
        let over_end = read.end().min(target.end() as i64);
        let overlap = over_end - over_start + 1;
        if overlap < config.min_overlap {
            return None;
        }

        let (begin, end) = if !config.clip {
            (0, len as usize)
        }
        else if overlap > 0 {
            let begin = (over_start - start) as usize;
            (begin, begin + overlap as usize)
        }
        else {
            (0, 0)
        };
        let offset = match read.strand {
            Strand::Reverse => config.reverse_offset,
            _ => 0,
        };

        Some(Self {
            start: read.start,
            begin,
            end,
            offset,
        })
    }

    /// Call-string offsets to traverse.
    pub fn range(&self) -> Range<usize> {
        self.begin..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Genomic position of the call at offset `i`, shifted by the strand
    /// offset.
    #[inline(always)]
    pub fn position(
        &self,
        i: usize,
    ) -> PosType {
        (self.start + i as PosType).saturating_sub(self.offset)
    }

    /// Offset of an unshifted genomic position, if it lies in the window.
    pub fn offset_of(
        &self,
        pos: PosType,
    ) -> Option<usize> {
        let off = pos as i64 - self.start as i64;
        (off >= self.begin as i64 && off < self.end as i64).then_some(off as usize)
    }

    /// First genomic position of the window.
    pub fn effective_start(&self) -> PosType {
        self.start + self.begin as PosType
    }

    /// Last genomic position of the window.
    pub fn effective_end(&self) -> PosType {
        (self.start as u64 + self.end as u64).saturating_sub(1) as PosType
    }
}

/// Iterates reads matching the target together with their windows,
/// polling `cancel` at every checkpoint.
pub(crate) fn qualifying_reads<'a>(
    reads: &'a ReadTable,
    target: &'a TargetRegion,
    config: &'a PatternConfig,
    cancel: Option<&'a CancelToken>,
) -> impl Iterator<Item = anyhow::Result<(ReadView<'a>, ReadWindow)>> + 'a {
    reads.iter().enumerate().filter_map(move |(idx, read)| {
        if let Err(e) = checkpoint(idx, cancel) {
            return Some(Err(e));
        }
        ReadWindow::new(&read, target, config).map(|window| Ok((read, window)))
    })
}

/// Result of the first pass: per-position observation counts across
/// qualifying reads.
#[derive(Debug, Clone, Default)]
pub struct PositionCounts {
    counts:  HashMap<PosType, CountType>,
    n_reads: usize,
}

impl PositionCounts {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            counts:  HashMap::with_capacity(capacity),
            n_reads: 0,
        }
    }

    /// Number of reads that qualified by overlap.
    pub fn n_reads(&self) -> usize {
        self.n_reads
    }

    pub fn get(
        &self,
        pos: PosType,
    ) -> CountType {
        self.counts.get(&pos).copied().unwrap_or(0)
    }

    pub fn n_positions(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PosType, CountType)> + '_ {
        self.counts.iter().map(|(pos, count)| (*pos, *count))
    }

    pub(crate) fn observe(
        &mut self,
        pos: PosType,
    ) {
        *self.counts.entry(pos).or_insert(0) += 1;
    }

    pub(crate) fn count_read(&mut self) {
        self.n_reads += 1;
    }
}

/// First pass: counts, for every position, how many qualifying reads carry
/// an in-context character there.
pub fn scan_positions(
    reads: &ReadTable,
    target: &TargetRegion,
    config: &PatternConfig,
    ctx_map: &ContextMap,
    cancel: Option<&CancelToken>,
) -> anyhow::Result<PositionCounts> {
    let reserve = (target.width() as usize).clamp(MIN_RESERVE, MAX_RESERVE);
    let mut counts = PositionCounts::with_capacity(reserve);

    for item in qualifying_reads(reads, target, config, cancel) {
        let (read, window) = item?;
        for i in window.range() {
            if ctx_map.contains(read.call[i]) {
                counts.observe(window.position(i));
            }
        }
        counts.count_read();
    }

    debug!(
        "Scanned {}: {} qualifying reads, {} positions in context",
        target,
        counts.n_reads,
        counts.n_positions()
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::ReadTableBuilder;

    fn view(
        strand: Strand,
        start: PosType,
        call: &[u8],
    ) -> ReadView<'_> {
        ReadView {
            rname: 0,
            strand,
            start,
            call,
            seq: call,
        }
    }

    #[test]
    fn test_window_unclipped() {
        let target = TargetRegion::try_new(0, 100, 110).unwrap();
        let config = PatternConfig::default();
        let read = view(Strand::Forward, 95, b"..........");
        let window = ReadWindow::new(&read, &target, &config).unwrap();
        assert_eq!(window.range(), 0..10);
        assert_eq!(window.effective_start(), 95);
        assert_eq!(window.effective_end(), 104);
    }

    #[test]
    fn test_window_clipped() {
        let target = TargetRegion::try_new(0, 100, 110).unwrap();
        let config = PatternConfig::default().with_clip(true);
        let read = view(Strand::Forward, 90, &[b'.'; 31]);
        let window = ReadWindow::new(&read, &target, &config).unwrap();
        assert_eq!(window.range(), 10..21);
        assert_eq!(window.effective_start(), 100);
        assert_eq!(window.effective_end(), 110);
        assert_eq!(window.offset_of(100), Some(10));
        assert_eq!(window.offset_of(111), None);
        assert_eq!(window.offset_of(1), None);
    }

    #[test]
    fn test_window_min_overlap() {
        let target = TargetRegion::try_new(0, 100, 110).unwrap();
        let read = view(Strand::Forward, 108, b".....");
        let config = PatternConfig::default().with_min_overlap(3);
        assert!(ReadWindow::new(&read, &target, &config).is_some());
        let config = config.with_min_overlap(4);
        assert!(ReadWindow::new(&read, &target, &config).is_none());

        // Non-positive minimum admits reads next to the target.
        let read = view(Strand::Forward, 112, b"...");
        let config = PatternConfig::default().with_min_overlap(-1);
        assert!(ReadWindow::new(&read, &target, &config).is_some());
        let window = ReadWindow::new(&read, &target, &config.with_clip(true)).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_window_reverse_offset() {
        let target = TargetRegion::try_new(0, 100, 110).unwrap();
        let config = PatternConfig::default().with_reverse_offset(1);
        let fwd = ReadWindow::new(&view(Strand::Forward, 100, b"zZ"), &target, &config)
            .unwrap();
        let rev = ReadWindow::new(&view(Strand::Reverse, 100, b"zZ"), &target, &config)
            .unwrap();
        assert_eq!(fwd.position(1), 101);
        assert_eq!(rev.position(1), 100);
    }

    #[test]
    fn test_scan_counts() {
        let mut builder = ReadTableBuilder::new();
        builder
            .push_read("chr1", Strand::Forward, 100, b"..Z..z", b"ACGTCG")
            .push_read("chr1", Strand::Forward, 100, b"..z...", b"ACGTAA")
            .push_read("chr2", Strand::Forward, 100, b"..Z...", b"ACGTAA");
        let reads = builder.build().unwrap();
        let target = reads.region("chr1", 100, 110).unwrap();
        let config = PatternConfig::default();
        let ctx_map = ContextMap::new(config.context.as_bytes());

        let counts = scan_positions(&reads, &target, &config, &ctx_map, None).unwrap();
        assert_eq!(counts.n_reads(), 2);
        assert_eq!(counts.get(102), 2);
        assert_eq!(counts.get(105), 1);
        assert_eq!(counts.get(101), 0);
    }

    #[test]
    fn test_scan_cancelled() {
        let mut builder = ReadTableBuilder::new();
        builder.push_read("chr1", Strand::Forward, 100, b"Z", b"C");
        let reads = builder.build().unwrap();
        let target = reads.region("chr1", 100, 110).unwrap();
        let config = PatternConfig::default();
        let ctx_map = ContextMap::new(config.context.as_bytes());
        let token = CancelToken::new();
        token.cancel();

        let err = scan_positions(&reads, &target, &config, &ctx_map, Some(&token))
            .unwrap_err();
        assert!(crate::error::is_cancelled(&err));
    }

    /// One more read than a checkpoint interval, all sharing a template.
    fn many_reads() -> ReadTable {
        let n = CHECKPOINT_MASK + 2;
        ReadTable::try_new(
            vec!["chr1".into()],
            vec![0; n],
            vec![Strand::Forward; n],
            vec![100; n],
            vec![0; n],
            vec![b"Z".to_vec()],
            vec![b"C".to_vec()],
        )
        .unwrap()
    }

    #[test]
    fn test_cancel_at_later_checkpoint() {
        let reads = many_reads();
        let target = reads.region("chr1", 100, 110).unwrap();
        let config = PatternConfig::default();
        let token = CancelToken::new();

        let mut iter = qualifying_reads(&reads, &target, &config, Some(&token));
        assert!(iter.next().unwrap().is_ok());
        token.cancel();

        let mut passed = 1;
        let err = loop {
            match iter.next() {
                Some(Ok(_)) => passed += 1,
                Some(Err(e)) => break e,
                None => panic!("cancellation was never observed"),
            }
        };
        assert_eq!(passed, CHECKPOINT_MASK + 1);
        assert!(matches!(
            err.downcast_ref::<PatternError>(),
            Some(PatternError::Cancelled)
        ));
    }

    #[test]
    fn test_scan_past_checkpoint() {
        let reads = many_reads();
        let target = reads.region("chr1", 100, 110).unwrap();
        let config = PatternConfig::default();
        let ctx_map = ContextMap::new(config.context.as_bytes());
        let token = CancelToken::new();

        let counts =
            scan_positions(&reads, &target, &config, &ctx_map, Some(&token)).unwrap();
        assert_eq!(counts.n_reads(), reads.len());
        assert_eq!(counts.get(100) as usize, reads.len());
    }

    #[test]
    fn test_window_at_position_limit() {
        let start = PosType::MAX - 4;
        let target = TargetRegion::try_new(0, 1, PosType::MAX).unwrap();
        let read = view(Strand::Forward, start, b"Z...z");
        let window =
            ReadWindow::new(&read, &target, &PatternConfig::default()).unwrap();
        assert_eq!(window.position(4), PosType::MAX);
        assert_eq!(window.effective_end(), PosType::MAX);
        assert_eq!(window.offset_of(PosType::MAX), Some(4));
    }
}
