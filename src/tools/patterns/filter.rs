use hashbrown::HashSet;
use itertools::Itertools;
use log::debug;

use super::scan::PositionCounts;
use crate::data_structs::typedef::{
    DensityType,
    PosType,
};

/// Output columns of an extraction, fixed before the second pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    /// Positions passing the frequency filter, ascending.
    pub positions: Vec<PosType>,
    /// Highlight positions, ascending, always present.
    pub highlight: Vec<PosType>,
}

impl ColumnSet {
    /// Keeps positions observed in at least `min_ctx_freq` of the qualifying
    /// reads. Highlight positions are excluded from the frequency columns and
    /// listed separately regardless of how often they were observed.
    pub fn select(
        counts: &PositionCounts,
        min_ctx_freq: DensityType,
        highlight: &[PosType],
    ) -> Self {
        let n_reads = counts.n_reads() as DensityType;
        let highlight_set: HashSet<PosType> = highlight.iter().copied().collect();
        let positions = counts
            .iter()
            .filter(|(pos, count)| {
                *count as DensityType / n_reads >= min_ctx_freq
                    && !highlight_set.contains(pos)
            })
            .map(|(pos, _)| pos)
            .sorted_unstable()
            .collect_vec();

        debug!(
            "Selected {} of {} positions at min_ctx_freq {}",
            positions.len(),
            counts.n_positions(),
            min_ctx_freq
        );
        Self {
            positions,
            highlight: highlight.to_vec(),
        }
    }

    /// Index of a frequency column.
    pub fn position_index(
        &self,
        pos: PosType,
    ) -> Option<usize> {
        self.positions.binary_search(&pos).ok()
    }

    pub fn len(&self) -> usize {
        self.positions.len() + self.highlight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
