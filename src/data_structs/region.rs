use std::fmt::Display;

use anyhow::bail;
use serde::{
    Deserialize,
    Serialize,
};

use super::typedef::PosType;
use crate::error::PatternError;

/// Genomic interval that reads are matched against. Both ends are inclusive
/// and 1-based; `rname` indexes the chromosome labels of a
/// [`ReadTable`](super::ReadTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRegion {
    rname: u32,
    start: PosType,
    end:   PosType,
}

impl TargetRegion {
    pub fn try_new(
        rname: u32,
        start: PosType,
        end: PosType,
    ) -> anyhow::Result<Self> {
        if start == 0 {
            bail!(PatternError::contract(
                "target start is 0, coordinates are 1-based"
            ));
        }
        if start > end {
            bail!(PatternError::contract(format!(
                "target start {} is greater than end {}",
                start, end
            )));
        }
        Ok(Self { rname, start, end })
    }

    pub fn rname(&self) -> u32 {
        self.rname
    }

    pub fn start(&self) -> PosType {
        self.start
    }

    pub fn end(&self) -> PosType {
        self.end
    }

    /// Number of bases covered by the region. Widened to `u64` since a
    /// region may span the whole `PosType` range.
    pub fn width(&self) -> u64 {
        self.end as u64 - self.start as u64 + 1
    }
}

impl Display for TargetRegion {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "#{}:{}-{}", self.rname, self.start, self.end)
    }
}
