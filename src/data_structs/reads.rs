use std::str::FromStr;

use anyhow::{
    anyhow,
    bail,
};
use hashbrown::HashMap;
use itertools::Itertools;
use log::debug;
use polars::prelude::*;

use super::enums::Strand;
use super::region::TargetRegion;
use super::typedef::PosType;
use crate::error::PatternError;
use crate::utils::get_categorical_dtype;

/// Names of the columns [`ReadTable::try_from_df`] expects.
pub const READ_COLUMNS: [&str; 5] = ["rname", "strand", "start", "xm", "seq"];

/// Borrowed view of a single read.
#[derive(Debug, Clone, Copy)]
pub struct ReadView<'a> {
    pub rname:  u32,
    pub strand: Strand,
    pub start:  PosType,
    /// Genome-anchored methylation call string.
    pub call:   &'a [u8],
    /// Genome-anchored sequence, co-indexed with `call`.
    pub seq:    &'a [u8],
}

impl ReadView<'_> {
    /// Last genomic position covered by the read.
    pub fn end(&self) -> i64 {
        self.start as i64 + self.call.len() as i64 - 1
    }
}

/// Merged, genome-anchored reads.
///
/// Per-read attributes are stored as parallel arrays; call and sequence
/// strings live in template tables indexed by `templid`, so several reads
/// may share a template. The table is immutable once built and extraction
/// only borrows it.
#[derive(Debug, Clone, Default)]
pub struct ReadTable {
    seqnames: Vec<String>,
    rname:    Vec<u32>,
    strand:   Vec<Strand>,
    start:    Vec<PosType>,
    templid:  Vec<usize>,
    calls:    Vec<Vec<u8>>,
    seqs:     Vec<Vec<u8>>,
}

impl ReadTable {
    /// Creates a table, checking that the arrays satisfy the input
    /// contract.
    pub fn try_new(
        seqnames: Vec<String>,
        rname: Vec<u32>,
        strand: Vec<Strand>,
        start: Vec<PosType>,
        templid: Vec<usize>,
        calls: Vec<Vec<u8>>,
        seqs: Vec<Vec<u8>>,
    ) -> anyhow::Result<Self> {
        let n = rname.len();
        if strand.len() != n || start.len() != n || templid.len() != n {
            bail!(PatternError::contract(format!(
                "read arrays differ in length: rname {}, strand {}, start {}, templid {}",
                n,
                strand.len(),
                start.len(),
                templid.len()
            )));
        }
        if calls.len() != seqs.len() {
            bail!(PatternError::contract(format!(
                "{} call strings but {} sequence strings",
                calls.len(),
                seqs.len()
            )));
        }
        for (t, (call, seq)) in calls.iter().zip(seqs.iter()).enumerate() {
            if call.len() != seq.len() {
                bail!(PatternError::contract(format!(
                    "template {} has call string of length {} and sequence of length {}",
                    t,
                    call.len(),
                    seq.len()
                )));
            }
        }
        if let Some(dup) = seqnames.iter().duplicates().next() {
            bail!(PatternError::contract(format!(
                "chromosome {} is listed more than once",
                dup
            )));
        }
        for i in 0..n {
            if templid[i] >= calls.len() {
                bail!(PatternError::contract(format!(
                    "read {} refers to missing template {}",
                    i, templid[i]
                )));
            }
            if rname[i] as usize >= seqnames.len() {
                bail!(PatternError::contract(format!(
                    "read {} refers to unknown chromosome id {}",
                    i, rname[i]
                )));
            }
            if start[i] == 0 {
                bail!(PatternError::contract(format!(
                    "read {} has start 0, coordinates are 1-based",
                    i
                )));
            }
            let past_end = start[i] as u64 + calls[templid[i]].len() as u64;
            if past_end > PosType::MAX as u64 + 1 {
                bail!(PatternError::contract(format!(
                    "read {} at {} with length {} ends past the largest position {}",
                    i,
                    start[i],
                    calls[templid[i]].len(),
                    PosType::MAX
                )));
            }
        }

        Ok(Self {
            seqnames,
            rname,
            strand,
            start,
            templid,
            calls,
            seqs,
        })
    }

    /// Builds a table from a DataFrame with the [`READ_COLUMNS`] columns,
    /// one template per row.
    pub fn try_from_df(df: &DataFrame) -> anyhow::Result<Self> {
        let column = |name: &str, dtype: &DataType| -> PolarsResult<Series> {
            df.column(name)?.as_materialized_series().cast(dtype)
        };
        let [rname, strand, start, xm, seq] = READ_COLUMNS;
        let rname = column(rname, &DataType::String)?;
        let strand = column(strand, &DataType::String)?;
        let start = column(start, &DataType::UInt32)?;
        let xm = column(xm, &DataType::String)?;
        let seq = column(seq, &DataType::String)?;

        let mut builder = ReadTableBuilder::with_capacity(df.height());
        for (i, ((((rname, strand), start), xm), seq)) in rname
            .str()?
            .into_iter()
            .zip(strand.str()?.into_iter())
            .zip(start.u32()?.into_iter())
            .zip(xm.str()?.into_iter())
            .zip(seq.str()?.into_iter())
            .enumerate()
        {
            let missing = || {
                anyhow!(PatternError::contract(format!("row {} has null fields", i)))
            };
            builder.push_read(
                rname.ok_or_else(missing)?,
                Strand::from_str(strand.ok_or_else(missing)?)?,
                start.ok_or_else(missing)?,
                xm.ok_or_else(missing)?.as_bytes(),
                seq.ok_or_else(missing)?.as_bytes(),
            );
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.rname.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rname.is_empty()
    }

    pub fn read(
        &self,
        idx: usize,
    ) -> ReadView<'_> {
        let templid = self.templid[idx];
        ReadView {
            rname:  self.rname[idx],
            strand: self.strand[idx],
            start:  self.start[idx],
            call:   &self.calls[templid],
            seq:    &self.seqs[templid],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ReadView<'_>> + '_ {
        (0..self.len()).map(|idx| self.read(idx))
    }

    /// Chromosome labels; a read's `rname` indexes into this list.
    pub fn seqnames(&self) -> &[String] {
        &self.seqnames
    }

    pub fn seqname_id(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.seqnames
            .iter()
            .position(|s| s == name)
            .map(|i| i as u32)
    }

    /// Resolves a chromosome name into a [`TargetRegion`].
    pub fn region(
        &self,
        seqname: &str,
        start: PosType,
        end: PosType,
    ) -> anyhow::Result<TargetRegion> {
        let rname = self.seqname_id(seqname).ok_or_else(|| {
            anyhow!(PatternError::contract(format!(
                "chromosome {} is not present in the read table",
                seqname
            )))
        })?;
        TargetRegion::try_new(rname, start, end)
    }

    /// Polars `Enum` data type over the chromosome labels.
    pub fn seqnames_dtype(&self) -> DataType {
        get_categorical_dtype(self.seqnames.clone())
    }
}

/// Incrementally collects reads into a [`ReadTable`], interning chromosome
/// names in order of first appearance.
#[derive(Debug, Default)]
pub struct ReadTableBuilder {
    seqnames: Vec<String>,
    name_ids: HashMap<String, u32>,
    rname:    Vec<u32>,
    strand:   Vec<Strand>,
    start:    Vec<PosType>,
    calls:    Vec<Vec<u8>>,
    seqs:     Vec<Vec<u8>>,
}

impl ReadTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rname: Vec::with_capacity(capacity),
            strand: Vec::with_capacity(capacity),
            start: Vec::with_capacity(capacity),
            calls: Vec::with_capacity(capacity),
            seqs: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Registers chromosome names up front so their ids follow the given
    /// order.
    pub fn with_seqnames<S: AsRef<str>>(
        mut self,
        names: &[S],
    ) -> Self {
        for name in names {
            self.intern(name.as_ref());
        }
        self
    }

    fn intern(
        &mut self,
        name: &str,
    ) -> u32 {
        if let Some(id) = self.name_ids.get(name) {
            return *id;
        }
        let id = self.seqnames.len() as u32;
        self.seqnames.push(name.to_string());
        self.name_ids.insert(name.to_string(), id);
        id
    }

    pub fn push_read(
        &mut self,
        seqname: &str,
        strand: Strand,
        start: PosType,
        call: &[u8],
        seq: &[u8],
    ) -> &mut Self {
        let id = self.intern(seqname);
        self.rname.push(id);
        self.strand.push(strand);
        self.start.push(start);
        self.calls.push(call.to_vec());
        self.seqs.push(seq.to_vec());
        self
    }

    pub fn build(self) -> anyhow::Result<ReadTable> {
        debug!(
            "Building read table: {} reads on {} chromosomes",
            self.rname.len(),
            self.seqnames.len()
        );
        let templid = (0..self.calls.len()).collect();
        ReadTable::try_new(
            self.seqnames,
            self.rname,
            self.strand,
            self.start,
            templid,
            self.calls,
            self.seqs,
        )
    }
}
