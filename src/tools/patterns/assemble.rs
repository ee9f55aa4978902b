use itertools::Itertools;
use log::{
    debug,
    warn,
};
use polars::prelude::*;

use super::builder::{
    PatternColumns,
    PatternRecord,
};
use super::classify::call_dtype;
use super::fingerprint::format_fingerprint;
use crate::data_structs::typedef::PosType;
use crate::data_structs::Strand;
use crate::plsmallstr;

/// Leading columns of every pattern table, in order.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PatternColumn {
    Seqnames,
    Strand,
    Start,
    End,
    Nbase,
    Beta,
    Pattern,
}

impl PatternColumn {
    pub const ALL: [PatternColumn; 7] = [
        PatternColumn::Seqnames,
        PatternColumn::Strand,
        PatternColumn::Start,
        PatternColumn::End,
        PatternColumn::Nbase,
        PatternColumn::Beta,
        PatternColumn::Pattern,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PatternColumn::Seqnames => "seqnames",
            PatternColumn::Strand => "strand",
            PatternColumn::Start => "start",
            PatternColumn::End => "end",
            PatternColumn::Nbase => "nbase",
            PatternColumn::Beta => "beta",
            PatternColumn::Pattern => "pattern",
        }
    }

    /// `seqnames_dtype` is the chromosome `Enum` of the source read table.
    pub fn dtype(
        &self,
        seqnames_dtype: &DataType,
    ) -> DataType {
        match self {
            PatternColumn::Seqnames => seqnames_dtype.clone(),
            PatternColumn::Strand => Strand::dtype(),
            PatternColumn::Start | PatternColumn::End | PatternColumn::Nbase => {
                DataType::UInt32
            },
            PatternColumn::Beta => DataType::Float64,
            PatternColumn::Pattern => DataType::String,
        }
    }

    #[inline(always)]
    pub fn col(&self) -> Expr {
        col(self.as_str())
    }
}

/// Extraction result: one row per fingerprinted read, metadata columns
/// followed by one call-code column per position.
#[derive(Debug, Clone)]
pub struct PatternTable {
    data:           DataFrame,
    n_reads:        usize,
    reserved_codes: usize,
}

impl PatternTable {
    /// Zero-row table with the metadata columns only.
    pub fn empty(
        seqnames_dtype: &DataType,
        n_reads: usize,
    ) -> PolarsResult<Self> {
        let columns = PatternColumn::ALL
            .iter()
            .map(|c| {
                Column::from(Series::new_empty(
                    plsmallstr!(c.as_str()),
                    &c.dtype(seqnames_dtype),
                ))
            })
            .collect_vec();
        Ok(Self {
            data: DataFrame::new(columns)?,
            n_reads,
            reserved_codes: 0,
        })
    }

    /// Converts records and code buffers into a table. Columns are named by
    /// their decimal position; reserved codes are written as nulls and
    /// counted.
    pub fn assemble(
        records: Vec<PatternRecord>,
        buffers: PatternColumns,
        n_reads: usize,
        seqname: &str,
        seqnames_dtype: &DataType,
    ) -> PolarsResult<Self> {
        if records.is_empty() {
            return Self::empty(seqnames_dtype, n_reads);
        }
        let height = records.len();

        let mut columns = Vec::with_capacity(PatternColumn::ALL.len() + buffers.n_columns());
        columns.push(
            Series::new(
                PatternColumn::Seqnames.as_str().into(),
                vec![seqname; height],
            )
            .cast(seqnames_dtype)?,
        );
        columns.push(
            Series::new(
                PatternColumn::Strand.as_str().into(),
                records.iter().map(|r| r.strand.as_str()).collect_vec(),
            )
            .cast(&Strand::dtype())?,
        );
        columns.push(Series::new(
            PatternColumn::Start.as_str().into(),
            records.iter().map(|r| r.start).collect_vec(),
        ));
        columns.push(Series::new(
            PatternColumn::End.as_str().into(),
            records.iter().map(|r| r.end).collect_vec(),
        ));
        columns.push(Series::new(
            PatternColumn::Nbase.as_str().into(),
            records.iter().map(|r| r.nbase).collect_vec(),
        ));
        columns.push(Series::new(
            PatternColumn::Beta.as_str().into(),
            records.iter().map(|r| r.beta).collect_vec(),
        ));
        columns.push(Series::new(
            PatternColumn::Pattern.as_str().into(),
            records
                .iter()
                .map(|r| format_fingerprint(r.fingerprint))
                .collect_vec(),
        ));

        let dtype = call_dtype();
        let mut reserved_codes = 0;
        for (pos, codes) in buffers.into_sorted() {
            reserved_codes += codes.iter().filter(|c| c.is_reserved()).count();
            let labels = codes.iter().map(|c| c.output_label()).collect_vec();
            columns.push(Series::new(pos.to_string().into(), labels).cast(&dtype)?);
        }
        if reserved_codes > 0 {
            warn!(
                "{} calls or bases outside the expected alphabet were written as nulls",
                reserved_codes
            );
        }

        let data = DataFrame::new(columns.into_iter().map(Column::from).collect())?;
        debug!("Assembled pattern table of shape {:?}", data.shape());
        Ok(Self {
            data,
            n_reads,
            reserved_codes,
        })
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Number of fingerprinted reads.
    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Number of reads that qualified by overlap, including reads without a
    /// pattern.
    pub fn n_reads(&self) -> usize {
        self.n_reads
    }

    /// Cells whose call or base fell outside the expected alphabet.
    pub fn reserved_codes(&self) -> usize {
        self.reserved_codes
    }

    /// Genomic positions of the call-code columns, ascending.
    pub fn positions(&self) -> Vec<PosType> {
        self.data
            .get_column_names()
            .into_iter()
            .skip(PatternColumn::ALL.len())
            .filter_map(|name| name.parse::<PosType>().ok())
            .collect()
    }

    /// Groups reads by fingerprint: one row per distinct pattern with its
    /// read count, mean beta and per-position codes, most frequent first.
    pub fn summarize(&self) -> PolarsResult<DataFrame> {
        let mut aggs = vec![
            len().cast(DataType::UInt32).alias("count"),
            PatternColumn::Seqnames.col().first(),
            PatternColumn::Nbase.col().first(),
            PatternColumn::Beta.col().mean(),
        ];
        aggs.extend(self.positions().iter().map(|pos| col(pos.to_string()).first()));

        self.data
            .clone()
            .lazy()
            .group_by([PatternColumn::Pattern.col()])
            .agg(aggs)
            .sort(
                ["count", PatternColumn::Pattern.as_str()],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()
    }
}
