use std::fs::File;
use std::path::{
    Path,
    PathBuf,
};
use std::str::FromStr;

use anyhow::anyhow;
use clap::Args;
use console::style;
use epipattern::prelude::*;
use itertools::Itertools;
use log::{
    debug,
    info,
    warn,
};
use polars::prelude::*;
use rayon::prelude::*;

use crate::utils::UtilsArgs;

/// Region given as `chr:start-end`, 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RegionArg {
    chr:   String,
    start: PosType,
    end:   PosType,
}

impl RegionArg {
    fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.chr, self.start, self.end)
    }
}

impl FromStr for RegionArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chr, range) = s
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("Region '{}' is not of the form chr:start-end", s))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| anyhow!("Region '{}' is not of the form chr:start-end", s))?;
        let start = start.replace(',', "").parse::<PosType>()?;
        let end = end.replace(',', "").parse::<PosType>()?;
        if chr.is_empty() || start > end {
            return Err(anyhow!("Invalid region '{}'", s));
        }
        Ok(Self {
            chr: chr.to_string(),
            start,
            end,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ExtractArgs {
    #[arg(help = "Tab-separated reads with columns rname, strand, start, xm, seq.")]
    input:  PathBuf,
    #[arg(
        short = 'r',
        long = "region",
        required = true,
        help = "Target regions as chr:start-end. May be repeated."
    )]
    regions: Vec<RegionArg>,
    #[arg(
        short = 'o',
        long,
        required = true,
        help = "Directory for the generated tables."
    )]
    output: PathBuf,
    #[arg(
        long,
        default_value_t = false,
        help = "Write one row per distinct pattern instead of one row per read."
    )]
    summary: bool,

    #[arg(
        long,
        help_heading = "PATTERN ARGS",
        help = "JSON file with the extraction config. Overrides the flags below."
    )]
    config: Option<PathBuf>,
    #[arg(
        short,
        long,
        default_value = "CG",
        help_heading = "PATTERN ARGS",
        help = "Methylation context. CG/CHG/CHH."
    )]
    context: Context,
    #[arg(
        long,
        default_value_t = 1,
        allow_negative_numbers = true,
        help_heading = "PATTERN ARGS",
        help = "Minimum overlap between a read and the region."
    )]
    min_overlap: i64,
    #[arg(
        short = 'f',
        long,
        default_value_t = 0.0,
        help_heading = "PATTERN ARGS",
        help = "Minimum fraction of reads with a call at a position for it to \
                become a column."
    )]
    min_ctx_freq: DensityType,
    #[arg(
        long,
        default_value_t = false,
        help_heading = "PATTERN ARGS",
        help = "Clip reads to the region."
    )]
    clip: bool,
    #[arg(
        long,
        help_heading = "PATTERN ARGS",
        help = "Shift of reverse strand positions. Defaults to the context's offset."
    )]
    reverse_offset: Option<PosType>,
    #[arg(
        long,
        value_delimiter = ',',
        help_heading = "PATTERN ARGS",
        help = "Ascending positions whose sequenced bases are added to every pattern."
    )]
    highlight: Vec<PosType>,
}

impl ExtractArgs {
    fn pattern_config(&self) -> anyhow::Result<PatternConfig> {
        if let Some(path) = &self.config {
            info!("Reading config from {}", path.display());
            return PatternConfig::from_json_file(path);
        }
        let mut config = PatternConfig::from_context(self.context)
            .with_min_overlap(self.min_overlap)
            .with_min_ctx_freq(self.min_ctx_freq)
            .with_clip(self.clip)
            .with_highlight(self.highlight.clone());
        if let Some(offset) = self.reverse_offset {
            config = config.with_reverse_offset(offset);
        }
        Ok(config)
    }

    fn read_input(&self) -> anyhow::Result<ReadTable> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(b'\t')
                    .with_try_parse_dates(false),
            )
            .try_into_reader_with_file_path(Some(self.input.clone()))?
            .finish()?;
        debug!("Read input of shape {:?}", df.shape());
        ReadTable::try_from_df(&df)
    }

    fn write_table(
        &self,
        region: &RegionArg,
        table: PatternTable,
    ) -> anyhow::Result<usize> {
        let (suffix, mut df) = if self.summary {
            ("summary", table.summarize()?)
        }
        else {
            ("patterns", table.into_inner())
        };
        let path = self
            .output
            .join(format!("{}.{}.tsv", region.file_stem(), suffix));
        write_tsv(&path, &mut df)?;
        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(df.height())
    }

    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let config = self.pattern_config()?;
        info!("Using config {}", serde_json::to_string(&config)?);

        let reads = self.read_input()?;
        info!("Loaded {} reads from {}", reads.len(), self.input.display());

        let targets = self
            .regions
            .iter()
            .unique()
            .filter_map(|region| {
                match reads.region(&region.chr, region.start, region.end) {
                    Ok(target) => Some(Ok((region, target))),
                    Err(_) if reads.seqname_id(&region.chr).is_none() => {
                        warn!("No reads on {}, skipping {}", region.chr, region.file_stem());
                        None
                    },
                    Err(e) => Some(Err(e)),
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        std::fs::create_dir_all(&self.output)?;
        let cancel = CancelToken::new();
        let extractor =
            PatternExtractor::try_new(&reads, config)?.with_cancel(cancel.clone());
        let pbar = utils.pbar(targets.len())?;

        let results = targets
            .par_iter()
            .map(|(region, target)| {
                let res = extractor
                    .extract(target)
                    .and_then(|table| self.write_table(region, table));
                if res.is_err() {
                    cancel.cancel();
                }
                pbar.inc(1);
                res
            })
            .collect::<Vec<_>>();
        pbar.finish_and_clear();

        let mut rows = 0;
        let mut first_err = None;
        for res in results {
            match res {
                Ok(n) => rows += n,
                Err(e) if is_cancelled(&e) => {},
                Err(e) => {
                    first_err.get_or_insert(e);
                },
            }
        }
        if let Some(e) = first_err {
            return Err(e);
        }

        eprintln!(
            "[{}] Wrote {} rows for {} regions to {}",
            style("V").green(),
            style(rows).green(),
            targets.len(),
            self.output.display()
        );
        Ok(())
    }
}

fn write_tsv(
    path: &Path,
    df: &mut DataFrame,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(df)?;
    Ok(())
}
