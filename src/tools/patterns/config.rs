use std::path::Path;

use anyhow::{
    bail,
    Context as _,
};
use itertools::Itertools;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::{
    DensityType,
    PosType,
};
use crate::data_structs::Context;
use crate::error::PatternError;
use crate::with_field_fn;

/// Parameters of a pattern extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Call characters treated as in context, e.g. `"zZ"` for CpG.
    pub context:        String,
    /// Reads overlapping the target by fewer bases are skipped. Zero or
    /// negative values admit reads that do not touch the target at all.
    pub min_overlap:    i64,
    /// Minimum fraction of qualifying reads a position must be observed in
    /// to become a pattern column.
    pub min_ctx_freq:   DensityType,
    /// Restrict every read to its overlap with the target.
    pub clip:           bool,
    /// Subtracted from reverse-strand coordinates.
    pub reverse_offset: PosType,
    /// Positions whose sequenced base is reported and fingerprinted.
    /// Strictly increasing.
    pub highlight:      Vec<PosType>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self::from_context(Context::CG)
    }
}

impl PatternConfig {
    with_field_fn!(context, String);
    with_field_fn!(min_overlap, i64);
    with_field_fn!(min_ctx_freq, DensityType);
    with_field_fn!(clip, bool);
    with_field_fn!(reverse_offset, PosType);
    with_field_fn!(highlight, Vec<PosType>);

    /// Preset for a cytosine context: its call characters and the matching
    /// reverse-strand offset.
    pub fn from_context(context: Context) -> Self {
        Self {
            context:        context.call_chars().to_string(),
            min_overlap:    1,
            min_ctx_freq:   0.0,
            clip:           false,
            reverse_offset: context.reverse_offset(),
            highlight:      Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("could not read config {}", path.as_ref().display())
        })?;
        Self::from_json_str(&text)
    }

    /// Checks parameter ranges and the ordering of highlight positions.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.min_ctx_freq) {
            bail!(PatternError::contract(format!(
                "min_ctx_freq must lie in [0, 1], got {}",
                self.min_ctx_freq
            )));
        }
        if let Some((a, b)) = self
            .highlight
            .iter()
            .tuple_windows()
            .find(|(a, b)| a >= b)
        {
            bail!(PatternError::contract(format!(
                "highlight positions must be sorted and unique, found {} before {}",
                a, b
            )));
        }
        if self.context.is_empty() {
            bail!(PatternError::contract("context character set is empty"));
        }
        if !self.context.is_ascii() {
            bail!(PatternError::contract(format!(
                "context characters must be ASCII, got {:?}",
                self.context
            )));
        }
        Ok(())
    }
}
