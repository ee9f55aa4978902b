//! # epipattern
//!
//! `epipattern` identifies and fingerprints DNA-methylation epialleles: the
//! co-methylation patterns carried by individual sequencing reads over a
//! genomic region. It works on reads that were already merged and anchored
//! to the genome, each carrying a Bismark-style methylation call string
//! (`z`/`Z`, `x`/`X`, `h`/`H`, ...) and a sequence string of the same
//! length.
//!
//! For a target region the extractor selects overlapping reads, finds the
//! positions that are covered by enough of them, and builds for every read a
//! row with its calls at those positions, its methylation fraction and an
//! FNV-1a fingerprint of the pattern. Bases at user-chosen positions (e.g. a
//! SNP) can be reported alongside and become part of the fingerprint, which
//! allows linking a variant to methylation patterns.
//!
//! Results are Polars `DataFrame`s whose call columns share one 16-level
//! `Enum` data type, see [`CALL_LABELS`](tools::patterns::CALL_LABELS).
//!
//! ## Structure
//!
//! * [`data_structs`]: input reads ([`ReadTable`](data_structs::ReadTable)),
//!   target regions and the common enumerations.
//! * [`tools`]: the pattern extraction engine.
//! * [`error`]: the typed failures surfaced through `anyhow`.
//! * [`utils`]: Polars data type helpers, builder macros and the
//!   cancellation token.
//!
//! ## Usage
//!
//! ```no_run
//! use epipattern::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut builder = ReadTableBuilder::new();
//!     builder
//!         .push_read("chr1", Strand::Forward, 100, b"Z...z", b"CGTAC")
//!         .push_read("chr1", Strand::Forward, 100, b"Z...Z", b"CGTAC");
//!     let reads = builder.build()?;
//!
//!     let target = reads.region("chr1", 100, 104)?;
//!     let config = PatternConfig::from_context(Context::CG)
//!         .with_min_ctx_freq(0.5)
//!         .with_clip(true);
//!
//!     let table = extract_patterns(&reads, &target, &config)?;
//!     println!("{}", table.summarize()?);
//!     Ok(())
//! }
//! ```

pub mod data_structs;
pub mod error;
pub mod prelude;
pub mod tools;
pub mod utils;
