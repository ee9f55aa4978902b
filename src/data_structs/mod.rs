//! Core value types of the crate.
//!
//! - [`ReadTable`]: merged, genome-anchored reads with their methylation
//!   call and sequence strings, as produced by the read-loading stage.
//!   [`ReadTableBuilder`] assembles one read by read.
//! - [`TargetRegion`]: the inclusive genomic interval an extraction runs
//!   over.
//! - Common enumerations: [`Context`] for the cytosine context and
//!   [`Strand`] for read strand.
//! - [`typedef`]: aliases for positions, counts and densities.

mod enums;
pub mod reads;
mod region;
pub mod typedef;


pub use enums::{
    Context,
    Strand,
};
pub use reads::{
    ReadTable,
    ReadTableBuilder,
    ReadView,
};
pub use region::TargetRegion;
