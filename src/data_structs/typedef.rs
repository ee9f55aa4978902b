/// Genomic coordinate, 1-based.
pub type PosType = u32;
/// Per-read or per-position observation count.
pub type CountType = u32;
/// Methylation fraction.
pub type DensityType = f64;
