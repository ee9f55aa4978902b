//! Analytical tools built on top of [`crate::data_structs`].
//!
//! - [`patterns`]: epiallele pattern extraction and fingerprinting.

pub mod patterns;
