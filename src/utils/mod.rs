//! Utility functions and helper macros shared across the crate.
//!
//! - Construction of Polars `Enum` data types from fixed label lists.
//! - Macros for common struct operations (`PlSmallStr` construction, builder-style
//!   `with_*` methods).
//! - [`CancelToken`], the cooperative interruption flag checked by long
//!   scans.

use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;

use itertools::Itertools;
use polars::prelude::*;

/// Creates an `Enum` data type from a list of categories.
///
/// The physical code of every category equals its index in `categories`.
pub fn get_categorical_dtype(categories: Vec<String>) -> DataType {
    let categories = polars::export::arrow::array::Utf8ViewArray::from_vec(
        categories.iter().map(String::as_str).collect_vec(),
        ArrowDataType::Utf8View,
    );
    let rev_mapping = Arc::new(RevMapping::build_local(categories));
    DataType::Enum(Some(rev_mapping), CategoricalOrdering::Physical)
}

#[macro_export]
macro_rules! plsmallstr {
    ($string: expr) => {
        PlSmallStr::from($string)
    };
    () => {
        PlSmallStr::from("")
    };
}

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
                self.$field_name = value;
                self
            }
        }
    };
}

/// Shared flag used to interrupt a running extraction.
///
/// Cloning the token shares the underlying flag, so one clone can be handed
/// to a worker while another stays with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Running scans stop at their next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
