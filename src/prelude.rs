pub use crate::data_structs::typedef::{
    CountType,
    DensityType,
    PosType,
};
pub use crate::data_structs::{
    Context,
    ReadTable,
    ReadTableBuilder,
    Strand,
    TargetRegion,
};
pub use crate::error::{
    is_cancelled,
    PatternError,
};
pub use crate::tools::patterns::{
    extract_patterns,
    CallCode,
    PatternConfig,
    PatternExtractor,
    PatternTable,
    CALL_LABELS,
};
pub use crate::utils::CancelToken;
