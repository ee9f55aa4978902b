//! Byte-level classification of methylation calls and nucleotides.
//!
//! Both methylation call characters (`hHxXzZuU`) and plain bases (`ACGT`)
//! map into one 16-slot code space whose labels are [`CALL_LABELS`].
//! Uppercase calls (methylated) occupy slots below 8, lowercase calls slots
//! 8 and above. Slots 0, 4, 7, 8, 12 and 15 are reserved: they are produced
//! only by bytes outside the expected alphabets.

use once_cell::sync::Lazy;
use polars::prelude::DataType;

use crate::utils::get_categorical_dtype;

/// Labels of the 16 call codes.
pub const CALL_LABELS: [&str; 16] = [
    "NA", "H", "A", "C", "NA", "X", "Z", "NA", "NA", "h", "T", "G", "NA", "x",
    "z", "NA",
];

const RESERVED: [bool; 16] = [
    true, false, false, false, true, false, false, true, true, false, false,
    false, true, false, false, true,
];

/// Bytes that may appear in a methylation call string.
const CALL_ALPHABET: &[u8] = b"hHxXzZuU";

/// Slot of a plain base, indexed by `(byte >> 1) & 3`: A, C, T, G.
const BASE_SLOTS: [u8; 4] = [2, 3, 10, 11];

static CALL_DTYPE: Lazy<DataType> = Lazy::new(|| {
    get_categorical_dtype(
        CALL_LABELS
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if RESERVED[i] {
                    format!("{}{}", label, i)
                }
                else {
                    label.to_string()
                }
            })
            .collect(),
    )
});

/// Polars `Enum` data type for call-code columns; the physical value of a
/// category equals its [`CallCode`].
///
/// Reserved slots carry distinct placeholder names (`NA0`, `NA4`, ...) so
/// that every slot keeps its index. They never appear as values, since
/// reserved codes are written as nulls.
pub fn call_dtype() -> DataType {
    CALL_DTYPE.clone()
}

/// One of the 16 call codes, or [`CallCode::MISSING`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallCode(u8);

impl CallCode {
    /// Marks a slot with no observation.
    pub const MISSING: CallCode = CallCode(u8::MAX);

    /// Returns `None` for values outside `0..16`.
    pub const fn new(value: u8) -> Option<Self> {
        if value < 16 {
            Some(CallCode(value))
        }
        else {
            None
        }
    }

    /// Classifies a methylation call character.
    ///
    /// Call bytes map through `((b + 2) >> 2) - 1 (mod 16)`; bytes outside
    /// the call alphabet yield reserved code 0.
    #[inline(always)]
    pub const fn from_call(byte: u8) -> Self {
        let mut i = 0;
        while i < CALL_ALPHABET.len() {
            if CALL_ALPHABET[i] == byte {
                return CallCode(((((byte as u16 + 2) >> 2) + 15) & 15) as u8);
            }
            i += 1;
        }
        CallCode(0)
    }

    /// Classifies a plain nucleotide; anything other than `ACGT` yields
    /// reserved code 0.
    #[inline(always)]
    pub const fn from_base(byte: u8) -> Self {
        match byte {
            b'A' | b'C' | b'G' | b'T' => CallCode(BASE_SLOTS[((byte >> 1) & 3) as usize]),
            _ => CallCode(0),
        }
    }

    pub const fn value(&self) -> u8 {
        self.0
    }

    pub const fn is_missing(&self) -> bool {
        self.0 == Self::MISSING.0
    }

    pub const fn is_reserved(&self) -> bool {
        !self.is_missing() && RESERVED[self.0 as usize]
    }

    /// Methylated iff the code is below 8.
    pub const fn is_methylated(&self) -> bool {
        self.0 < 8
    }

    /// Label of the code, `None` when missing.
    pub fn label(&self) -> Option<&'static str> {
        CALL_LABELS.get(self.0 as usize).copied()
    }

    /// Label written to output tables: missing and reserved codes become
    /// nulls.
    pub fn output_label(&self) -> Option<&'static str> {
        if self.is_reserved() {
            None
        }
        else {
            self.label()
        }
    }
}

/// Byte lookup table of characters treated as in context.
///
/// Holds the caller's call characters plus `A`, `C`, `G` and `T`, which
/// keeps plain bases eligible for highlighting.
#[derive(Clone)]
pub struct ContextMap([bool; 256]);

impl ContextMap {
    pub fn new(context: &[u8]) -> Self {
        let mut table = [false; 256];
        for c in context.iter().chain(b"ACGT") {
            table[*c as usize] = true;
        }
        Self(table)
    }

    #[inline(always)]
    pub fn contains(
        &self,
        byte: u8,
    ) -> bool {
        self.0[byte as usize]
    }
}

impl std::fmt::Debug for ContextMap {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let chars: String = (0..=255u8)
            .filter(|b| self.contains(*b))
            .map(char::from)
            .collect();
        f.debug_tuple("ContextMap").field(&chars).finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b'Z', "Z", true)]
    #[case(b'z', "z", false)]
    #[case(b'X', "X", true)]
    #[case(b'x', "x", false)]
    #[case(b'H', "H", true)]
    #[case(b'h', "h", false)]
    fn test_call_labels(
        #[case] byte: u8,
        #[case] label: &str,
        #[case] methylated: bool,
    ) {
        let code = CallCode::from_call(byte);
        assert_eq!(code.label(), Some(label));
        assert_eq!(code.output_label(), Some(label));
        assert_eq!(code.is_methylated(), methylated);
        assert!(!code.is_reserved());
    }

    #[rstest]
    #[case(b'A', "A")]
    #[case(b'C', "C")]
    #[case(b'G', "G")]
    #[case(b'T', "T")]
    fn test_base_labels(
        #[case] byte: u8,
        #[case] label: &str,
    ) {
        let code = CallCode::from_base(byte);
        assert_eq!(code.label(), Some(label));
        assert!(!code.is_reserved());
    }

    #[test]
    fn test_unknown_bytes_are_reserved() {
        for byte in [b'U', b'u', b'.', b'A', b'G', b'-'] {
            assert!(CallCode::from_call(byte).is_reserved(), "{}", byte as char);
        }
        for byte in [b'N', b'-', b'a', b'Z'] {
            assert!(CallCode::from_base(byte).is_reserved(), "{}", byte as char);
        }
        assert_eq!(CallCode::from_call(b'U').output_label(), None);
    }

    #[test]
    fn test_reserved_slots() {
        let reserved = (0..16u8)
            .filter_map(CallCode::new)
            .filter(CallCode::is_reserved)
            .map(|c| c.value())
            .collect::<Vec<_>>();
        assert_eq!(reserved, vec![0, 4, 7, 8, 12, 15]);
        for code in reserved {
            assert_eq!(CALL_LABELS[code as usize], "NA");
        }
    }

    #[test]
    fn test_missing() {
        assert!(CallCode::MISSING.is_missing());
        assert!(!CallCode::MISSING.is_reserved());
        assert_eq!(CallCode::MISSING.label(), None);
        assert_eq!(CallCode::new(16), None);
    }

    #[test]
    fn test_context_map() {
        let map = ContextMap::new(b"zZ");
        for byte in b"zZACGT" {
            assert!(map.contains(*byte));
        }
        for byte in b"xXhH.N" {
            assert!(!map.contains(*byte));
        }
    }

    #[test]
    fn test_call_dtype_positions() {
        use polars::prelude::*;

        let series = Series::new("c".into(), &["Z", "z", "A"])
            .cast(&call_dtype())
            .unwrap();
        let physical = series.to_physical_repr().into_owned();
        let codes: Vec<Option<u32>> = physical.u32().unwrap().into_iter().collect();
        assert_eq!(codes, vec![Some(6), Some(14), Some(2)]);
    }
}
