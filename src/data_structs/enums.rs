use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use polars::prelude::DataType;
use serde::{
    Deserialize,
    Serialize,
};

use crate::error::PatternError;
use crate::utils::get_categorical_dtype;

/// Cytosine methylation context.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum Context {
    /// CG context.
    CG,
    /// CHG context.
    CHG,
    /// CHH context.
    CHH,
}

impl Context {
    /// Methylation call characters (Bismark XM alphabet) of this context.
    pub const fn call_chars(&self) -> &'static str {
        match self {
            Context::CG => "zZ",
            Context::CHG => "xX",
            Context::CHH => "hH",
        }
    }

    /// Shift applied to reverse-strand coordinates so that both cytosines
    /// of a symmetric context land on the same position.
    pub const fn reverse_offset(&self) -> u32 {
        match self {
            Context::CG => 1,
            Context::CHG => 2,
            Context::CHH => 0,
        }
    }
}

impl Display for Context {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Context::CG => write!(f, "CG"),
            Context::CHG => write!(f, "CHG"),
            Context::CHH => write!(f, "CHH"),
        }
    }
}

impl FromStr for Context {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CG" | "CPG" => Ok(Context::CG),
            "CHG" => Ok(Context::CHG),
            "CHH" => Ok(Context::CHH),
            _ => {
                Err(PatternError::contract(format!(
                    "unknown methylation context '{}', expected CG, CHG or CHH",
                    s
                ))
                .into())
            },
        }
    }
}

/// Read strand as reported by the read-merging stage.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum Strand {
    /// Forward strand.
    Forward,
    /// Reverse strand.
    Reverse,
    /// Strand could not be assigned.
    None,
}

impl Strand {
    /// Labels shared by input read tables and output pattern tables. The
    /// physical code of a strand is its index here.
    pub const LABELS: [&'static str; 3] = ["+", "-", "*"];

    pub const fn as_str(&self) -> &'static str {
        Self::LABELS[*self as usize]
    }

    /// Polars `Enum` data type over [`Strand::LABELS`].
    pub fn dtype() -> DataType {
        get_categorical_dtype(Self::LABELS.iter().map(|s| s.to_string()).collect())
    }
}

impl FromStr for Strand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "*" => Ok(Strand::None),
            _ => {
                Err(PatternError::contract(format!(
                    "unknown strand label '{}', expected one of +, -, *",
                    s
                ))
                .into())
            },
        }
    }
}

impl Display for Strand {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Strand {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Strand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>, {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}
