//! Null-encoding descriptors.
//!
//! The foreign side reports nullness as a loose `(null_type, value)` pair
//! (`NullDescription`). It is converted once, at the column boundary, into the
//! closed `NullEncoding` sum type in which each variant carries only the data its
//! branch needs. Unknown codes from newer protocol revisions are rejected there.

use serde::{Deserialize, Serialize};

use crate::error::InterchangeError;

/// A value that marks a null slot under the `USE_SENTINEL` encoding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Sentinel {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Sentinel {
    /// Whether a mask encoding carrying this value uses the inverted sense.
    ///
    /// Any non-zero number or `true` inverts; strings never do.
    pub fn inverts_mask(&self) -> bool {
        match self {
            Sentinel::Int(v) => *v != 0,
            Sentinel::UInt(v) => *v != 0,
            Sentinel::Float(v) => *v != 0.0,
            Sentinel::Bool(v) => *v,
            Sentinel::Str(_) => false,
        }
    }
}

/// The raw `describe_null` pair as reported by an interchange column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NullDescription {
    pub null_type: i32,
    pub value: Option<Sentinel>,
}

impl NullDescription {
    pub const NON_NULLABLE: i32 = 0;
    pub const USE_NAN: i32 = 1;
    pub const USE_SENTINEL: i32 = 2;
    pub const USE_BITMASK: i32 = 3;
    pub const USE_BYTEMASK: i32 = 4;

    pub fn new(null_type: i32, value: Option<Sentinel>) -> Self {
        Self { null_type, value }
    }

    pub fn non_nullable() -> Self {
        Self::new(Self::NON_NULLABLE, None)
    }

    /// Arrow-style bitmask where a set bit means "valid".
    pub fn arrow_bitmask() -> Self {
        Self::new(Self::USE_BITMASK, Some(Sentinel::Int(0)))
    }
}

/// How a column encodes its missing values.
#[derive(Debug, Clone, PartialEq)]
pub enum NullEncoding {
    NonNullable,
    UseNan,
    UseSentinel(Sentinel),
    /// One bit per element. `inverted` means a set bit marks a null.
    UseBitmask { inverted: bool },
    /// One byte per element. `inverted` means a non-zero byte marks a null.
    UseBytemask { inverted: bool },
}

impl TryFrom<&NullDescription> for NullEncoding {
    type Error = InterchangeError;

    fn try_from(desc: &NullDescription) -> Result<Self, Self::Error> {
        let inverted = || desc.value.as_ref().map_or(false, Sentinel::inverts_mask);

        match desc.null_type {
            NullDescription::NON_NULLABLE => Ok(NullEncoding::NonNullable),
            NullDescription::USE_NAN => Ok(NullEncoding::UseNan),
            NullDescription::USE_SENTINEL => match &desc.value {
                Some(value) => Ok(NullEncoding::UseSentinel(value.clone())),
                None => Err(InterchangeError::UnsupportedNullEncoding(
                    "sentinel null encoding without a sentinel value".to_string(),
                )),
            },
            NullDescription::USE_BITMASK => Ok(NullEncoding::UseBitmask {
                inverted: inverted(),
            }),
            NullDescription::USE_BYTEMASK => Ok(NullEncoding::UseBytemask {
                inverted: inverted(),
            }),
            other => Err(InterchangeError::UnsupportedNullEncoding(format!(
                "unsupported null type: {}",
                other
            ))),
        }
    }
}
