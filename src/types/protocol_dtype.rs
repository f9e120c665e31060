//! This module defines the interchange protocol's data type descriptor and its
//! bidirectional mapping onto Arrow's `DataType`.
//!
//! The protocol describes a type as a 4-tuple `(kind, bit_width, format, endianness)`
//! where `format` is an Arrow C Data Interface format string. Temporal kinds carry
//! their unit and time zone inside the format string (see `types::temporal`).

use arrow_schema::DataType as ArrowDataType;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InterchangeError;
use crate::types::temporal;

/// The protocol's coarse type category. Discriminants match the protocol's
/// `DtypeKind` enum.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DtypeKind {
    Int = 0,
    UInt = 1,
    Float = 2,
    Bool = 20,
    String = 21,
    Datetime = 22,
    Categorical = 23,
}

/// Byte order of a buffer, encoded with the same characters the protocol uses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=`
    #[default]
    Native,
    /// `|`
    NotApplicable,
}

impl Endianness {
    pub fn as_char(&self) -> char {
        match self {
            Endianness::Little => '<',
            Endianness::Big => '>',
            Endianness::Native => '=',
            Endianness::NotApplicable => '|',
        }
    }

    /// Whether buffers in this byte order can be read without swapping on this target.
    pub fn is_native(&self) -> bool {
        match self {
            Endianness::Native | Endianness::NotApplicable => true,
            Endianness::Little => cfg!(target_endian = "little"),
            Endianness::Big => cfg!(target_endian = "big"),
        }
    }
}

/// The interchange protocol's data type descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolDtype {
    pub kind: DtypeKind,
    pub bit_width: u32,
    pub format: String,
    pub endianness: Endianness,
}

impl ProtocolDtype {
    pub fn new(kind: DtypeKind, bit_width: u32, format: impl Into<String>) -> Self {
        Self {
            kind,
            bit_width,
            format: format.into(),
            endianness: Endianness::Native,
        }
    }

    /// The dtype of a one-bit-per-element validity bitmask.
    pub fn bitmask() -> Self {
        Self::new(DtypeKind::Bool, 1, "b")
    }

    /// The dtype of a one-byte-per-element validity bytemask.
    pub fn bytemask() -> Self {
        Self::new(DtypeKind::Int, 8, "c")
    }

    /// Converts an Arrow `DataType` into its protocol descriptor.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Result<Self, InterchangeError> {
        use DtypeKind::*;

        let dtype = match arrow_type {
            ArrowDataType::Int8 => Self::new(Int, 8, "c"),
            ArrowDataType::Int16 => Self::new(Int, 16, "s"),
            ArrowDataType::Int32 => Self::new(Int, 32, "i"),
            ArrowDataType::Int64 => Self::new(Int, 64, "l"),
            ArrowDataType::UInt8 => Self::new(UInt, 8, "C"),
            ArrowDataType::UInt16 => Self::new(UInt, 16, "S"),
            ArrowDataType::UInt32 => Self::new(UInt, 32, "I"),
            ArrowDataType::UInt64 => Self::new(UInt, 64, "L"),
            ArrowDataType::Float32 => Self::new(Float, 32, "f"),
            ArrowDataType::Float64 => Self::new(Float, 64, "g"),
            ArrowDataType::Boolean => Self::new(Bool, 1, "b"),
            ArrowDataType::LargeUtf8 => Self::new(String, 8, "U"),
            ArrowDataType::Date32
            | ArrowDataType::Date64
            | ArrowDataType::Time32(_)
            | ArrowDataType::Time64(_)
            | ArrowDataType::Timestamp(_, _)
            | ArrowDataType::Duration(_) => {
                let (bit_width, format) = temporal::to_format(arrow_type)?;
                Self::new(Datetime, bit_width, format)
            }
            ArrowDataType::Dictionary(key, value)
                if **key == ArrowDataType::UInt32 && **value == ArrowDataType::LargeUtf8 =>
            {
                Self::new(Categorical, 32, "I")
            }
            dt => {
                return Err(InterchangeError::UnsupportedType(format!(
                    "data type {} not supported by the interchange protocol",
                    dt
                )))
            }
        };
        Ok(dtype)
    }

    /// Converts the protocol descriptor back into the logical Arrow `DataType`.
    ///
    /// Categorical descriptors always map to `Dictionary(UInt32, LargeUtf8)`;
    /// the width of the codes is a buffer-level concern.
    pub fn to_arrow_type(&self) -> Result<ArrowDataType, InterchangeError> {
        if !self.endianness.is_native() {
            return Err(InterchangeError::UnsupportedFormat(format!(
                "non-native byte order '{}' for {:?}",
                self.endianness.as_char(),
                self.format
            )));
        }

        match self.kind {
            DtypeKind::Datetime => temporal::from_format(&self.format),
            DtypeKind::Categorical => Ok(categorical_type()),
            kind => match (kind, self.bit_width) {
                (DtypeKind::Int, 8) => Ok(ArrowDataType::Int8),
                (DtypeKind::Int, 16) => Ok(ArrowDataType::Int16),
                (DtypeKind::Int, 32) => Ok(ArrowDataType::Int32),
                (DtypeKind::Int, 64) => Ok(ArrowDataType::Int64),
                (DtypeKind::UInt, 8) => Ok(ArrowDataType::UInt8),
                (DtypeKind::UInt, 16) => Ok(ArrowDataType::UInt16),
                (DtypeKind::UInt, 32) => Ok(ArrowDataType::UInt32),
                (DtypeKind::UInt, 64) => Ok(ArrowDataType::UInt64),
                (DtypeKind::Float, 32) => Ok(ArrowDataType::Float32),
                (DtypeKind::Float, 64) => Ok(ArrowDataType::Float64),
                (DtypeKind::Bool, 1) => Ok(ArrowDataType::Boolean),
                (DtypeKind::String, 8) => Ok(ArrowDataType::LargeUtf8),
                _ => Err(InterchangeError::UnsupportedFormat(format!(
                    "unsupported data type: {:?} ({:?}, {} bits)",
                    self.format, self.kind, self.bit_width
                ))),
            },
        }
    }

    /// The Arrow type of the raw storage behind a buffer with this dtype.
    ///
    /// This differs from `to_arrow_type` for categorical data (the codes are
    /// stored as UInt32) and strings (the data buffer is plain UTF-8 bytes).
    pub fn physical_arrow_type(&self) -> Result<ArrowDataType, InterchangeError> {
        match self.to_arrow_type()? {
            ArrowDataType::Dictionary(key, _) => Ok(*key),
            ArrowDataType::LargeUtf8 => Ok(ArrowDataType::UInt8),
            dt => Ok(dt),
        }
    }

    /// Number of bytes per element, failing for sub-byte widths.
    pub fn bytes_per_element(&self) -> Result<usize, InterchangeError> {
        if self.bit_width == 0 || self.bit_width % 8 != 0 {
            return Err(InterchangeError::InvalidBuffer(format!(
                "cannot get buffer length for buffer with dtype {}",
                self
            )));
        }
        Ok((self.bit_width / 8) as usize)
    }
}

impl fmt::Display for ProtocolDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?}, {}, {:?}, '{}')",
            self.kind,
            self.bit_width,
            self.format,
            self.endianness.as_char()
        )
    }
}

/// The Arrow type used for categorical columns.
pub fn categorical_type() -> ArrowDataType {
    ArrowDataType::Dictionary(
        Box::new(ArrowDataType::UInt32),
        Box::new(ArrowDataType::LargeUtf8),
    )
}
