// --- IN: src/null_handling/validity.rs ---

//! Validity mask synthesis for the five interchange null encodings.
//!
//! Each encoding resolves to an Arrow `NullBuffer` (or to `None` when every
//! value is valid) in a single pass. Bitmasks in Arrow's own sense are the only
//! encoding that can be honoured without a copy; every other branch checks
//! `allow_copy` before doing any work.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, LargeStringArray, Scalar,
    UInt64Array,
};
use arrow::buffer::{BooleanBuffer, NullBuffer};
use arrow::compute::kernels::cmp::neq;
use arrow::compute::{cast, not};
use arrow::datatypes::{DataType, Float32Type, Float64Type};

use crate::bridge::buffers::{reconstruct_data_buffer, PinnedBuffer};
use crate::error::InterchangeError;
use crate::types::{NullEncoding, ProtocolDtype, Sentinel};

/// Reason reported when a NaN or sentinel encoding has to be materialized.
const CONSTRUCT_BITMASK: &str = "bitmask must be constructed";

//==================================================================================
// 1. Dispatcher
//==================================================================================

/// Builds the validity of a column of `size` elements at element `offset`.
///
/// `data` is the column's reconstructed values without any validity; it is
/// consulted by the NaN and sentinel encodings only.
pub fn synthesize_validity(
    encoding: &NullEncoding,
    null_count: Option<usize>,
    validity: Option<&PinnedBuffer>,
    data: &dyn Array,
    size: usize,
    offset: usize,
    allow_copy: bool,
) -> Result<Option<NullBuffer>, InterchangeError> {
    if null_count == Some(0) {
        return Ok(None);
    }

    match encoding {
        NullEncoding::NonNullable => Ok(None),
        NullEncoding::UseBitmask { inverted } => match validity {
            Some((buffer, _)) => from_bitmask(buffer, *inverted, size, offset, allow_copy),
            None => Ok(None),
        },
        NullEncoding::UseBytemask { inverted } => match validity {
            Some((buffer, _)) => from_bytemask(buffer, *inverted, size, offset, allow_copy),
            None => Ok(None),
        },
        NullEncoding::UseNan => {
            if !allow_copy {
                return Err(InterchangeError::copy_not_allowed(CONSTRUCT_BITMASK));
            }
            not_nan_mask(data)
        }
        NullEncoding::UseSentinel(value) => {
            if !allow_copy {
                return Err(InterchangeError::copy_not_allowed(CONSTRUCT_BITMASK));
            }
            not_sentinel_mask(data, value)
        }
    }
}

//==================================================================================
// 2. Per-Encoding Builders
//==================================================================================

/// One bit per element. Zero-copy unless the sense of the bits is inverted.
fn from_bitmask(
    buffer: &arrow::buffer::Buffer,
    inverted: bool,
    size: usize,
    offset: usize,
    allow_copy: bool,
) -> Result<Option<NullBuffer>, InterchangeError> {
    if inverted && !allow_copy {
        return Err(InterchangeError::copy_not_allowed("bitmask must be inverted"));
    }

    let bits = reconstruct_data_buffer(buffer, &ProtocolDtype::bitmask(), size, offset)?;
    let mut mask = bits.as_boolean().clone();
    if inverted {
        mask = not(&mask)?;
    }
    Ok(into_validity(&mask))
}

/// One byte per element, always converted into a bitmask.
fn from_bytemask(
    buffer: &arrow::buffer::Buffer,
    inverted: bool,
    size: usize,
    offset: usize,
    allow_copy: bool,
) -> Result<Option<NullBuffer>, InterchangeError> {
    if !allow_copy {
        return Err(InterchangeError::copy_not_allowed(
            "bytemask must be converted into a bitmask",
        ));
    }

    let available = buffer.len().checked_sub(offset).ok_or_else(|| {
        InterchangeError::InvalidBuffer(format!(
            "offset {} is past the end of a bytemask of {} bytes",
            offset,
            buffer.len()
        ))
    })?;
    let bytes = reconstruct_data_buffer(buffer, &ProtocolDtype::bytemask(), available, offset)?;
    if bytes.len() < size {
        return Err(InterchangeError::InvalidBuffer(format!(
            "bytemask holds {} entries for a column of {} elements",
            bytes.len(),
            size
        )));
    }

    let as_bool = cast(&bytes.slice(0, size), &DataType::Boolean)?;
    let mut mask = as_bool.as_boolean().clone();
    if inverted {
        mask = not(&mask)?;
    }
    Ok(into_validity(&mask))
}

fn not_nan_mask(data: &dyn Array) -> Result<Option<NullBuffer>, InterchangeError> {
    let mask = match data.data_type() {
        DataType::Float32 => {
            BooleanArray::from_unary(data.as_primitive::<Float32Type>(), |v| !v.is_nan())
        }
        DataType::Float64 => {
            BooleanArray::from_unary(data.as_primitive::<Float64Type>(), |v| !v.is_nan())
        }
        dt => {
            return Err(InterchangeError::UnsupportedNullEncoding(format!(
                "NaN null encoding requires a float column, got {}",
                dt
            )))
        }
    };
    Ok(into_validity(&mask))
}

fn not_sentinel_mask(
    data: &dyn Array,
    value: &Sentinel,
) -> Result<Option<NullBuffer>, InterchangeError> {
    let sentinel: ArrayRef = match value {
        Sentinel::Int(v) => Arc::new(Int64Array::from(vec![*v])),
        Sentinel::UInt(v) => Arc::new(UInt64Array::from(vec![*v])),
        Sentinel::Float(v) => Arc::new(Float64Array::from(vec![*v])),
        Sentinel::Bool(v) => Arc::new(BooleanArray::from(vec![*v])),
        Sentinel::Str(v) => Arc::new(LargeStringArray::from(vec![v.as_str()])),
    };
    let converted = cast(&sentinel, data.data_type())?;

    // A sentinel that does not convert exactly into the column's type cannot occur in it.
    let exact = !converted.is_null(0)
        && cast(&converted, sentinel.data_type())
            .map_or(false, |back| back.to_data() == sentinel.to_data());
    if !exact {
        log::debug!(
            "sentinel {:?} is not representable as {}; column has no nulls",
            value,
            data.data_type()
        );
        return Ok(None);
    }

    let mask = neq(&data, &Scalar::new(converted))?;
    Ok(into_validity(&mask))
}

//==================================================================================
// 3. Helpers
//==================================================================================

/// Converts a "value is valid" boolean array into a `NullBuffer`, treating
/// null mask entries as null values. Returns `None` when nothing is null.
fn into_validity(mask: &BooleanArray) -> Option<NullBuffer> {
    let valid: BooleanBuffer = match mask.nulls() {
        Some(nulls) => mask.values() & nulls.inner(),
        None => mask.values().clone(),
    };
    Some(NullBuffer::new(valid)).filter(|nulls| nulls.null_count() > 0)
}
