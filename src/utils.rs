//! This module provides a set of shared, low-level helpers for the buffer
//! reconstruction path.
//!
//! Its responsibilities include:
//! 1.  Sizing foreign buffers in elements of their declared dtype.
//! 2.  Validating that a foreign address can back a typed Arrow view.
//! 3.  Answering width questions about Arrow types without a generic parameter.

use arrow::datatypes::DataType;

use crate::error::InterchangeError;
use crate::types::ProtocolDtype;

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Returns the length of a buffer of `bufsize` bytes in elements of `dtype`.
///
/// # Errors
/// Returns `InterchangeError::InvalidBuffer` if the dtype's bit width is not a
/// whole number of bytes.
pub fn buffer_size_in_elements(
    bufsize: usize,
    dtype: &ProtocolDtype,
) -> Result<usize, InterchangeError> {
    Ok(bufsize / dtype.bytes_per_element()?)
}

/// Returns the storage width in bits of a physical Arrow type.
///
/// Booleans are bit-packed and report a width of 1.
pub fn bit_width_of(dt: &DataType) -> Result<usize, InterchangeError> {
    match dt {
        DataType::Boolean => Ok(1),
        dt => dt.primitive_width().map(|w| w * 8).ok_or_else(|| {
            InterchangeError::UnsupportedType(format!("{} has no fixed-width storage", dt))
        }),
    }
}

/// Checks that `ptr` is suitably aligned for elements of `bit_width` bits.
pub fn check_alignment(ptr: usize, bit_width: usize) -> Result<(), InterchangeError> {
    let align = (bit_width / 8).max(1);
    if ptr % align != 0 {
        return Err(InterchangeError::InvalidBuffer(format!(
            "buffer at {:#x} is not aligned to {} bytes",
            ptr, align
        )));
    }
    Ok(())
}
