// In: src/bridge/buffers.rs

//! Buffer reconstruction: typed Arrow views over foreign memory.
//!
//! Foreign buffers are imported once per column into zero-copy Arrow `Buffer`s
//! whose owner is an `Arc<ColumnBuffers>`. That `Arc` is the keep-alive token:
//! every array derived from the column holds it, so the foreign memory stays
//! valid for as long as any view points into it.

use std::ptr::NonNull;
use std::sync::Arc;

use arrow::array::{make_array, Array, ArrayData, ArrayRef, AsArray, Int64Array};
use arrow::buffer::{Buffer, MutableBuffer};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use arrow_buffer::alloc::Allocation;

use crate::error::InterchangeError;
use crate::protocol::{BufferInfo, ColumnBuffers, Device, InterchangeBuffer};
use crate::types::ProtocolDtype;
use crate::utils;

/// An imported Arrow buffer and the dtype the producer declared for it.
pub type PinnedBuffer = (Buffer, ProtocolDtype);

/// The buffers of one column, imported as Arrow buffers that keep the
/// foreign `ColumnBuffers` alive.
#[derive(Debug)]
pub(crate) struct PinnedBuffers {
    pub data: PinnedBuffer,
    pub offsets: Option<PinnedBuffer>,
    pub validity: Option<PinnedBuffer>,
}

impl PinnedBuffers {
    /// Takes shared ownership of `buffers` and imports each of them.
    pub fn pin(buffers: ColumnBuffers) -> Result<Self, InterchangeError> {
        let keep_alive = Arc::new(buffers);
        let import = |info: &BufferInfo| -> Result<PinnedBuffer, InterchangeError> {
            Ok((import_buffer(info.0.as_ref(), &keep_alive)?, info.1.clone()))
        };

        Ok(Self {
            data: import(&keep_alive.data)?,
            offsets: keep_alive.offsets.as_ref().map(import).transpose()?,
            validity: keep_alive.validity.as_ref().map(import).transpose()?,
        })
    }
}

/// Wraps foreign memory in an Arrow `Buffer` without copying.
///
/// `handle` must be owned by `keep_alive`; the returned buffer holds a clone
/// of `keep_alive` and releases it when the last view is dropped.
fn import_buffer(
    handle: &dyn InterchangeBuffer,
    keep_alive: &Arc<ColumnBuffers>,
) -> Result<Buffer, InterchangeError> {
    if handle.device() != Device::Cpu {
        return Err(InterchangeError::InvalidBuffer(format!(
            "buffer resides on {:?}; only CPU memory can be imported",
            handle.device()
        )));
    }

    let len = handle.bufsize();
    if len == 0 {
        return Ok(MutableBuffer::new(0).into());
    }

    let ptr = NonNull::new(handle.ptr() as *mut u8).ok_or_else(|| {
        InterchangeError::InvalidBuffer(format!("null pointer for a buffer of {} bytes", len))
    })?;
    let owner: Arc<dyn Allocation> = keep_alive.clone();

    log::trace!("importing {} bytes at {:#x}", len, handle.ptr());

    // SAFETY: `InterchangeBuffer` guarantees that `ptr..ptr + len` stays readable
    // and unmodified while the handle is alive. The handle is owned by
    // `keep_alive`, which the returned buffer co-owns.
    Ok(unsafe { Buffer::from_custom_allocation(ptr, len, owner) })
}

/// Builds a typed view of `length` elements starting `offset` elements into
/// `buffer`, using the physical storage type of `dtype`.
///
/// This never copies: the result shares `buffer`'s memory.
pub fn reconstruct_data_buffer(
    buffer: &Buffer,
    dtype: &ProtocolDtype,
    length: usize,
    offset: usize,
) -> Result<ArrayRef, InterchangeError> {
    let physical = dtype.physical_arrow_type()?;
    let bit_width = utils::bit_width_of(&physical)?;

    let required_bits = offset
        .checked_add(length)
        .and_then(|n| n.checked_mul(bit_width))
        .ok_or_else(|| InterchangeError::InvalidBuffer("buffer extent overflows".to_string()))?;
    if required_bits > buffer.len() * 8 {
        return Err(InterchangeError::InvalidBuffer(format!(
            "buffer of {} bytes cannot hold {} elements of {} at offset {}",
            buffer.len(),
            length,
            physical,
            offset
        )));
    }
    utils::check_alignment(buffer.as_ptr() as usize, bit_width)?;

    let data = ArrayData::try_new(physical, length, None, offset, vec![buffer.clone()], vec![])?;
    Ok(make_array(data))
}

/// Reconstructs the offsets buffer of a variable-length column as 64-bit offsets.
///
/// The view starts at element `offset` and runs to the end of the buffer.
/// Offsets narrower than 64 bits are widened, which copies and therefore
/// requires `allow_copy`.
pub fn reconstruct_offsets_buffer(
    offsets: Option<&PinnedBuffer>,
    offset: usize,
    allow_copy: bool,
) -> Result<Option<Int64Array>, InterchangeError> {
    let Some((buffer, dtype)) = offsets else {
        return Ok(None);
    };

    let total = utils::buffer_size_in_elements(buffer.len(), dtype)?;
    let length = total.checked_sub(offset).ok_or_else(|| {
        InterchangeError::InvalidBuffer(format!(
            "offset {} is past the end of an offsets buffer of {} elements",
            offset, total
        ))
    })?;
    let array = reconstruct_data_buffer(buffer, dtype, length, offset)?;

    if array.data_type() != &DataType::Int64 {
        if !allow_copy {
            return Err(InterchangeError::copy_not_allowed(format!(
                "offset buffer must be cast from {} to Int64",
                array.data_type()
            )));
        }
        log::debug!("widening {} offsets to Int64", array.data_type());
        let widened = cast(&array, &DataType::Int64)?;
        return Ok(Some(widened.as_primitive::<Int64Type>().clone()));
    }

    Ok(Some(array.as_primitive::<Int64Type>().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::ArrowBuffer;
    use crate::types::DtypeKind;
    use arrow::array::{BooleanArray, Int32Array, UInt8Array};

    fn pin_data(buffer: Buffer, dtype: ProtocolDtype) -> PinnedBuffers {
        PinnedBuffers::pin(ColumnBuffers {
            data: (Arc::new(ArrowBuffer::new(buffer)), dtype),
            offsets: None,
            validity: None,
        })
        .unwrap()
    }

    #[test]
    fn test_pinned_buffer_shares_foreign_memory() {
        let source = Buffer::from_slice_ref([1i32, 2, 3]);
        let pinned = pin_data(source.clone(), ProtocolDtype::new(DtypeKind::Int, 32, "i"));
        assert_eq!(pinned.data.0.as_ptr(), source.as_ptr());
        assert_eq!(pinned.data.0.len(), 12);
    }

    #[test]
    fn test_reconstruct_data_buffer_respects_offset() {
        let buffer = Buffer::from_slice_ref([10i32, 20, 30, 40, 50]);
        let dtype = ProtocolDtype::new(DtypeKind::Int, 32, "i");

        let array = reconstruct_data_buffer(&buffer, &dtype, 2, 3).unwrap();
        let expected = Int32Array::from(vec![40, 50]);
        assert_eq!(array.as_primitive::<arrow::datatypes::Int32Type>(), &expected);
    }

    #[test]
    fn test_reconstruct_data_buffer_bit_offset_for_booleans() {
        // 0b0010_1101 -> [1, 0, 1, 1, 0, 1, 0, 0]
        let buffer = Buffer::from_slice_ref([0b0010_1101u8]);
        let array = reconstruct_data_buffer(&buffer, &ProtocolDtype::bitmask(), 4, 2).unwrap();
        let expected = BooleanArray::from(vec![true, true, false, true]);
        assert_eq!(array.as_boolean(), &expected);
    }

    #[test]
    fn test_reconstruct_data_buffer_too_small() {
        let buffer = Buffer::from_slice_ref([1i64, 2]);
        let dtype = ProtocolDtype::new(DtypeKind::Int, 64, "l");
        let result = reconstruct_data_buffer(&buffer, &dtype, 2, 1);
        assert!(matches!(result, Err(InterchangeError::InvalidBuffer(_))));
    }

    #[test]
    fn test_reconstruct_data_buffer_misaligned() {
        let buffer = Buffer::from_slice_ref([0i64; 3]).slice(4);
        let dtype = ProtocolDtype::new(DtypeKind::Int, 64, "l");
        let result = reconstruct_data_buffer(&buffer, &dtype, 1, 0);
        assert!(matches!(result, Err(InterchangeError::InvalidBuffer(_))));
    }

    #[test]
    fn test_string_data_buffer_is_bytes() {
        let buffer = Buffer::from(b"foobar".as_slice());
        let dtype = ProtocolDtype::new(DtypeKind::String, 8, "U");
        let array = reconstruct_data_buffer(&buffer, &dtype, 6, 0).unwrap();
        assert_eq!(array.as_any().downcast_ref::<UInt8Array>().unwrap().value(3), b'b');
    }

    #[test]
    fn test_offsets_absent_for_fixed_width() {
        assert!(reconstruct_offsets_buffer(None, 0, false).unwrap().is_none());
    }

    #[test]
    fn test_offsets_int64_zero_copy() {
        let buffer = Buffer::from_slice_ref([0i64, 3, 6, 9]);
        let pinned = (buffer.clone(), ProtocolDtype::new(DtypeKind::Int, 64, "l"));
        let offsets = reconstruct_offsets_buffer(Some(&pinned), 1, false)
            .unwrap()
            .unwrap();
        assert_eq!(offsets.values().as_ref(), &[3, 6, 9]);
        assert_eq!(offsets.values().inner().as_ptr(), buffer.slice(8).as_ptr());
    }

    #[test]
    fn test_offsets_int32_requires_copy() {
        let pinned = (
            Buffer::from_slice_ref([0i32, 3, 6]),
            ProtocolDtype::new(DtypeKind::Int, 32, "i"),
        );

        let err = reconstruct_offsets_buffer(Some(&pinned), 0, false).unwrap_err();
        assert!(matches!(
            err,
            InterchangeError::CopyNotAllowed(ref msg) if msg == "offset buffer must be cast from Int32 to Int64"
        ));

        let widened = reconstruct_offsets_buffer(Some(&pinned), 0, true)
            .unwrap()
            .unwrap();
        assert_eq!(widened.values().as_ref(), &[0i64, 3, 6]);
    }

    #[test]
    fn test_offsets_with_sub_byte_width_are_invalid() {
        let pinned = (Buffer::from_slice_ref([0u8]), ProtocolDtype::bitmask());
        let result = reconstruct_offsets_buffer(Some(&pinned), 0, true);
        assert!(matches!(result, Err(InterchangeError::InvalidBuffer(_))));
    }
}
