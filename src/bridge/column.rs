// In: src/bridge/column.rs

//! Column assembly: one interchange column in, one Arrow array out.
//!
//! The steps run in a fixed order: resolve the logical type, pin and reconstruct
//! the data and offsets buffers, build a provisional array without validity,
//! synthesize the validity from it, then attach the validity to produce the
//! final array. Any failure aborts the column.

use std::sync::Arc;

use arrow::array::{
    make_array, Array, ArrayRef, DictionaryArray, Int64Array, LargeStringArray, UInt32Array,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::compute::cast;
use arrow::datatypes::{DataType, UInt32Type};

use crate::bridge::buffers::{
    reconstruct_data_buffer, reconstruct_offsets_buffer, PinnedBuffer, PinnedBuffers,
};
use crate::error::InterchangeError;
use crate::null_handling::synthesize_validity;
use crate::protocol::InterchangeColumn;
use crate::types::NullEncoding;

/// Converts one interchange column into an Arrow array.
///
/// Zero-copy buffers in the result co-own the column's foreign buffers, so the
/// array stays valid after `column` and its dataframe are dropped.
pub fn assemble_column(
    column: &dyn InterchangeColumn,
    allow_copy: bool,
) -> Result<ArrayRef, InterchangeError> {
    let logical = column.dtype().to_arrow_type()?;
    let size = column.size();
    let offset = column.offset();
    let null_count = column.null_count();
    // A column without nulls needs no mask, whatever encoding it reports.
    let encoding = match null_count {
        Some(0) => NullEncoding::NonNullable,
        _ => NullEncoding::try_from(&column.describe_null())?,
    };

    log::debug!(
        "assembling column: type={}, size={}, offset={}, nulls={:?}",
        logical,
        size,
        offset,
        encoding
    );

    let buffers = PinnedBuffers::pin(column.get_buffers()?)?;
    let offsets = reconstruct_offsets_buffer(buffers.offsets.as_ref(), offset, allow_copy)?;

    let provisional = match (&logical, offsets) {
        (DataType::LargeUtf8, Some(offsets)) => string_array(&buffers.data, offsets, size)?,
        (DataType::LargeUtf8, None) => {
            return Err(InterchangeError::InvalidBuffer(
                "string column without an offsets buffer".to_string(),
            ))
        }
        (DataType::Dictionary(_, _), _) => {
            // The codes, in whatever integer width the producer stores them.
            let (buffer, dtype) = &buffers.data;
            reconstruct_data_buffer(buffer, dtype, size, offset)?
        }
        (logical, _) => {
            let (buffer, dtype) = &buffers.data;
            let data = reconstruct_data_buffer(buffer, dtype, size, offset)?;
            coerce_physical(data, logical, allow_copy)?
        }
    };

    let validity = synthesize_validity(
        &encoding,
        null_count,
        buffers.validity.as_ref(),
        provisional.as_ref(),
        size,
        offset,
        allow_copy,
    )?;

    match logical {
        DataType::Dictionary(_, _) => categorical_array(column, provisional, validity, allow_copy),
        _ => with_validity(provisional, validity),
    }
}

/// Builds a string array over the whole data buffer; the element offset has
/// already been applied to `offsets`.
fn string_array(
    data: &PinnedBuffer,
    offsets: Int64Array,
    size: usize,
) -> Result<ArrayRef, InterchangeError> {
    let (buffer, dtype) = data;
    if dtype.bytes_per_element()? != 1 {
        return Err(InterchangeError::InvalidBuffer(format!(
            "string data buffer must hold bytes, got {}",
            dtype
        )));
    }
    let bytes = reconstruct_data_buffer(buffer, dtype, buffer.len(), 0)?;
    let bytes = bytes.to_data();
    let values = bytes.buffers()[0].slice_with_length(bytes.offset(), bytes.len());

    let offsets = if size == 0 && offsets.is_empty() {
        OffsetBuffer::new_empty()
    } else {
        if offsets.len() < size + 1 {
            return Err(InterchangeError::InvalidBuffer(format!(
                "offsets buffer holds {} entries for {} strings",
                offsets.len(),
                size
            )));
        }
        let offsets = offsets.values().slice(0, size + 1);
        let monotonic = offsets[0] >= 0 && offsets.windows(2).all(|w| w[0] <= w[1]);
        if !monotonic {
            return Err(InterchangeError::InvalidBuffer(
                "string offsets must be non-negative and non-decreasing".to_string(),
            ));
        }
        OffsetBuffer::new(offsets)
    };

    Ok(Arc::new(LargeStringArray::try_new(offsets, values, None)?))
}

/// Turns the physical data array into the column's logical type.
///
/// Temporal columns stored as plain integers of the same width are
/// reinterpreted in place; anything else needs a cast.
fn coerce_physical(
    data: ArrayRef,
    logical: &DataType,
    allow_copy: bool,
) -> Result<ArrayRef, InterchangeError> {
    let physical = data.data_type();
    if physical == logical {
        return Ok(data);
    }

    let same_width = physical.primitive_width() == logical.primitive_width();
    if logical.is_temporal() && physical.is_integer() && same_width {
        let reinterpreted = data
            .to_data()
            .into_builder()
            .data_type(logical.clone())
            .build()?;
        return Ok(make_array(reinterpreted));
    }

    if !allow_copy {
        return Err(InterchangeError::copy_not_allowed(format!(
            "data buffer must be cast from {} to {}",
            physical, logical
        )));
    }
    log::debug!("casting data buffer from {} to {}", physical, logical);
    Ok(cast(&data, logical)?)
}

/// Attaches a validity bitmap to an array that has none.
fn with_validity(
    array: ArrayRef,
    validity: Option<NullBuffer>,
) -> Result<ArrayRef, InterchangeError> {
    if validity.is_none() {
        return Ok(array);
    }
    let data = array.to_data().into_builder().nulls(validity).build()?;
    Ok(make_array(data))
}

/// Builds a `Dictionary(UInt32, LargeUtf8)` array from the codes and the
/// column's category values.
fn categorical_array(
    column: &dyn InterchangeColumn,
    codes: ArrayRef,
    validity: Option<NullBuffer>,
    allow_copy: bool,
) -> Result<ArrayRef, InterchangeError> {
    let description = column.describe_categorical()?;
    let categories = description.categories.ok_or_else(|| {
        InterchangeError::UnsupportedType(
            "categorical column without a dictionary of categories".to_string(),
        )
    })?;
    let values = assemble_column(categories.as_ref(), allow_copy)
        .map_err(|e| e.in_column("<categories>"))?;
    if values.data_type() != &DataType::LargeUtf8 {
        return Err(InterchangeError::UnsupportedType(format!(
            "categories of type {} are not supported",
            values.data_type()
        )));
    }

    let keys = if codes.data_type() == &DataType::UInt32 {
        codes
    } else {
        if !allow_copy {
            return Err(InterchangeError::copy_not_allowed(format!(
                "categorical codes must be cast from {} to UInt32",
                codes.data_type()
            )));
        }
        // Null slots usually hold a negative sentinel; mask them before casting.
        let masked = with_validity(codes, validity.clone())?;
        cast(&masked, &DataType::UInt32)?
    };

    let nulls = NullBuffer::union(validity.as_ref(), keys.nulls());
    let keys = UInt32Array::from(keys.to_data().into_builder().nulls(nulls).build()?);
    Ok(Arc::new(DictionaryArray::<UInt32Type>::try_new(keys, values)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fixtures::MockColumn;
    use crate::types::{NullDescription, ProtocolDtype, Sentinel};
    use arrow::array::{AsArray, Int32Array, TimestampMicrosecondArray};
    use arrow::buffer::Buffer;
    use arrow::datatypes::TimeUnit;

    #[test]
    fn test_primitive_column_is_zero_copy() {
        let data = Buffer::from_slice_ref([1i64, 2, 3]);
        let column = MockColumn::primitive(&DataType::Int64, data.clone(), 3);

        let array = assemble_column(&column, false).unwrap();
        assert_eq!(array.as_primitive::<arrow::datatypes::Int64Type>().values().as_ref(), &[1, 2, 3]);
        assert_eq!(array.to_data().buffers()[0].as_ptr(), data.as_ptr());
    }

    #[test]
    fn test_offset_into_shared_buffer() {
        let data = Buffer::from_slice_ref([100i32, 200, 1, 2, 3, 300]);
        let column = MockColumn::primitive(&DataType::Int32, data, 3).with_offset(2);

        let array = assemble_column(&column, false).unwrap();
        let expected = Int32Array::from(vec![1, 2, 3]);
        assert_eq!(array.as_primitive::<arrow::datatypes::Int32Type>(), &expected);
    }

    #[test]
    fn test_datetime_stored_as_int64_is_reinterpreted() {
        let data = Buffer::from_slice_ref([1_000_000i64, 2_000_000]);
        let logical = DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()));
        let column = MockColumn::primitive(&logical, data.clone(), 2)
            .with_data_dtype(ProtocolDtype::from_arrow_type(&DataType::Int64).unwrap());

        let array = assemble_column(&column, false).unwrap();
        assert_eq!(array.data_type(), &logical);
        let expected = TimestampMicrosecondArray::from(vec![1_000_000, 2_000_000]).with_timezone("UTC");
        assert_eq!(array.as_any().downcast_ref::<TimestampMicrosecondArray>().unwrap(), &expected);
        assert_eq!(array.to_data().buffers()[0].as_ptr(), data.as_ptr());
    }

    #[test]
    fn test_width_mismatch_needs_a_cast() {
        let data = Buffer::from_slice_ref([7i16, 8]);
        let column = MockColumn::primitive(&DataType::Int32, data, 2)
            .with_data_dtype(ProtocolDtype::from_arrow_type(&DataType::Int16).unwrap());

        let err = assemble_column(&column, false).unwrap_err();
        assert!(matches!(
            err,
            InterchangeError::CopyNotAllowed(ref m) if m == "data buffer must be cast from Int16 to Int32"
        ));

        let array = assemble_column(&column, true).unwrap();
        assert_eq!(array.as_primitive::<arrow::datatypes::Int32Type>(), &Int32Array::from(vec![7, 8]));
    }

    #[test]
    fn test_string_column_with_offset() {
        // Column elements 1..3 of ["xx", "foo", "bar", "yy"].
        let values = Buffer::from(b"xxfoobaryy".as_slice());
        let offsets = Buffer::from_slice_ref([0i64, 2, 5, 8, 10]);
        let column = MockColumn::string(values, offsets, 2).with_offset(1);

        let array = assemble_column(&column, false).unwrap();
        let expected = LargeStringArray::from(vec!["foo", "bar"]);
        assert_eq!(array.as_string::<i64>(), &expected);
    }

    #[test]
    fn test_string_column_rejects_decreasing_offsets() {
        let values = Buffer::from(b"abc".as_slice());
        let offsets = Buffer::from_slice_ref([0i64, 2, 1]);
        let column = MockColumn::string(values, offsets, 2);

        let result = assemble_column(&column, true);
        assert!(matches!(result, Err(InterchangeError::InvalidBuffer(_))));
    }

    #[test]
    fn test_string_column_without_offsets_is_invalid() {
        let values = Buffer::from(b"abc".as_slice());
        let offsets = Buffer::from_slice_ref([0i64, 3]);
        let mut column = MockColumn::string(values, offsets, 1);
        column.offsets = None;

        let result = assemble_column(&column, true);
        assert!(matches!(result, Err(InterchangeError::InvalidBuffer(_))));
    }

    #[test]
    fn test_sentinel_column_keeps_values_and_masks_nulls() {
        let data = Buffer::from_slice_ref([1i64, -99, 3]);
        let column = MockColumn::primitive(&DataType::Int64, data, 3).with_nulls(
            NullDescription::new(NullDescription::USE_SENTINEL, Some(Sentinel::Int(-99))),
            Some(1),
            None,
        );

        let array = assemble_column(&column, true).unwrap();
        assert_eq!(array.null_count(), 1);
        assert!(array.is_null(1));
        assert!(array.is_valid(2));
    }

    #[test]
    fn test_unknown_null_encoding_aborts_column() {
        let data = Buffer::from_slice_ref([1i64]);
        let column = MockColumn::primitive(&DataType::Int64, data, 1).with_nulls(
            NullDescription::new(42, None),
            Some(1),
            None,
        );

        let result = assemble_column(&column, true);
        assert!(matches!(result, Err(InterchangeError::UnsupportedNullEncoding(_))));
    }

    #[test]
    fn test_categorical_without_categories_is_unsupported() {
        let codes = Buffer::from_slice_ref([0u32, 1]);
        let mut column = MockColumn::primitive(&crate::types::categorical_type(), codes, 2)
            .with_data_dtype(ProtocolDtype::from_arrow_type(&DataType::UInt32).unwrap());
        column.categories = None;

        let result = assemble_column(&column, true);
        assert!(matches!(result, Err(InterchangeError::UnsupportedType(_))));
    }
}
