// In: src/native/column.rs

use std::sync::Arc;

use arrow::array::{new_empty_array, Array, ArrayRef, AsArray};
use arrow::buffer::{BooleanBuffer, Buffer, NullBuffer};
use arrow::compute::concat;
use arrow::datatypes::{DataType, UInt32Type};

use crate::error::InterchangeError;
use crate::native::buffer::ArrowBuffer;
use crate::protocol::{BufferInfo, CategoricalDescription, ColumnBuffers, InterchangeColumn};
use crate::types::{NullDescription, ProtocolDtype};

/// An Arrow column, possibly split over several chunks, exposed as an
/// interchange column.
///
/// Buffers are only available for a single chunk; a multi-chunk column is
/// concatenated on `get_buffers` when copies are allowed.
#[derive(Debug, Clone)]
pub struct ArrowColumn {
    chunks: Vec<ArrayRef>,
    data_type: DataType,
    dtype: ProtocolDtype,
    allow_copy: bool,
}

impl ArrowColumn {
    /// Fails with `UnsupportedType` when the protocol cannot describe the array's type.
    pub fn try_new(array: ArrayRef, allow_copy: bool) -> Result<Self, InterchangeError> {
        let data_type = array.data_type().clone();
        Self::try_from_chunks(vec![array], data_type, allow_copy)
    }

    pub fn try_from_chunks(
        chunks: Vec<ArrayRef>,
        data_type: DataType,
        allow_copy: bool,
    ) -> Result<Self, InterchangeError> {
        let dtype = ProtocolDtype::from_arrow_type(&data_type)?;
        Ok(Self::from_parts(chunks, data_type, dtype, allow_copy))
    }

    pub(crate) fn from_parts(
        chunks: Vec<ArrayRef>,
        data_type: DataType,
        dtype: ProtocolDtype,
        allow_copy: bool,
    ) -> Self {
        Self {
            chunks,
            data_type,
            dtype,
            allow_copy,
        }
    }

    /// The column as one contiguous array.
    fn contiguous(&self) -> Result<ArrayRef, InterchangeError> {
        match self.chunks.as_slice() {
            [] => Ok(new_empty_array(&self.data_type)),
            [only] => Ok(only.clone()),
            chunks => {
                if !self.allow_copy {
                    return Err(InterchangeError::copy_not_allowed(format!(
                        "column with {} chunks must be rechunked",
                        chunks.len()
                    )));
                }
                let refs: Vec<&dyn Array> = chunks.iter().map(|c| c.as_ref()).collect();
                Ok(concat(&refs)?)
            }
        }
    }
}

fn buffer_info(buffer: Buffer, dtype: ProtocolDtype) -> BufferInfo {
    (Arc::new(ArrowBuffer::new(buffer)), dtype)
}

/// A validity bitmap whose bit 0 lines up with element 0 of the data buffer,
/// which itself starts `offset` elements in.
fn validity_bits(nulls: &NullBuffer, offset: usize) -> Buffer {
    if nulls.offset() == offset {
        nulls.buffer().clone()
    } else if offset == 0 {
        nulls.inner().sliced()
    } else {
        BooleanBuffer::collect_bool(offset + nulls.len(), |i| {
            i < offset || nulls.is_valid(i - offset)
        })
        .into_inner()
    }
}

impl InterchangeColumn for ArrowColumn {
    fn dtype(&self) -> ProtocolDtype {
        self.dtype.clone()
    }

    fn size(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }

    fn offset(&self) -> usize {
        match self.chunks.as_slice() {
            [only] => only.to_data().offset(),
            _ => 0,
        }
    }

    fn null_count(&self) -> Option<usize> {
        Some(self.chunks.iter().map(|c| c.null_count()).sum())
    }

    fn describe_null(&self) -> NullDescription {
        if self.chunks.iter().any(|c| c.nulls().is_some()) {
            NullDescription::arrow_bitmask()
        } else {
            NullDescription::non_nullable()
        }
    }

    fn describe_categorical(&self) -> Result<CategoricalDescription<'_>, InterchangeError> {
        if !matches!(self.data_type, DataType::Dictionary(_, _)) {
            return Err(InterchangeError::Protocol(format!(
                "describe_categorical called on a column of type {}",
                self.data_type
            )));
        }
        let array = self.contiguous()?;
        let values = array.as_dictionary::<UInt32Type>().values().clone();
        Ok(CategoricalDescription {
            is_ordered: false,
            is_dictionary: true,
            categories: Some(Box::new(ArrowColumn::try_new(values, self.allow_copy)?)),
        })
    }

    fn get_buffers(&self) -> Result<ColumnBuffers, InterchangeError> {
        let array = self.contiguous()?;
        let data = array.to_data();
        let offset = data.offset();

        let (values, offsets) = match array.data_type() {
            DataType::LargeUtf8 => (
                buffer_info(
                    data.buffers()[1].clone(),
                    ProtocolDtype::from_arrow_type(&DataType::UInt8)?,
                ),
                Some(buffer_info(
                    data.buffers()[0].clone(),
                    ProtocolDtype::from_arrow_type(&DataType::Int64)?,
                )),
            ),
            DataType::Dictionary(key, _) => (
                buffer_info(data.buffers()[0].clone(), ProtocolDtype::from_arrow_type(key)?),
                None,
            ),
            dt => (
                buffer_info(data.buffers()[0].clone(), ProtocolDtype::from_arrow_type(dt)?),
                None,
            ),
        };

        let validity = data
            .nulls()
            .map(|nulls| buffer_info(validity_bits(nulls, offset), ProtocolDtype::bitmask()));

        Ok(ColumnBuffers {
            data: values,
            offsets,
            validity,
        })
    }
}
