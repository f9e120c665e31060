// In: src/bridge/fixtures.rs

//! Hand-built interchange objects for tests, standing in for a foreign
//! dataframe library.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arrow::buffer::Buffer;
use arrow::datatypes::DataType;

use crate::error::InterchangeError;
use crate::native::ArrowBuffer;
use crate::protocol::{
    BufferInfo, CategoricalDescription, ColumnBuffers, Device, InterchangeBuffer,
    InterchangeColumn, InterchangeDataFrame, SupportsInterchange,
};
use crate::types::{NullDescription, ProtocolDtype};

pub fn arrow_info(buffer: Buffer, dtype: ProtocolDtype) -> BufferInfo {
    (Arc::new(ArrowBuffer::new(buffer)), dtype)
}

/// Foreign memory that records when its owner releases it.
#[derive(Debug)]
pub struct TrackedBuffer {
    words: Vec<u64>,
    len: usize,
    released: Arc<AtomicBool>,
}

impl TrackedBuffer {
    pub fn from_i64(values: &[i64], released: Arc<AtomicBool>) -> Self {
        Self {
            words: values.iter().map(|v| *v as u64).collect(),
            len: values.len() * 8,
            released,
        }
    }
}

unsafe impl InterchangeBuffer for TrackedBuffer {
    fn bufsize(&self) -> usize {
        self.len
    }

    fn ptr(&self) -> usize {
        self.words.as_ptr() as usize
    }
}

impl Drop for TrackedBuffer {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// A buffer that claims to live on a GPU.
#[derive(Debug)]
pub struct DeviceBuffer(pub Buffer);

unsafe impl InterchangeBuffer for DeviceBuffer {
    fn bufsize(&self) -> usize {
        self.0.len()
    }

    fn ptr(&self) -> usize {
        self.0.as_ptr() as usize
    }

    fn device(&self) -> Device {
        Device::Cuda(0)
    }
}

#[derive(Debug, Clone)]
pub struct MockColumn {
    pub dtype: ProtocolDtype,
    pub size: usize,
    pub offset: usize,
    pub null_count: Option<usize>,
    pub nulls: NullDescription,
    pub data: BufferInfo,
    pub offsets: Option<BufferInfo>,
    pub validity: Option<BufferInfo>,
    pub categories: Option<Box<MockColumn>>,
}

impl MockColumn {
    /// A non-nullable fixed-width column whose data buffer has the column's own dtype.
    pub fn primitive(data_type: &DataType, data: Buffer, size: usize) -> Self {
        let dtype = ProtocolDtype::from_arrow_type(data_type).unwrap();
        Self::from_info(dtype.clone(), arrow_info(data, dtype), size)
    }

    pub fn from_info(dtype: ProtocolDtype, data: BufferInfo, size: usize) -> Self {
        Self {
            dtype,
            size,
            offset: 0,
            null_count: Some(0),
            nulls: NullDescription::non_nullable(),
            data,
            offsets: None,
            validity: None,
            categories: None,
        }
    }

    /// A non-nullable string column with 64-bit offsets.
    pub fn string(values: Buffer, offsets: Buffer, size: usize) -> Self {
        let mut column = Self::primitive(&DataType::LargeUtf8, values, size);
        column.data.1 = ProtocolDtype::from_arrow_type(&DataType::UInt8).unwrap();
        column.offsets = Some(arrow_info(
            offsets,
            ProtocolDtype::from_arrow_type(&DataType::Int64).unwrap(),
        ));
        column
    }

    /// A categorical column whose codes are stored with `code_type`.
    pub fn categorical(
        codes: Buffer,
        code_type: &DataType,
        categories: MockColumn,
        size: usize,
    ) -> Self {
        let dtype = ProtocolDtype::from_arrow_type(&crate::types::categorical_type()).unwrap();
        let code_dtype = ProtocolDtype::from_arrow_type(code_type).unwrap();
        let mut column = Self::from_info(dtype, arrow_info(codes, code_dtype), size);
        column.categories = Some(Box::new(categories));
        column
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_data_dtype(mut self, dtype: ProtocolDtype) -> Self {
        self.data.1 = dtype;
        self
    }

    pub fn with_nulls(
        mut self,
        nulls: NullDescription,
        null_count: Option<usize>,
        validity: Option<(Buffer, ProtocolDtype)>,
    ) -> Self {
        self.nulls = nulls;
        self.null_count = null_count;
        self.validity = validity.map(|(buffer, dtype)| arrow_info(buffer, dtype));
        self
    }
}

impl InterchangeColumn for MockColumn {
    fn dtype(&self) -> ProtocolDtype {
        self.dtype.clone()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn null_count(&self) -> Option<usize> {
        self.null_count
    }

    fn describe_null(&self) -> NullDescription {
        self.nulls.clone()
    }

    fn describe_categorical(&self) -> Result<CategoricalDescription<'_>, InterchangeError> {
        Ok(CategoricalDescription {
            is_ordered: false,
            is_dictionary: self.categories.is_some(),
            categories: self
                .categories
                .as_ref()
                .map(|c| Box::new(c.as_ref().clone()) as Box<dyn InterchangeColumn + '_>),
        })
    }

    fn get_buffers(&self) -> Result<ColumnBuffers, InterchangeError> {
        Ok(ColumnBuffers {
            data: self.data.clone(),
            offsets: self.offsets.clone(),
            validity: self.validity.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockDataFrame {
    pub names: Vec<String>,
    pub columns: Vec<MockColumn>,
    pub chunks: Vec<MockDataFrame>,
}

impl MockDataFrame {
    pub fn new(columns: Vec<(&str, MockColumn)>) -> Self {
        let (names, columns) = columns
            .into_iter()
            .map(|(name, column)| (name.to_string(), column))
            .unzip();
        Self {
            names,
            columns,
            chunks: Vec::new(),
        }
    }

    /// A frame made of `chunks`, with the first chunk's column names.
    pub fn chunked(chunks: Vec<MockDataFrame>) -> Self {
        Self {
            names: chunks.first().map(|c| c.names.clone()).unwrap_or_default(),
            columns: Vec::new(),
            chunks,
        }
    }
}

impl InterchangeDataFrame for MockDataFrame {
    fn num_columns(&self) -> usize {
        self.names.len()
    }

    fn num_rows(&self) -> Option<usize> {
        if self.chunks.is_empty() {
            Some(self.columns.first().map_or(0, |c| c.size))
        } else {
            self.chunks.iter().map(|c| c.num_rows()).sum()
        }
    }

    fn num_chunks(&self) -> usize {
        self.chunks.len().max(1)
    }

    fn column_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn get_columns(&self) -> Vec<Box<dyn InterchangeColumn + '_>> {
        self.columns
            .iter()
            .map(|c| Box::new(c.clone()) as Box<dyn InterchangeColumn + '_>)
            .collect()
    }

    fn get_chunks(&self) -> Vec<Box<dyn InterchangeDataFrame + '_>> {
        self.chunks
            .iter()
            .map(|c| Box::new(c.clone()) as Box<dyn InterchangeDataFrame + '_>)
            .collect()
    }
}

impl SupportsInterchange for MockDataFrame {
    fn interchange(
        &self,
        _allow_copy: bool,
    ) -> Result<Box<dyn InterchangeDataFrame + '_>, InterchangeError> {
        Ok(Box::new(self.clone()))
    }
}
