// In: src/protocol/mod.rs

//! The inbound contract: the dataframe interchange protocol as a set of traits.
//!
//! These traits are consumed, not implemented, by the import path. A foreign
//! dataframe library implements them over its own memory; the crate's own
//! implementation over Arrow lives in `crate::native`.

use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::Arc;

use crate::error::InterchangeError;
use crate::types::{NullDescription, ProtocolDtype};

/// Device a buffer lives on, following the DLPack device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(i32),
    Other { device_type: i32, device_id: i32 },
}

/// A contiguous block of foreign memory.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - `ptr()..ptr() + bufsize()` is readable memory for as long as the
///   implementor is alive.
/// - The memory is not mutated while the implementor is alive.
/// - When `bufsize()` is non-zero, `ptr()` is not null.
pub unsafe trait InterchangeBuffer: fmt::Debug + Send + Sync + RefUnwindSafe {
    /// Buffer size in bytes.
    fn bufsize(&self) -> usize;

    /// Address of the first byte.
    fn ptr(&self) -> usize;

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// A buffer handle together with the dtype of its contents.
pub type BufferInfo = (Arc<dyn InterchangeBuffer>, ProtocolDtype);

/// The buffers backing a single column, as returned by `get_buffers`.
#[derive(Debug, Clone)]
pub struct ColumnBuffers {
    pub data: BufferInfo,
    /// Present for variable-length types only.
    pub offsets: Option<BufferInfo>,
    /// Present for bitmask and bytemask null encodings.
    pub validity: Option<BufferInfo>,
}

/// Dictionary information of a categorical column.
pub struct CategoricalDescription<'a> {
    pub is_ordered: bool,
    pub is_dictionary: bool,
    /// The category values, indexed by the column's codes.
    pub categories: Option<Box<dyn InterchangeColumn + 'a>>,
}

/// A single column of an interchange dataframe chunk.
pub trait InterchangeColumn {
    /// Logical dtype of the column.
    fn dtype(&self) -> ProtocolDtype;

    /// Number of elements.
    fn size(&self) -> usize;

    /// Element offset into the column's buffers.
    fn offset(&self) -> usize;

    /// Number of nulls, or `None` when the producer does not know it cheaply.
    fn null_count(&self) -> Option<usize>;

    fn describe_null(&self) -> NullDescription;

    fn describe_categorical(&self) -> Result<CategoricalDescription<'_>, InterchangeError> {
        Err(InterchangeError::Protocol(
            "describe_categorical called on a non-categorical column".to_string(),
        ))
    }

    fn get_buffers(&self) -> Result<ColumnBuffers, InterchangeError>;
}

/// An interchange dataframe, or one chunk of it.
pub trait InterchangeDataFrame {
    fn num_columns(&self) -> usize;

    fn num_rows(&self) -> Option<usize>;

    fn num_chunks(&self) -> usize;

    /// Column names, in the same order as `get_columns`.
    fn column_names(&self) -> Vec<String>;

    fn get_columns(&self) -> Vec<Box<dyn InterchangeColumn + '_>>;

    fn get_chunks(&self) -> Vec<Box<dyn InterchangeDataFrame + '_>>;
}

/// An object that can hand out an interchange dataframe of itself.
pub trait SupportsInterchange {
    fn interchange(
        &self,
        allow_copy: bool,
    ) -> Result<Box<dyn InterchangeDataFrame + '_>, InterchangeError>;
}
