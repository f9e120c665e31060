// In: src/bridge/api.rs

use arrow::record_batch::RecordBatch;

use crate::bridge::table::assemble_table;
use crate::config::InterchangeConfig;
use crate::error::InterchangeError;
use crate::frame::DataFrame;
use crate::native::DataFrameInterchange;
use crate::protocol::SupportsInterchange;

/// Anything `from_dataframe` can be asked to convert.
pub enum DataFrameSource<'a> {
    /// Already a native frame; returned as is.
    Native(DataFrame),
    /// The crate's own interchange wrapper; unwrapped without conversion.
    NativeInterchange(DataFrameInterchange),
    /// A foreign object implementing the protocol.
    Protocol(&'a dyn SupportsInterchange),
    /// A value that does not support the protocol at all.
    Unsupported { type_name: &'static str },
}

impl<'a> DataFrameSource<'a> {
    /// Marks `value` as an input that cannot be converted, recording its type name.
    pub fn unsupported<T: ?Sized>(_value: &T) -> Self {
        DataFrameSource::Unsupported {
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl From<DataFrame> for DataFrameSource<'_> {
    fn from(frame: DataFrame) -> Self {
        DataFrameSource::Native(frame)
    }
}

impl From<RecordBatch> for DataFrameSource<'_> {
    fn from(batch: RecordBatch) -> Self {
        DataFrameSource::Native(DataFrame::from_batch(batch))
    }
}

impl From<DataFrameInterchange> for DataFrameSource<'_> {
    fn from(dfi: DataFrameInterchange) -> Self {
        DataFrameSource::NativeInterchange(dfi)
    }
}

impl<'a, T: SupportsInterchange> From<&'a T> for DataFrameSource<'a> {
    fn from(value: &'a T) -> Self {
        DataFrameSource::Protocol(value)
    }
}

/// Builds a `DataFrame` from any supported source.
///
/// With `allow_copy = false` every conversion step must be zero-copy; the
/// first step that needs a copy fails with `CopyNotAllowed`.
pub fn from_dataframe<'a>(
    source: impl Into<DataFrameSource<'a>>,
    allow_copy: bool,
) -> Result<DataFrame, InterchangeError> {
    from_dataframe_with_config(source, &InterchangeConfig::with_allow_copy(allow_copy))
}

/// Like `from_dataframe`, with full control over the conversion settings.
pub fn from_dataframe_with_config<'a>(
    source: impl Into<DataFrameSource<'a>>,
    config: &InterchangeConfig,
) -> Result<DataFrame, InterchangeError> {
    match source.into() {
        DataFrameSource::Native(frame) => {
            log::debug!("input is already a native frame");
            Ok(frame)
        }
        DataFrameSource::NativeInterchange(dfi) => {
            log::debug!("unwrapping native interchange object");
            Ok(dfi.into_inner())
        }
        DataFrameSource::Protocol(value) => {
            let dfi = value.interchange(config.allow_copy)?;
            assemble_table(dfi.as_ref(), config)
        }
        DataFrameSource::Unsupported { type_name } => Err(InterchangeError::UnsupportedInput {
            type_name: type_name.to_string(),
        }),
    }
}
