// In: src/native/dataframe.rs

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;

use crate::error::InterchangeError;
use crate::frame::DataFrame;
use crate::native::column::ArrowColumn;
use crate::protocol::{InterchangeColumn, InterchangeDataFrame, SupportsInterchange};
use crate::types::ProtocolDtype;

/// A `DataFrame` exposed through the interchange protocol.
///
/// Importing this wrapper through `from_dataframe` unwraps it without touching
/// its buffers.
#[derive(Debug, Clone)]
pub struct DataFrameInterchange {
    frame: DataFrame,
    dtypes: Vec<ProtocolDtype>,
    allow_copy: bool,
}

impl DataFrameInterchange {
    /// Fails with `UnsupportedType` if any column has a type the protocol cannot describe.
    pub fn try_new(frame: DataFrame, allow_copy: bool) -> Result<Self, InterchangeError> {
        let dtypes = frame
            .schema()
            .fields()
            .iter()
            .map(|f| {
                ProtocolDtype::from_arrow_type(f.data_type()).map_err(|e| e.in_column(f.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            frame,
            dtypes,
            allow_copy,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_inner(self) -> DataFrame {
        self.frame
    }

    pub fn allow_copy(&self) -> bool {
        self.allow_copy
    }

    fn column_at(&self, index: usize, data_type: &DataType) -> ArrowColumn {
        let chunks: Vec<ArrayRef> = self
            .frame
            .chunks()
            .iter()
            .map(|batch| batch.column(index).clone())
            .collect();
        ArrowColumn::from_parts(
            chunks,
            data_type.clone(),
            self.dtypes[index].clone(),
            self.allow_copy,
        )
    }
}

impl InterchangeDataFrame for DataFrameInterchange {
    fn num_columns(&self) -> usize {
        self.frame.num_columns()
    }

    fn num_rows(&self) -> Option<usize> {
        Some(self.frame.num_rows())
    }

    fn num_chunks(&self) -> usize {
        self.frame.n_chunks()
    }

    fn column_names(&self) -> Vec<String> {
        self.frame.column_names()
    }

    fn get_columns(&self) -> Vec<Box<dyn InterchangeColumn + '_>> {
        let schema = self.frame.schema();
        schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| {
                Box::new(self.column_at(i, field.data_type())) as Box<dyn InterchangeColumn + '_>
            })
            .collect()
    }

    fn get_chunks(&self) -> Vec<Box<dyn InterchangeDataFrame + '_>> {
        self.frame
            .chunks()
            .iter()
            .map(|batch| {
                let chunk = Self {
                    frame: DataFrame::from_batch(batch.clone()),
                    dtypes: self.dtypes.clone(),
                    allow_copy: self.allow_copy,
                };
                Box::new(chunk) as Box<dyn InterchangeDataFrame + '_>
            })
            .collect()
    }
}

impl DataFrame {
    /// Exposes this frame through the interchange protocol.
    pub fn to_interchange(&self, allow_copy: bool) -> Result<DataFrameInterchange, InterchangeError> {
        DataFrameInterchange::try_new(self.clone(), allow_copy)
    }
}

impl SupportsInterchange for DataFrame {
    fn interchange(
        &self,
        allow_copy: bool,
    ) -> Result<Box<dyn InterchangeDataFrame + '_>, InterchangeError> {
        Ok(Box::new(self.to_interchange(allow_copy)?))
    }
}

impl SupportsInterchange for DataFrameInterchange {
    fn interchange(
        &self,
        allow_copy: bool,
    ) -> Result<Box<dyn InterchangeDataFrame + '_>, InterchangeError> {
        Ok(Box::new(Self {
            allow_copy,
            ..self.clone()
        }))
    }
}
