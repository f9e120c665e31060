// In: src/bridge/table.rs

//! Table assembly: every column of every chunk, stitched into a `DataFrame`.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use hashbrown::HashSet;

use crate::bridge::column::assemble_column;
use crate::config::InterchangeConfig;
use crate::error::InterchangeError;
use crate::frame::DataFrame;
use crate::protocol::InterchangeDataFrame;

/// Converts an interchange dataframe into a `DataFrame`.
///
/// Each chunk becomes one `RecordBatch`. A dataframe that reports no chunks is
/// assembled from its own columns. The result is compacted into a single chunk
/// only when `config` allows both copying and rechunking.
pub fn assemble_table(
    df: &dyn InterchangeDataFrame,
    config: &InterchangeConfig,
) -> Result<DataFrame, InterchangeError> {
    let chunks = df.get_chunks();
    log::debug!(
        "assembling table: {} columns, {:?} rows, {} chunks",
        df.num_columns(),
        df.num_rows(),
        chunks.len()
    );

    let batches = if chunks.is_empty() {
        vec![assemble_chunk(df, config.allow_copy)?]
    } else {
        chunks
            .iter()
            .map(|chunk| assemble_chunk(chunk.as_ref(), config.allow_copy))
            .collect::<Result<Vec<_>, _>>()?
    };

    let schema = batches[0].schema();
    let frame = DataFrame::try_new(schema, batches)?;

    if config.should_rechunk() && frame.n_chunks() > 1 {
        return frame.rechunk();
    }
    Ok(frame)
}

/// Converts the columns of a single chunk into a `RecordBatch`.
fn assemble_chunk(
    chunk: &dyn InterchangeDataFrame,
    allow_copy: bool,
) -> Result<RecordBatch, InterchangeError> {
    let names = chunk.column_names();
    let columns = chunk.get_columns();
    if names.len() != columns.len() {
        return Err(InterchangeError::Protocol(format!(
            "{} column names for {} columns",
            names.len(),
            columns.len()
        )));
    }

    let mut seen = HashSet::with_capacity(names.len());
    let mut fields = Vec::with_capacity(names.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(names.len());

    for (name, column) in names.into_iter().zip(columns) {
        if !seen.insert(name.clone()) {
            return Err(InterchangeError::DuplicateColumn(name));
        }
        let array = assemble_column(column.as_ref(), allow_copy).map_err(|e| e.in_column(&name))?;
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    let row_count = match arrays.first() {
        Some(array) => array.len(),
        None => chunk.num_rows().unwrap_or(0),
    };
    let options = RecordBatchOptions::new().with_row_count(Some(row_count));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        arrays,
        &options,
    )?)
}
