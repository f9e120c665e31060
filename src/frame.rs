// In: src/frame.rs

//! The host table type: an ordered, named set of Arrow columns stored as one
//! or more `RecordBatch` chunks that share a schema.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use hashbrown::HashSet;

use crate::error::InterchangeError;

#[derive(Debug, Clone)]
pub struct DataFrame {
    schema: SchemaRef,
    chunks: Vec<RecordBatch>,
}

impl DataFrame {
    /// Creates a frame from chunks that must all carry `schema`'s fields.
    pub fn try_new(schema: SchemaRef, chunks: Vec<RecordBatch>) -> Result<Self, InterchangeError> {
        {
            let mut seen = HashSet::with_capacity(schema.fields().len());
            for field in schema.fields() {
                if !seen.insert(field.name().as_str()) {
                    return Err(InterchangeError::DuplicateColumn(field.name().clone()));
                }
            }
        }

        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.schema().fields() != schema.fields() {
                return Err(InterchangeError::Protocol(format!(
                    "chunk {} has schema {:?}, expected {:?}",
                    i,
                    chunk.schema().fields(),
                    schema.fields()
                )));
            }
        }

        Ok(Self { schema, chunks })
    }

    /// Wraps a single batch. Column names are not checked for uniqueness.
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            chunks: vec![batch],
        }
    }

    /// A frame with the given columns and no chunks.
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            chunks: Vec::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn num_rows(&self) -> usize {
        self.chunks.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[RecordBatch] {
        &self.chunks
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    /// The chunks of the named column, one array per frame chunk.
    pub fn column(&self, name: &str) -> Option<Vec<ArrayRef>> {
        let (index, _) = self.schema.column_with_name(name)?;
        Some(self.chunks.iter().map(|c| c.column(index).clone()).collect())
    }

    /// Concatenates all chunks into one batch.
    pub fn to_batch(&self) -> Result<RecordBatch, InterchangeError> {
        match self.chunks.as_slice() {
            [] => Ok(RecordBatch::new_empty(self.schema.clone())),
            [only] => Ok(only.clone()),
            chunks => Ok(concat_batches(&self.schema, chunks)?),
        }
    }

    /// Returns an equivalent frame with at most one chunk.
    pub fn rechunk(&self) -> Result<Self, InterchangeError> {
        if self.chunks.len() <= 1 {
            return Ok(self.clone());
        }
        log::debug!("rechunking {} chunks into one", self.chunks.len());
        Ok(Self {
            schema: self.schema.clone(),
            chunks: vec![self.to_batch()?],
        })
    }

    /// Compares column names, types and values, ignoring chunk boundaries and
    /// schema metadata.
    pub fn frame_equal(&self, other: &DataFrame) -> bool {
        if self.schema.fields() != other.schema.fields() {
            return false;
        }
        match (self.to_batch(), other.to_batch()) {
            (Ok(a), Ok(b)) => a.columns() == b.columns(),
            _ => false,
        }
    }
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.frame_equal(other)
    }
}

impl From<RecordBatch> for DataFrame {
    fn from(batch: RecordBatch) -> Self {
        Self::from_batch(batch)
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::empty(Arc::new(Schema::empty()))
    }
}
