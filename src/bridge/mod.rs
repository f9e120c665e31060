// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the import path of the library. It takes any object that speaks
// the dataframe interchange protocol and produces a native `DataFrame`, sharing the
// foreign memory wherever the layouts agree.
//
// Data Flow (Import):
//
//   1. [Entry Point (from_dataframe)]       -> Receives a `DataFrameSource`
//         |
//         `-> native frames and native interchange wrappers return immediately
//         |
//         `-> otherwise asks the object for its interchange dataframe ->
//
//   2. [Table Assembler (assemble_table)]   -> One `RecordBatch` per chunk
//         |
//         `-> calls for each column ->
//
//   3. [Column Assembler (assemble_column)] -> Receives `&dyn InterchangeColumn`
//         |
//         `-> a. `buffers` pins the foreign buffers and builds typed views
//         |
//         `-> b. `null_handling` synthesizes the validity bitmap
//         |
//         `-> c. Returns an `ArrayRef` that co-owns the foreign buffers
//
//   4. [Table Assembler]                    -> Checks chunk schemas, optionally rechunks
//
// ====================================================================================
pub mod api;
pub mod buffers;
pub mod column;
pub mod table;

// --- High-Level API ---
pub use api::{from_dataframe, from_dataframe_with_config, DataFrameSource};

// --- Low-Level Assemblers (for custom drivers and testing) ---
pub use buffers::{reconstruct_data_buffer, reconstruct_offsets_buffer};
pub use column::assemble_column;
pub use table::assemble_table;

#[cfg(test)]
pub(crate) mod fixtures;
