//! This file is the root of the `interchange_core` Rust crate.
//!
//! The crate imports any object speaking the dataframe interchange protocol into
//! an Arrow-backed `DataFrame`, sharing the foreign memory wherever the layouts
//! agree and copying only when the caller allows it.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`bridge`, `protocol`,
//!     `native`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the small public surface most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod native;
pub mod null_handling;
pub mod protocol;
pub mod types;

mod utils;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use bridge::{from_dataframe, from_dataframe_with_config, DataFrameSource};
pub use config::InterchangeConfig;
pub use error::InterchangeError;
pub use frame::DataFrame;
pub use logging::enable_verbose_logging;
pub use native::DataFrameInterchange;
pub use protocol::{
    InterchangeBuffer, InterchangeColumn, InterchangeDataFrame, SupportsInterchange,
};
