//! This module defines the strongly-typed descriptors exchanged with the
//! interchange protocol.
//!
//! It includes the `ProtocolDtype` descriptor and its mapping onto Arrow types
//! (the dtype codec), the temporal format-string grammar, and the null-encoding
//! descriptors.

pub mod null_encoding;
pub mod protocol_dtype;
pub(crate) mod temporal;

// Re-export the main types for easier access.
pub use null_encoding::{NullDescription, NullEncoding, Sentinel};
pub use protocol_dtype::{categorical_type, DtypeKind, Endianness, ProtocolDtype};
