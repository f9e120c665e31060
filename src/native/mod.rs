//! The outbound side of the protocol: Arrow data exposed through the
//! interchange traits.
//!
//! This is what a foreign consumer would see when it asks a `DataFrame` for its
//! interchange object. It uses real element offsets, Arrow's bitmask null
//! encoding, 64-bit string offsets and UInt32 categorical codes.

mod buffer;
mod column;
mod dataframe;

pub use buffer::ArrowBuffer;
pub use column::ArrowColumn;
pub use dataframe::DataFrameInterchange;
