//! This module serves as the public API for all null-handling logic of the
//! interchange importer.
//!
//! A foreign column describes its missing values with one of five encodings
//! (non-nullable, NaN, sentinel, bitmask, bytemask). This module turns any of
//! them into Arrow's single representation: an optional validity `NullBuffer`.
//!
//! This module is pure Arrow and is completely decoupled from the protocol traits.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// The synthesizer turning a null encoding into an Arrow validity bitmap.
pub mod validity;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use validity::synthesize_validity;

//==================================================================================
// 3. Unit Tests (Module-level integration tests)
//==================================================================================
