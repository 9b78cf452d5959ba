//! SQLRound Engine
//!
//! The round-trip optimization pipeline: SQL -> explanation -> SQL, with
//! versioned metadata persisted after both stages succeed.

pub mod optimizer;
pub mod comparison;

pub use optimizer::{OptimizeError, QueryOptimizer};
pub use comparison::{compare_dialects, DialectComparison};
