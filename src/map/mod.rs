//! MAP assessment analytics: norm-referenced percentiles, conditional growth,
//! Lexile bands, achievement classification.
//!
//! Everything here is pure and synchronous. The only state is the norm
//! registry, which callers build once and share read-only.

pub mod achievement;
pub mod calendar;
pub mod error;
pub mod growth;
pub mod lexile;
pub mod norm_data;
pub mod normal;
pub mod norms;
pub mod percentile;
pub mod stats;
pub mod types;

pub use error::{GrowthError, NormLookupError, NormSetError};
pub use norms::NormRegistry;
pub use types::{Grade, GrowthPeriod, Subject, Term};
