//! Domain Layer - Core ranking logic
//!
//! Pure types and functions with no I/O. Adapters hand raw records in
//! through the ports layer; everything here is deterministic.
//!
//! Flow: `normalizer` -> `aggregator` -> `scorer` -> `ranking`

pub mod snapshot;
pub mod token;
pub mod normalizer;
pub mod aggregator;
pub mod scorer;
pub mod ranking;

pub use snapshot::{MarketSnapshot, SourceFamily, SourceTag};
pub use token::{Category, ScoredToken};
pub use normalizer::{normalize, normalize_batch, NormalizeError};
pub use aggregator::{Aggregator, DEFAULT_DENYLIST};
pub use scorer::{highlight_count, AmplitudeModel, Measurement, Scorer, ScoringStrategy};
pub use ranking::{filter, rank, RankKey, RankingState, Stage, DEFAULT_TOP_N};
