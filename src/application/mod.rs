//! Application Layer - Pipeline orchestration
//!
//! - `pipeline`: one fan-out/fan-in refresh cycle with primary/fallback stages
//! - `engine`: owns the ranking state, enforces cancel-and-restart refreshes

pub mod pipeline;
pub mod engine;

pub use pipeline::{
    BatchCache, Collection, FeedHandle, PipelineError, PipelineRun, PipelineSettings, RankingPipeline,
    RunOutcome, StageReport,
};
pub use engine::{EngineStatus, RankingEngine, DEFAULT_REFRESH_INTERVAL};
