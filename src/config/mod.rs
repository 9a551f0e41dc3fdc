//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, FiltersSection, LoggingSection, PipelineSection, SourcesSection,
    load_config,
};
