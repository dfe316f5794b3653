//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Keys are kebab-case; the camelCase spellings (`startYear`, `maxWorkers`, ...)
//! are accepted as aliases.
//!
//! # Example
//!
//! ```no_run
//! use novina::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Collecting {}..={}", config.crawl.start_year, config.crawl.end_year);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryEntry, CheckpointBackend, Config, CrawlConfig, FetchConfig, LanguageConfig,
    OutputConfig, ProcessingConfig, SiteConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
