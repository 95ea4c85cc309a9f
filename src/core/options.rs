//! Reader configuration
//!
//! [`ReaderOptions`] carries everything a reader decides at construction time:
//! how strictly malformed data is treated, which index variant is built and
//! how index files are read.

use crate::core::io::IoStrategy;
use log::warn;
use std::fmt::Display;

/// How malformed data is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationStringency {
    /// Fail on the first problem
    #[default]
    Strict,
    /// Log a warning and carry on
    Lenient,
    /// Carry on without reporting
    Silent,
}

impl ValidationStringency {
    /// Apply the stringency to a recoverable problem
    ///
    /// Returns the problem as an error under `Strict`; otherwise the caller
    /// continues past it.
    pub fn check<E: Display>(self, problem: E) -> Result<(), E> {
        match self {
            ValidationStringency::Strict => Err(problem),
            ValidationStringency::Lenient => {
                warn!("{}", problem);
                Ok(())
            }
            ValidationStringency::Silent => Ok(()),
        }
    }
}

/// Construction-time reader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Stringency handed to every iterator the reader constructs
    pub validation_stringency: ValidationStringency,
    /// Keep a parsed BAI in memory instead of re-reading it per lookup
    pub enable_index_caching: bool,
    /// How index files are read from disk
    pub index_io_strategy: IoStrategy,
    /// Treat a region query without an index as fatal
    ///
    /// When false such queries yield no records.
    pub require_index_for_queries: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            validation_stringency: ValidationStringency::default(),
            enable_index_caching: false,
            index_io_strategy: IoStrategy::Auto,
            require_index_for_queries: true,
        }
    }
}
