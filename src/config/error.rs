//! Error types for the config module

use thiserror::Error;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No target URLs were supplied
    #[error("no URLs found, check the URL list file")]
    MissingUrls,

    /// No target fields were supplied
    #[error("no fields found, check the field list file")]
    MissingFields,

    /// A configuration file exists but could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the file
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },
}
