//! # Publishing Errors
//!
//! This module contains the error types for errors that might occur during publishing.
use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error representing a failure to publish a release.
#[derive(Error, Debug)]
pub enum Error {
    /// No credential was available for the release store.
    #[error("No GitHub token was provided, pass --token or set GITHUB_TOKEN")]
    Authentication,
    /// Uploading an asset failed. Every asset before it remains published.
    #[error("Failed to upload {}", .asset.display())]
    Release {
        /// The asset whose upload failed.
        asset: PathBuf,
        /// The transport failure.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Warn the user about specific error conditions encountered during publishing.
    pub fn warn(&self) {
        match self {
            Error::Release { asset, source } => {
                tracing::warn!(
                    message = %self,
                    asset = %asset.display(),
                    reason = %source,
                    suggest = "Assets uploaded before this one were kept, rerun to replace them"
                )
            },
            Error::Authentication => tracing::warn!(message = %self),
        }
    }
}
