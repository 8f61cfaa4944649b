//! # Error Types
//!
//! The top-level error of this crate, joining the errors of each stage of the pipeline.
use thiserror::Error;

use crate::{archive, build, family, github, partition, publish, version};

/// Any failure of the build or push pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// A transparent wrapper for a [`family::Error`]
    #[error(transparent)]
    Family(#[from] family::Error),
    /// A transparent wrapper for a [`version::Error`]
    #[error(transparent)]
    Version(#[from] version::Error),
    /// A transparent wrapper for a [`partition::Error`]
    #[error(transparent)]
    Partition(#[from] partition::Error),
    /// A transparent wrapper for a [`archive::Error`]
    #[error(transparent)]
    Archive(#[from] archive::Error),
    /// A transparent wrapper for a [`publish::Error`]
    #[error(transparent)]
    Publish(#[from] publish::Error),
    /// A transparent wrapper for a [`build::Error`]
    #[error(transparent)]
    Build(#[from] build::Error),
    /// A transparent wrapper for a [`github::Error`]
    #[error(transparent)]
    GitHub(#[from] github::Error),
}

impl Error {
    const VERSION_SUGGESTION: &str = "Build the version first, or check --pdk-root";

    /// Warn the user about specific error conditions, with hints where there are any.
    pub fn warn(&self) {
        match self {
            Error::Publish(e) => e.warn(),
            Error::Version(version::Error::NotFound { path, .. }) => {
                tracing::warn!(
                    message = %self,
                    path = %path.display(),
                    suggest = Error::VERSION_SUGGESTION
                )
            },
            Error::Family(_) => tracing::warn!(
                message = %self,
                supported = ?crate::Family::names().collect::<Vec<_>>()
            ),
            _ => tracing::warn!(message = %self),
        }
    }
}
