//! # Release Publishing
//!
//! A release is identified by its tag, `<family>-<version>`, and carries one asset per
//! collection archive. Assets are handed to a [`Transport`] one at a time, in the order
//! they were produced.
//!
//! Publishing is idempotent per tag: the transport creates the release if the tag is new
//! and replaces any existing asset of the same name, so publishing a version twice
//! leaves a single set of assets behind.

pub mod error;
pub mod ghr;

use std::path::Path;

use chrono::{DateTime, Utc};

pub use error::Error;
pub use ghr::Ghr;

use crate::Version;

/// The identity and description of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    tag: String,
    body: String,
    prerelease: bool,
}

impl Release {
    /// Describe the release of `version`, mentioning `date` when it is known.
    pub fn new(version: &Version, date: Option<&DateTime<Utc>>, prerelease: bool) -> Self {
        Release {
            tag: version.tag(),
            body: Release::body(version.family().name(), date),
            prerelease,
        }
    }

    /// The release description for `family`.
    pub fn body(family: &str, date: Option<&DateTime<Utc>>) -> String {
        match date {
            Some(date) => format!(
                "{family} variants (released on {})",
                crate::github::iso8601(date)
            ),
            None => format!("{family} variants built using {}", crate::TOOL),
        }
    }

    /// The release tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The release description.
    pub fn description(&self) -> &str {
        &self.body
    }

    /// Whether the release is marked as a pre-release.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease
    }
}

/// Counts reported after a successful publish.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub published: u32,
}

/// Uploads a single asset to a release, creating the release or replacing a same-named
/// asset as needed.
pub trait Transport {
    /// The error a failed upload produces.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Upload `asset` to `release`.
    fn upload(&self, release: &Release, asset: &Path) -> Result<(), Self::Error>;
}

/// Publishes the assets of a release through a [`Transport`].
#[derive(Debug)]
pub struct Publisher<T> {
    transport: T,
}

impl<T: Transport> Publisher<T> {
    /// A publisher uploading through `transport`.
    pub fn new(transport: T) -> Self {
        Publisher { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Upload every asset in order.
    ///
    /// # Error Handling
    /// The first failed upload stops the process and is returned as
    /// [`Error::Release`]. Assets uploaded before it stay published, nothing is rolled
    /// back.
    pub fn publish<I, P>(&self, release: &Release, assets: I) -> Result<Stats, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut stats = Stats::default();
        for asset in assets {
            let asset = asset.as_ref();
            tracing::info!(tag = release.tag(), asset = %asset.display(), "Uploading asset");
            self.transport
                .upload(release, asset)
                .map_err(|e| Error::Release {
                    asset: asset.to_path_buf(),
                    source: Box::new(e),
                })?;
            stats.published += 1;
        }

        tracing::info!(
            tag = release.tag(),
            prerelease = release.is_prerelease(),
            stats.published,
            "Finished publishing release"
        );
        Ok(stats)
    }
}
