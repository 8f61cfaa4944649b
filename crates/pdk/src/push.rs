//! # Pushing a Version
//!
//! One invocation of the release pipeline for a single built version:
//!
//! 1. look the family up and require a credential, before anything touches the disk;
//! 2. locate the version directory;
//! 3. partition it and compress every collection into a fresh scratch directory;
//! 4. describe the release, dating it by the version's commit when the API knows it;
//! 5. upload every archive to the release.
//!
//! Archives are left in the scratch directory afterwards, whether or not publishing
//! succeeded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use prodash::NestedProgress;

use crate::archive::{self, Compression};
use crate::github::{Credential, GitHub};
use crate::partition::{self, Collections, Unrequested};
use crate::publish::{self, Publisher, Release, Stats, Transport};
use crate::{Error, Family, Version};

/// How a version is packaged into archives.
#[derive(Debug, Clone)]
pub struct Packaging {
    /// The libraries to give their own collection; every library when empty.
    pub libraries: Vec<String>,
    /// What happens to libraries that were not requested.
    pub unrequested: Unrequested,
    /// The compression applied to every archive.
    pub compression: Compression,
    /// The base directory archives are written beneath.
    pub scratch_dir: PathBuf,
}

impl Packaging {
    /// Package every library with default settings into `scratch_dir`.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Packaging {
            libraries: Vec::new(),
            unrequested: Unrequested::default(),
            compression: Compression::default(),
            scratch_dir: scratch_dir.into(),
        }
    }
}

/// The archives produced for a version.
#[derive(Debug)]
pub struct Package {
    dir: PathBuf,
    collections: Collections,
    archives: Vec<PathBuf>,
}

impl Package {
    /// The scratch directory holding the archives.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The collections the archives were built from.
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    /// The archive paths, in the order they were produced.
    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }
}

/// A version that is ready to be packaged and published.
#[derive(Debug)]
pub struct Push {
    version: Version,
    dir: PathBuf,
    credential: Credential,
}

impl Push {
    /// Validate a push of `version` of `family` beneath `pdk_root`.
    ///
    /// The family is checked first, then the credential, then the version directory, so
    /// an unauthenticated push fails before any archive work is done.
    pub fn new(
        pdk_root: &Path,
        family: &str,
        version: &str,
        credential: Option<Credential>,
    ) -> Result<Self, Error> {
        let family = Family::lookup(family)?;
        let credential = credential.ok_or(publish::Error::Authentication)?;
        let version = Version::new(family, version);
        let dir = version.locate(pdk_root)?;

        Ok(Push {
            version,
            dir,
            credential,
        })
    }

    /// The version being pushed.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The version directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The credential the release is published with.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The libraries that get a collection of their own.
    pub fn libraries(&self, packaging: &Packaging) -> BTreeSet<String> {
        self.version.family().select(&packaging.libraries)
    }

    /// Partition the version and compress each collection into a new scratch directory.
    pub fn package<P: NestedProgress>(
        &self,
        packaging: &Packaging,
        progress: &mut P,
    ) -> Result<Package, Error> {
        let allowed = self.libraries(packaging);
        let collections = partition::partition_with(&self.dir, &allowed, packaging.unrequested)?;
        let dir = archive::scratch_dir(&packaging.scratch_dir, self.version.name())?;

        tracing::info!(
            collections = collections.len(),
            files = collections.file_count(),
            dir = %dir.display(),
            "Packaging version"
        );
        let archives = archive::build_all(
            &collections,
            &self.dir,
            &dir,
            packaging.compression,
            progress,
        )?;

        Ok(Package {
            dir,
            collections,
            archives,
        })
    }

    /// Describe the release, dated by the version's commit when `github` knows it.
    ///
    /// A failed lookup is logged and the undated description used instead.
    pub async fn release(&self, github: &GitHub, prerelease: bool) -> Release {
        let family = self.version.family();
        let date = match github.commit_date(family.repo(), self.version.name()).await {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(
                    message = "Could not look up the commit date, publishing without it",
                    repo = family.repo(),
                    reason = %e
                );
                None
            },
        };
        Release::new(&self.version, date.as_ref(), prerelease)
    }

    /// Upload every archive of `package` to `release` through `transport`.
    pub fn publish<T: Transport>(
        &self,
        release: &Release,
        package: &Package,
        transport: T,
    ) -> Result<Stats, Error> {
        Ok(Publisher::new(transport).publish(release, package.archives())?)
    }
}
