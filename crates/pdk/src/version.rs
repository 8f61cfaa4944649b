//! # PDK Versions
//!
//! A version is a `(family, version string)` pair. It resolves deterministically to a
//! single directory beneath the PDK root:
//!
//! ```text
//! <root>/ciel/<family>/versions/<version>
//! ```
//!
//! The version string itself is usually a commit of the family's source repository and
//! can either be given explicitly or read from a tool metadata file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::Family;

/// An error locating or resolving a version.
#[derive(Error, Debug)]
pub enum Error {
    /// The version's directory does not exist or is not a directory.
    #[error("Version {version} not found")]
    NotFound {
        /// The version that was requested.
        version: String,
        /// Where it was expected.
        path: PathBuf,
    },
    /// No version was given and no metadata file could be found.
    #[error("No version was given and no tool metadata file was found")]
    NoMetadata,
    /// The metadata file could not be read.
    #[error("Failed to read tool metadata at {}", .1.display())]
    MetadataRead(#[source] std::io::Error, PathBuf),
    /// The metadata file is not valid.
    #[error("Failed to parse tool metadata at {}", .1.display())]
    MetadataParse(#[source] serde_yaml::Error, PathBuf),
    /// The metadata file does not pin the tool versions are taken from.
    #[error("Tool metadata at {} has no entry for `{}`", .0.display(), METADATA_TOOL)]
    NoEntry(PathBuf),
}

/// The tool entry in a metadata file whose commit is the PDK version.
pub const METADATA_TOOL: &str = "open_pdks";
/// Where metadata files are searched for, relative to the working directory.
const METADATA_CANDIDATES: [&str; 2] = ["tool_metadata.yml", "dependencies/tool_metadata.yml"];

/// A specific version of a PDK family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    family: &'static Family,
    name: String,
}

impl Version {
    /// Construct a version of `family`.
    pub fn new(family: &'static Family, name: impl Into<String>) -> Self {
        Version {
            family,
            name: name.into(),
        }
    }

    /// The family this is a version of.
    pub fn family(&self) -> &'static Family {
        self.family
    }

    /// The version string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory holding every version of this family.
    pub fn family_dir(root: &Path, family: &Family) -> PathBuf {
        root.join(crate::TOOL).join(family.name())
    }

    /// The directory this version is, or would be, built into.
    pub fn dir(&self, root: &Path) -> PathBuf {
        Version::family_dir(root, self.family)
            .join("versions")
            .join(&self.name)
    }

    /// The release tag this version is published under, `<family>-<version>`.
    pub fn tag(&self) -> String {
        format!("{}-{}", self.family.name(), self.name)
    }

    /// Resolve this version to its directory, which must already exist.
    ///
    /// The returned path is canonical, so everything derived from it stays absolute even
    /// when `root` is relative.
    pub fn locate(&self, root: &Path) -> Result<PathBuf, Error> {
        let path = self.dir(root);
        let not_found = |path| Error::NotFound {
            version: self.name.clone(),
            path,
        };
        if !path.is_dir() {
            return Err(not_found(path));
        }
        let canonical = fs::canonicalize(&path).map_err(|_| not_found(path))?;
        tracing::debug!(version = %self.name, path = %canonical.display(), "located version");
        Ok(canonical)
    }
}

#[derive(Deserialize)]
struct Tool {
    name: String,
    commit: String,
}

/// Determine the version to work with.
///
/// An explicit version always wins. Otherwise the commit pinned for
/// [`METADATA_TOOL`] is read from `metadata`, or from the first metadata file found in
/// the working directory when no path is given.
pub fn resolve(explicit: Option<String>, metadata: Option<&Path>) -> Result<String, Error> {
    if let Some(version) = explicit {
        return Ok(version);
    }

    let path = match metadata {
        Some(path) => path.to_path_buf(),
        None => METADATA_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or(Error::NoMetadata)?,
    };

    from_metadata(&path)
}

fn from_metadata(path: &Path) -> Result<String, Error> {
    let content = fs::read_to_string(path).map_err(|e| Error::MetadataRead(e, path.into()))?;
    let tools: Vec<Tool> =
        serde_yaml::from_str(&content).map_err(|e| Error::MetadataParse(e, path.into()))?;

    let version = tools
        .into_iter()
        .find(|t| t.name == METADATA_TOOL)
        .map(|t| t.commit)
        .ok_or_else(|| Error::NoEntry(path.into()))?;

    tracing::info!(%version, metadata = %path.display(), "Resolved version from tool metadata");
    Ok(version)
}
