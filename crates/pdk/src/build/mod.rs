//! # Building PDK Versions
//!
//! Every family registers an [`Entrypoint`] that produces a version directory beneath
//! the PDK root. This module holds what the entrypoints share: the options they are
//! given, source checkout, library pruning and the scratch space they build in.
//!
//! Two drivers exist:
//! - [`open_pdks`]: configure, make and install a family from the open_pdks sources.
//! - [`copy`]: copy prebuilt variant trees straight out of the source repository.
#[cfg(test)]
mod tests;

pub mod copy;
pub mod open_pdks;

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{family, process, Family, Version, LIBS_MARKER};

/// Builds a version of a family as described by the options.
pub type Entrypoint = fn(&Family, &BuildOptions) -> Result<(), Error>;

/// An error building a version.
#[derive(Error, Debug)]
pub enum Error {
    /// A transparent wrapper for a [`family::Error`]
    #[error(transparent)]
    Family(#[from] family::Error),
    /// A transparent wrapper for a [`process::Error`]
    #[error(transparent)]
    Command(#[from] process::Error),
    /// A repository override was not of the form `NAME=PATH`.
    #[error("Malformed repository override '{0}', expected NAME=PATH")]
    MalformedOverride(String),
    /// A filesystem operation failed.
    #[error("Failed to access {}", .path.display())]
    Io {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
    /// The build finished without producing one of the family's variants.
    #[error("Build did not produce variant {variant} at {}", .path.display())]
    MissingVariant {
        /// The missing variant.
        variant: String,
        /// Where it was expected.
        path: PathBuf,
    },
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::Io { path, source }
}

/// Everything an [`Entrypoint`] needs to know about the build it is asked to perform.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// The root all versions are installed beneath.
    pub pdk_root: PathBuf,
    /// The version to build, usually a commit of the family's repository.
    pub version: String,
    /// Parallel jobs handed to `make`.
    pub jobs: usize,
    /// Delete the build directory once the version is installed.
    pub clear_build_artifacts: bool,
    /// The libraries to install; the family defaults when empty.
    pub include_libraries: Vec<String>,
    /// Local checkouts used instead of cloning, by repository name.
    pub using_repos: BTreeMap<String, PathBuf>,
}

impl BuildOptions {
    /// Options building `version` beneath `pdk_root` with every other setting at its
    /// default.
    pub fn new(pdk_root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        BuildOptions {
            pdk_root: pdk_root.into(),
            version: version.into(),
            jobs: 1,
            clear_build_artifacts: true,
            include_libraries: Vec::new(),
            using_repos: BTreeMap::new(),
        }
    }
}

/// Build `version` of the family named `family`, returning the version directory.
pub fn build(family: &str, options: &BuildOptions) -> Result<PathBuf, Error> {
    let family = Family::lookup(family)?;
    let version = Version::new(family, &options.version);

    tracing::info!(
        family = family.name(),
        version = version.name(),
        jobs = options.jobs,
        "Building PDK"
    );
    (family.entrypoint())(family, options)?;

    let dir = version.dir(&options.pdk_root);
    tracing::info!(path = %dir.display(), "Built PDK");
    Ok(dir)
}

/// Turn `NAME=PATH` entries into a map of repository name to absolute path.
pub fn parse_repo_overrides<I, S>(entries: I) -> Result<BTreeMap<String, PathBuf>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cwd = std::env::current_dir().map_err(io_error(Path::new(".")))?;
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                    Ok((name.to_owned(), cwd.join(path)))
                },
                _ => Err(Error::MalformedOverride(entry.to_owned())),
            }
        })
        .collect()
}

/// The name a family's repository is referred to by in overrides, e.g. `open_pdks`.
pub fn repo_name(family: &Family) -> &'static str {
    family
        .repo()
        .rsplit_once('/')
        .map_or(family.repo(), |(_, name)| name)
}

/// The scratch directory a version of `family` is built in.
pub(crate) fn work_dir(family: &Family, options: &BuildOptions) -> PathBuf {
    Version::family_dir(&options.pdk_root, family)
        .join("build")
        .join(&options.version)
}

/// Make the family's sources at `options.version` available beneath `work`, returning
/// the checkout. A repository override is used as is.
pub(crate) fn checkout(family: &Family, options: &BuildOptions, work: &Path) -> Result<PathBuf, Error> {
    let name = repo_name(family);
    if let Some(path) = options.using_repos.get(name) {
        tracing::info!(repo = name, path = %path.display(), "Using local repository");
        return Ok(path.clone());
    }

    let dest = work.join(name);
    if dest.exists() {
        fs::remove_dir_all(&dest).map_err(io_error(&dest))?;
    }
    let url = format!("https://github.com/{}", family.repo());
    tracing::info!(%url, version = %options.version, "Cloning repository");
    process::run(
        "git",
        [OsStr::new("clone"), OsStr::new(&url), dest.as_os_str()],
        None,
    )?;
    process::run("git", ["checkout", options.version.as_str()], Some(&dest))?;
    process::run(
        "git",
        ["submodule", "update", "--init", "--recursive"],
        Some(&dest),
    )?;
    Ok(dest)
}

/// Replace whatever is at `dir` with an empty directory.
pub(crate) fn fresh_dir(dir: &Path) -> Result<(), Error> {
    if dir.exists() {
        tracing::debug!(dir = %dir.display(), "removing previous contents");
        fs::remove_dir_all(dir).map_err(io_error(dir))?;
    }
    fs::create_dir_all(dir).map_err(io_error(dir))
}

/// Delete every `<variant>/libs.ref/<library>` of `family` not in `keep`, returning the
/// names of the libraries removed.
pub(crate) fn prune_libraries(
    version_dir: &Path,
    family: &Family,
    keep: &BTreeSet<String>,
) -> Result<BTreeSet<String>, Error> {
    let mut removed = BTreeSet::new();
    for variant in family.variants() {
        let libs = version_dir.join(variant).join(LIBS_MARKER);
        if !libs.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&libs).map_err(io_error(&libs))? {
            let entry = entry.map_err(io_error(&libs))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if keep.contains(&name) || !path.is_dir() {
                continue;
            }
            fs::remove_dir_all(&path).map_err(io_error(&path))?;
            removed.insert(name);
        }
    }
    if !removed.is_empty() {
        tracing::info!(libraries = ?removed, "Pruned libraries that were not requested");
    }
    Ok(removed)
}

/// Copy the tree at `source` to `target`, skipping `.git`.
pub(crate) fn copy_tree(source: &Path, target: &Path) -> Result<(), Error> {
    fs::create_dir_all(target).map_err(io_error(target))?;

    for entry in fs::read_dir(source).map_err(io_error(source))? {
        let entry = entry.map_err(io_error(source))?;
        let file_name = entry.file_name();
        if file_name == ".git" {
            continue;
        }

        let source_path = entry.path();
        let target_path = target.join(&file_name);
        let file_type = entry.file_type().map_err(io_error(&source_path))?;

        if file_type.is_dir() {
            copy_tree(&source_path, &target_path)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(&source_path).map_err(io_error(&source_path))?;
            symlink(&link, &target_path)?;
        } else {
            fs::copy(&source_path, &target_path).map_err(io_error(&source_path))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(link: &Path, target: &Path) -> Result<(), Error> {
    std::os::unix::fs::symlink(link, target).map_err(io_error(target))
}

#[cfg(not(unix))]
fn symlink(link: &Path, target: &Path) -> Result<(), Error> {
    let resolved = target.parent().map_or(link.to_path_buf(), |p| p.join(link));
    fs::copy(&resolved, target).map(drop).map_err(io_error(target))
}

/// Move `source` to `target`, copying when they are on different filesystems.
pub(crate) fn move_tree(source: &Path, target: &Path) -> Result<(), Error> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    copy_tree(source, target)?;
    fs::remove_dir_all(source).map_err(io_error(source))
}

/// Delete the build directory if the options ask for it.
pub(crate) fn clear_artifacts(work: &Path, options: &BuildOptions) -> Result<(), Error> {
    if options.clear_build_artifacts && work.exists() {
        tracing::debug!(dir = %work.display(), "clearing build artifacts");
        fs::remove_dir_all(work).map_err(io_error(work))?;
    }
    Ok(())
}
