//! # Collection Archives
//!
//! Each [`Collection`] is written to a single `<name>.tar.<ext>` archive. Entries are
//! named by their path relative to the version root, so extracting every archive of a
//! version into one directory reconstructs the version tree.
//!
//! The tar stream is written straight into a streaming compressor; no archive is ever
//! held in memory. Headers are written in deterministic mode, which together with the
//! sorted file lists of [`crate::partition`] makes archives reproducible.
//!
//! A failed archive is left on disk as is and must be discarded by the caller.
#[cfg(test)]
mod tests;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use prodash::{NestedProgress, Progress};
use thiserror::Error;

use crate::partition::{Collection, Collections};

/// An error producing an archive.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a source file or writing the archive failed.
    #[error("Failed to archive {}", .path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
    /// Archives may not be written into the tree they are built from.
    #[error("Refusing to write archives into the version directory {}", .0.display())]
    OutputInsideVersion(PathBuf),
    /// A collection contained a file from outside the version directory.
    #[error("{} is not inside the version directory", .0.display())]
    NotInVersion(PathBuf),
    /// The compression name is not recognised.
    #[error("Unknown compression '{0}', expected one of: zstd, gzip")]
    UnknownCompression(String),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::Io { path, source }
}

/// The compression applied to the whole tar stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Zstandard, `.tar.zst`.
    #[default]
    Zstd,
    /// Gzip, `.tar.gz`.
    Gzip,
}

impl Compression {
    /// The file extension following `.tar.`.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Zstd => "zst",
            Compression::Gzip => "gz",
        }
    }

    /// The archive file name for the collection `name`.
    pub fn file_name(&self, name: &str) -> String {
        format!("{name}.tar.{}", self.extension())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zstd" | "zst" => Ok(Compression::Zstd),
            "gzip" | "gz" => Ok(Compression::Gzip),
            _ => Err(Error::UnknownCompression(s.to_owned())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Zstd => f.write_str("zstd"),
            Compression::Gzip => f.write_str("gzip"),
        }
    }
}

/// Create a fresh `<base>/<random id>/<version>` directory for one invocation's archives.
///
/// The random component keeps concurrent invocations for different versions apart.
pub fn scratch_dir(base: &Path, version: &str) -> Result<PathBuf, Error> {
    let dir = base
        .join(uuid::Uuid::new_v4().to_string())
        .join(version);
    fs::create_dir_all(&dir).map_err(io_error(&dir))?;
    tracing::debug!(dir = %dir.display(), "created archive scratch directory");
    Ok(dir)
}

/// Compress `collection` into `out_dir`, returning the path of the new archive.
///
/// `progress` is initialised with the number of files and advanced once per file.
pub fn build_archive<P: Progress>(
    collection: &Collection,
    version_dir: &Path,
    out_dir: &Path,
    compression: Compression,
    progress: &mut P,
) -> Result<PathBuf, Error> {
    ensure_outside(out_dir, version_dir)?;

    let path = out_dir.join(compression.file_name(collection.name()));
    let file = File::create(&path).map_err(io_error(&path))?;
    let writer = BufWriter::new(file);

    progress.init(
        Some(collection.files().len()),
        Some(prodash::unit::label("files")),
    );

    let mut writer = match compression {
        Compression::Zstd => {
            let encoder = zstd::stream::write::Encoder::new(writer, 0).map_err(io_error(&path))?;
            write_entries(encoder, collection, version_dir, &path, progress)?
                .finish()
                .map_err(io_error(&path))?
        },
        Compression::Gzip => {
            let encoder = flate2::write::GzEncoder::new(writer, flate2::Compression::default());
            write_entries(encoder, collection, version_dir, &path, progress)?
                .finish()
                .map_err(io_error(&path))?
        },
    };
    writer.flush().map_err(io_error(&path))?;

    tracing::info!(
        collection = collection.name(),
        files = collection.files().len(),
        archive = %path.display(),
        "Compressed collection"
    );
    Ok(path)
}

/// Compress every collection in order into `out_dir`, adding one child of `progress`
/// per collection.
pub fn build_all<P: NestedProgress>(
    collections: &Collections,
    version_dir: &Path,
    out_dir: &Path,
    compression: Compression,
    progress: &mut P,
) -> Result<Vec<PathBuf>, Error> {
    ensure_outside(out_dir, version_dir)?;
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    collections
        .iter()
        .map(|collection| {
            let mut child = progress.add_child(format!("Compressing {}", collection.name()));
            build_archive(collection, version_dir, out_dir, compression, &mut child)
        })
        .collect()
}

fn write_entries<W, P>(
    writer: W,
    collection: &Collection,
    version_dir: &Path,
    archive: &Path,
    progress: &mut P,
) -> Result<W, Error>
where
    W: Write,
    P: Progress,
{
    let mut tar = tar::Builder::new(writer);
    tar.mode(tar::HeaderMode::Deterministic);
    tar.follow_symlinks(false);

    for file in collection.files() {
        let name = file
            .strip_prefix(version_dir)
            .map_err(|_| Error::NotInVersion(file.clone()))?;
        tar.append_path_with_name(file, name)
            .map_err(io_error(file))?;
        progress.inc();
    }

    tar.into_inner().map_err(io_error(archive))
}

fn ensure_outside(out_dir: &Path, version_dir: &Path) -> Result<(), Error> {
    let canonical = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    if canonical(out_dir).starts_with(canonical(version_dir)) {
        return Err(Error::OutputInsideVersion(version_dir.to_path_buf()));
    }
    Ok(())
}
