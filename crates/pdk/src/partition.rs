//! # Collection Partitioning
//!
//! Every regular file beneath a version directory is assigned to exactly one named
//! [`Collection`]. A file whose path relative to the version root looks like
//!
//! ```text
//! <variant>/libs.ref/<library>/...
//! ```
//!
//! belongs to the `<library>` collection when that library was requested. Everything
//! else lands in the catch-all [`COMMON`] collection, which always exists and always
//! comes first.
//!
//! Directory entries are visited in file name order, so the resulting file lists are
//! sorted by relative path and identical across machines.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::{COMMON, LIBS_MARKER};

/// A filesystem failure while walking a version directory.
#[derive(Error, Debug)]
#[error("Failed to read {}", .path.display())]
pub struct Error {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

impl Error {
    /// The path that could not be read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What to do with files of libraries that were not requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unrequested {
    /// Package them generically as part of [`COMMON`].
    #[default]
    Fold,
    /// Leave them out of every collection.
    Omit,
}

/// A named group of files destined for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
    files: Vec<PathBuf>,
}

impl Collection {
    fn new(name: impl Into<String>) -> Self {
        Collection {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// The collection name, [`COMMON`] or a library name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The absolute paths of the files in this collection, in encounter order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether the collection holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The collections of a version directory: [`COMMON`] first, then each library in the
/// order it was first encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    entries: Vec<Collection>,
    index: HashMap<String, usize>,
}

impl Default for Collections {
    fn default() -> Self {
        Collections {
            entries: vec![Collection::new(COMMON)],
            index: HashMap::from([(COMMON.to_owned(), 0)]),
        }
    }
}

impl Collections {
    /// Look up a collection by name.
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// The catch-all collection.
    pub fn common(&self) -> &Collection {
        &self.entries[0]
    }

    /// Iterate over all collections in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Collection> {
        self.entries.iter()
    }

    /// The number of collections, [`COMMON`] included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`, as [`COMMON`] is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The collection names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Collection::name)
    }

    /// The total number of files across every collection.
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|c| c.files.len()).sum()
    }

    fn push(&mut self, name: &str, file: PathBuf) {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.entries.push(Collection::new(name));
                let i = self.entries.len() - 1;
                self.index.insert(name.to_owned(), i);
                i
            },
        };
        self.entries[i].files.push(file);
    }
}

impl<'a> IntoIterator for &'a Collections {
    type Item = &'a Collection;
    type IntoIter = std::slice::Iter<'a, Collection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Classify every file beneath `version_dir`, folding unrequested libraries into
/// [`COMMON`].
pub fn partition(version_dir: &Path, allowed: &BTreeSet<String>) -> Result<Collections, Error> {
    partition_with(version_dir, allowed, Unrequested::Fold)
}

/// Classify every file beneath `version_dir`, treating unrequested libraries as `policy`
/// dictates.
pub fn partition_with(
    version_dir: &Path,
    allowed: &BTreeSet<String>,
    policy: Unrequested,
) -> Result<Collections, Error> {
    let mut collections = Collections::default();
    let mut files = Vec::new();
    walk(version_dir, &mut files)?;

    for file in files {
        // the walk only yields descendants of `version_dir`
        let Ok(relative) = file.strip_prefix(version_dir) else {
            continue;
        };
        match classify(relative, allowed) {
            Class::Library(lib) => {
                let lib = lib.to_owned();
                collections.push(&lib, file);
            },
            Class::Unrequested(lib) => {
                if policy == Unrequested::Omit {
                    tracing::trace!(library = lib, file = %relative.display(), "omitting");
                    continue;
                }
                collections.push(COMMON, file);
            },
            Class::Common => collections.push(COMMON, file),
        }
    }

    tracing::debug!(
        collections = ?collections.names().collect::<Vec<_>>(),
        files = collections.file_count(),
        "partitioned version directory"
    );

    Ok(collections)
}

enum Class<'a> {
    Library(&'a str),
    Unrequested(&'a str),
    Common,
}

fn classify<'a>(relative: &'a Path, allowed: &BTreeSet<String>) -> Class<'a> {
    let mut components = relative.components().map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    });
    let (_variant, marker, library) = (components.next(), components.next(), components.next());

    match (marker.flatten(), library.flatten()) {
        (Some(LIBS_MARKER), Some(lib)) => {
            if allowed.contains(lib) {
                Class::Library(lib)
            } else {
                Class::Unrequested(lib)
            }
        },
        _ => Class::Common,
    }
}

/// Depth first, file name ordered walk collecting every regular file, including symlinks
/// that resolve to one. Symlinked directories are not followed.
fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    let wrap = |path: &Path| {
        let path = path.to_path_buf();
        move |source| Error { path, source }
    };

    let mut entries = fs::read_dir(dir)
        .map_err(wrap(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(wrap(dir))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(wrap(&path))?;
        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            files.push(path);
        }
    }

    Ok(())
}
