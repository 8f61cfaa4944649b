//! # PDK Packaging and Release
//!
//! The types and logic needed to turn a built process design kit version into a set of
//! independently installable archives and publish them as assets of a tagged release.
//!
//! The pipeline runs one way, leaves first:
//!
//! 1. [`family`]: a static registry of supported PDK families.
//! 2. [`version`]: locate the directory a `(family, version)` pair was built into.
//! 3. [`partition`]: classify every file of that directory into named collections.
//! 4. [`archive`]: compress each collection into a `<name>.tar.<ext>` archive.
//! 5. [`publish`]: upload each archive to a release tagged `<family>-<version>`.
//!
//! [`push`] ties these together for a single invocation, and [`build`] drives the
//! family specific build entrypoints that produce the version directories in the
//! first place.

pub mod archive;
pub mod build;
mod error;
pub mod family;
pub mod github;
pub mod partition;
pub mod publish;
pub mod push;
pub mod version;

mod process;

pub use error::Error;
pub use process::Error as CommandError;
pub use family::Family;
pub use partition::{Collection, Collections};
pub use version::Version;

/// The directory segment, directly beneath a variant, that holds installable libraries.
pub const LIBS_MARKER: &str = "libs.ref";
/// The name of the catch-all collection.
pub const COMMON: &str = "common";
/// The name of this tool, as it appears in release descriptions and on disk.
pub const TOOL: &str = "ciel";
