//! Builds families whose repository already holds the finished variant trees by copying
//! them into the version directory.
use std::fs;

use super::{BuildOptions, Error};
use crate::{Family, Version};

/// Build `options.version` of `family` by copying its variants out of the repository.
pub fn build(family: &Family, options: &BuildOptions) -> Result<(), Error> {
    let libraries = family.select_for_build(&options.include_libraries);
    let work = super::work_dir(family, options);
    fs::create_dir_all(&work).map_err(super::io_error(&work))?;

    let source = super::checkout(family, options, &work)?;
    let version_dir = Version::new(family, &options.version).dir(&options.pdk_root);
    super::fresh_dir(&version_dir)?;

    for variant in family.variants() {
        let tree = source.join(variant);
        if !tree.is_dir() {
            return Err(Error::MissingVariant {
                variant: (*variant).to_owned(),
                path: tree,
            });
        }
        tracing::info!(variant, "Copying variant");
        super::copy_tree(&tree, &version_dir.join(variant))?;
    }

    super::prune_libraries(&version_dir, family, &libraries)?;
    super::clear_artifacts(&work, options)
}
