//! Builds families from the open_pdks sources: configure, `make`, `make install` into a
//! scratch prefix, then move the installed variants into the version directory.
use std::fs;
use std::path::Path;

use super::{BuildOptions, Error};
use crate::{process, Family, Version};

/// Build `options.version` of `family` with open_pdks.
pub fn build(family: &Family, options: &BuildOptions) -> Result<(), Error> {
    let libraries = family.select_for_build(&options.include_libraries);
    let work = super::work_dir(family, options);
    fs::create_dir_all(&work).map_err(super::io_error(&work))?;

    let source = super::checkout(family, options, &work)?;
    let source = fs::canonicalize(&source).map_err(super::io_error(&source))?;
    let prefix = work.join("install");
    super::fresh_dir(&prefix)?;
    let prefix = fs::canonicalize(&prefix).map_err(super::io_error(&prefix))?;

    tracing::info!(family = family.name(), prefix = %prefix.display(), "Configuring open_pdks");
    process::run(
        source.join("configure"),
        configure_args(family, &prefix),
        Some(&source),
    )?;
    tracing::info!(jobs = options.jobs, "Running make");
    process::run("make", [format!("-j{}", options.jobs.max(1))], Some(&source))?;
    process::run("make", ["install"], Some(&source))?;

    let version_dir = Version::new(family, &options.version).dir(&options.pdk_root);
    super::fresh_dir(&version_dir)?;
    for variant in family.variants() {
        let built = prefix.join("share").join("pdk").join(variant);
        if !built.is_dir() {
            return Err(Error::MissingVariant {
                variant: (*variant).to_owned(),
                path: built,
            });
        }
        super::move_tree(&built, &version_dir.join(variant))?;
    }

    super::prune_libraries(&version_dir, family, &libraries)?;
    super::clear_artifacts(&work, options)
}

pub(super) fn configure_args(family: &Family, prefix: &Path) -> Vec<String> {
    vec![
        format!("--enable-{}-pdk", family.name()),
        format!("--with-{}-variants=all", family.name()),
        format!("--prefix={}", prefix.display()),
    ]
}
