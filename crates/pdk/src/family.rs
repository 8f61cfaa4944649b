//! # PDK Family Registry
//!
//! A static table of every PDK family this tool knows how to build and package. Each
//! entry carries the family's source repository, its variants, its library sets and a
//! reference to the entrypoint that builds a version of it.
//!
//! Families are registered here at compile time; there is no dynamic discovery.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::build::{self, Entrypoint};

/// An error looking up a family in the registry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The requested family is not registered.
    #[error("Unsupported PDK family '{0}'")]
    Unsupported(String),
}

/// A named category of PDK with its own build procedure and library set.
#[derive(Debug)]
pub struct Family {
    name: &'static str,
    /// `owner/name` of the GitHub repository versions are cut from.
    repo: &'static str,
    variants: &'static [&'static str],
    all_libraries: &'static [&'static str],
    default_libraries: &'static [&'static str],
    entrypoint: Entrypoint,
}

const SKY130: Family = Family {
    name: "sky130",
    repo: "RTimothyEdwards/open_pdks",
    variants: &["sky130A", "sky130B"],
    all_libraries: &[
        "sky130_fd_io",
        "sky130_fd_pr",
        "sky130_fd_pr_reram",
        "sky130_fd_sc_hd",
        "sky130_fd_sc_hdll",
        "sky130_fd_sc_hs",
        "sky130_fd_sc_hvl",
        "sky130_fd_sc_lp",
        "sky130_fd_sc_ls",
        "sky130_fd_sc_ms",
        "sky130_ml_xx_hd",
        "sky130_sram_macros",
    ],
    default_libraries: &[
        "sky130_fd_io",
        "sky130_fd_pr",
        "sky130_fd_sc_hd",
        "sky130_fd_sc_hvl",
        "sky130_ml_xx_hd",
        "sky130_sram_macros",
    ],
    entrypoint: build::open_pdks::build,
};

const GF180MCU: Family = Family {
    name: "gf180mcu",
    repo: "RTimothyEdwards/open_pdks",
    variants: &["gf180mcuA", "gf180mcuB", "gf180mcuC", "gf180mcuD"],
    all_libraries: &[
        "gf180mcu_fd_io",
        "gf180mcu_fd_ip_sram",
        "gf180mcu_fd_pr",
        "gf180mcu_fd_sc_mcu7t5v0",
        "gf180mcu_fd_sc_mcu9t5v0",
        "gf180mcu_osu_sc_gp12t3v3",
        "gf180mcu_osu_sc_gp9t3v3",
    ],
    default_libraries: &[
        "gf180mcu_fd_io",
        "gf180mcu_fd_ip_sram",
        "gf180mcu_fd_pr",
        "gf180mcu_fd_sc_mcu7t5v0",
        "gf180mcu_fd_sc_mcu9t5v0",
    ],
    entrypoint: build::open_pdks::build,
};

const IHP_SG13G2: Family = Family {
    name: "ihp-sg13g2",
    repo: "IHP-GmbH/IHP-Open-PDK",
    variants: &["ihp-sg13g2"],
    all_libraries: &["sg13g2_io", "sg13g2_pr", "sg13g2_sram", "sg13g2_stdcell"],
    default_libraries: &["sg13g2_io", "sg13g2_pr", "sg13g2_sram", "sg13g2_stdcell"],
    entrypoint: build::copy::build,
};

/// Every registered family, in the order they are presented to users.
pub static FAMILIES: &[Family] = &[SKY130, GF180MCU, IHP_SG13G2];

lazy_static::lazy_static! {
    static ref BY_NAME: HashMap<&'static str, &'static Family> =
        FAMILIES.iter().map(|f| (f.name, f)).collect();
}

impl Family {
    /// Look a family up by its identifier.
    pub fn lookup(name: &str) -> Result<&'static Family, Error> {
        BY_NAME.get(name).copied().ok_or_else(|| {
            tracing::debug!(
                family = name,
                supported = ?Family::names().collect::<Vec<_>>(),
                "family lookup failed"
            );
            Error::Unsupported(name.to_owned())
        })
    }

    /// The identifiers of all registered families.
    pub fn names() -> impl Iterator<Item = &'static str> {
        FAMILIES.iter().map(|f| f.name)
    }

    /// The family identifier, e.g. `sky130`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The `owner/name` of the repository versions of this family are cut from.
    pub fn repo(&self) -> &'static str {
        self.repo
    }

    /// The variant directories a built version contains.
    pub fn variants(&self) -> &'static [&'static str] {
        self.variants
    }

    /// The entrypoint that builds a version of this family.
    pub fn entrypoint(&self) -> Entrypoint {
        self.entrypoint
    }

    /// The full set of libraries this family supports.
    pub fn all_libraries(&self) -> BTreeSet<String> {
        collect(self.all_libraries)
    }

    /// The libraries a build installs when no subset is requested.
    pub fn default_libraries(&self) -> BTreeSet<String> {
        collect(self.default_libraries)
    }

    /// Whether `library` is one of this family's libraries.
    pub fn supports(&self, library: &str) -> bool {
        self.all_libraries.contains(&library)
    }

    /// The libraries to package for a request: everything when the request is empty,
    /// otherwise exactly what was asked for.
    pub fn select<S: AsRef<str>>(&self, requested: &[S]) -> BTreeSet<String> {
        self.requested_or(requested, Family::all_libraries)
    }

    /// The libraries to build for a request: the defaults when the request is empty,
    /// otherwise exactly what was asked for.
    pub fn select_for_build<S: AsRef<str>>(&self, requested: &[S]) -> BTreeSet<String> {
        self.requested_or(requested, Family::default_libraries)
    }

    fn requested_or<S, F>(&self, requested: &[S], fallback: F) -> BTreeSet<String>
    where
        S: AsRef<str>,
        F: FnOnce(&Self) -> BTreeSet<String>,
    {
        if requested.is_empty() {
            return fallback(self);
        }
        requested
            .iter()
            .map(AsRef::as_ref)
            .inspect(|lib| {
                if !self.supports(lib) {
                    tracing::warn!(
                        family = self.name,
                        library = lib,
                        "Requested library is not known for this family"
                    );
                }
            })
            .map(ToOwned::to_owned)
            .collect()
    }
}

impl PartialEq for Family {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Family {}

fn collect(libs: &[&str]) -> BTreeSet<String> {
    libs.iter().map(|&l| l.to_owned()).collect()
}
