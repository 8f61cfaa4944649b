mod build;
mod push;

use super::Args;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub(super) enum Commands {
    /// Build a PDK version from source.
    ///
    /// The version directory is written beneath the PDK root as:
    ///
    ///   <PDK_ROOT>/ciel/<FAMILY>/versions/<VERSION>
    ///
    /// If no version is given, the commit pinned for open_pdks in a tool
    /// metadata file is used: either the file given with --metadata-file,
    /// or ./tool_metadata.yml or ./dependencies/tool_metadata.yml.
    #[command(verbatim_doc_comment)]
    Build(build::Args),
    /// For maintainers: package a built version and publish it as a release.
    ///
    /// Every file of the version is assigned to a collection: one per
    /// requested library (files under <VARIANT>/libs.ref/<LIBRARY>/) and
    /// a "common" collection holding everything else. Each collection is
    /// compressed into its own archive and uploaded as an asset of the
    /// release tagged <FAMILY>-<VERSION>, replacing existing assets.
    ///
    /// Requires ghr: github.com/tcnksm/ghr
    #[command(verbatim_doc_comment)]
    Push(push::Args),
}

/// Options locating the PDK shared by every command.
#[derive(Parser, Debug)]
#[command(next_help_heading = "PDK Options")]
pub(super) struct PdkArgs {
    /// The PDK family to operate on
    #[arg(
        long = "pdk-family",
        value_name = "FAMILY",
        default_value_t = config::CONFIG.family().to_owned(),
        value_parser = family_name
    )]
    family: String,
    /// The root directory PDK versions are stored beneath
    #[arg(
        long,
        value_name = "DIR",
        env = "PDK_ROOT",
        default_value_os_t = config::CONFIG.pdk_root().to_owned()
    )]
    pdk_root: PathBuf,
}

fn family_name(name: &str) -> Result<String, pdk::family::Error> {
    pdk::Family::lookup(name).map(|f| f.name().to_owned())
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    if let Some(dir) = &args.working_directory {
        std::env::set_current_dir(dir)?;
        tracing::debug!(dir = %dir.display(), "changed working directory");
    }

    match args.command {
        Commands::Build(build_args) => {
            build::run(build_args).await?;
        },
        Commands::Push(push_args) => {
            let stats = push::run(push_args, args.log.quiet()).await?;
            tracing::debug!(stats.published, "push finished");
        },
    }
    Ok(())
}
