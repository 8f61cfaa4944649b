use super::PdkArgs;

use anyhow::Context;
use clap::Parser;
use pdk::build::{self, BuildOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub(in super::super) struct Args {
    /// The version to build, usually an open_pdks commit
    ///
    /// Read from tool metadata when omitted.
    version: Option<String>,

    /// Read the version from this tool metadata file instead of searching for one
    #[arg(short = 'f', long = "metadata-file", value_name = "FILE")]
    metadata_file: Option<PathBuf>,

    #[command(flatten)]
    pdk: PdkArgs,

    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Parser, Debug)]
#[command(next_help_heading = "Build Options")]
struct BuildArgs {
    /// The number of parallel jobs to build with
    #[arg(short, long, value_name = "N", default_value_t = config::CONFIG.jobs())]
    jobs: usize,

    /// Install only this library; may be given multiple times
    ///
    /// The family's default libraries are installed when omitted.
    #[arg(short = 'l', long = "include-libraries", value_name = "LIB")]
    include_libraries: Vec<String>,

    /// Keep the build directory once the version is installed
    #[arg(long)]
    keep_build_artifacts: bool,

    /// Use the repository at PATH instead of cloning NAME; may be given multiple times
    #[arg(short = 'r', long = "use-repo-at", value_name = "NAME=PATH")]
    use_repo_at: Vec<String>,
}

pub(super) async fn run(args: Args) -> anyhow::Result<PathBuf> {
    let Args {
        version,
        metadata_file,
        pdk: PdkArgs { family, pdk_root },
        build: options,
    } = args;

    let version = pdk::version::resolve(version, metadata_file.as_deref())
        .context("Could not determine the open_pdks version")?;
    let options = BuildOptions {
        pdk_root,
        version,
        jobs: options.jobs,
        clear_build_artifacts: !options.keep_build_artifacts,
        include_libraries: options.include_libraries,
        using_repos: build::parse_repo_overrides(&options.use_repo_at)?,
    };

    let dir = tokio::task::spawn_blocking(move || build::build(&family, &options)).await??;
    tracing::info!(path = %dir.display(), "Version built");
    Ok(dir)
}
