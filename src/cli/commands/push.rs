#[cfg(test)]
mod tests;

use super::PdkArgs;
use crate::cli::logging::Progress;

use clap::Parser;
use pdk::archive::Compression;
use pdk::github::{self, GitHub};
use pdk::partition::Unrequested;
use pdk::publish::{Ghr, Stats};
use pdk::push::{Package, Packaging, Push};

#[derive(Parser, Debug)]
pub(in super::super) struct Args {
    /// The version to publish; it must already be built
    version: String,

    #[command(flatten)]
    pdk: PdkArgs,

    #[command(flatten)]
    release: ReleaseArgs,

    #[command(flatten)]
    package: PackageArgs,
}

#[derive(Parser, Debug)]
#[command(next_help_heading = "Release Options")]
struct ReleaseArgs {
    /// The owner of the repository to publish to
    #[arg(long, default_value_t = config::CONFIG.release().owner().to_owned())]
    owner: String,

    /// The repository to publish to
    #[arg(long, default_value_t = config::CONFIG.release().repository().to_owned())]
    repository: String,

    /// Mark the release as a pre-release
    #[arg(long)]
    pre: bool,

    /// The GitHub token to publish with
    #[arg(long, env = github::TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,
}

#[derive(Parser, Debug)]
#[command(next_help_heading = "Packaging Options")]
struct PackageArgs {
    /// Give this library its own archive; may be given multiple times
    ///
    /// Every library of the family gets its own archive when omitted.
    #[arg(short = 'l', long = "push-libraries", value_name = "LIB")]
    libraries: Vec<String>,

    /// Leave files of libraries that were not requested out of every archive
    ///
    /// By default they are packaged as part of the common archive.
    #[arg(long)]
    omit_unrequested: bool,

    /// The compression applied to each archive
    #[arg(
        long,
        value_name = "FORMAT",
        default_value_t = config::CONFIG.compression().to_owned(),
        value_parser = ["zstd", "gzip"]
    )]
    compression: String,
}

pub(super) async fn run(args: Args, quiet: bool) -> anyhow::Result<Stats> {
    let Args {
        version,
        pdk: PdkArgs { family, pdk_root },
        release:
            ReleaseArgs {
                owner,
                repository,
                pre,
                token,
            },
        package,
    } = args;

    let push = Push::new(&pdk_root, &family, &version, github::credential(token))?;

    let packaging = Packaging {
        libraries: package.libraries,
        unrequested: if package.omit_unrequested {
            Unrequested::Omit
        } else {
            Unrequested::Fold
        },
        compression: package.compression.parse::<Compression>()?,
        scratch_dir: config::CONFIG.scratch_dir().to_owned(),
    };

    let package = package(&push, &packaging, quiet)?;

    let github = GitHub::new(config::CONFIG.github().api(), Some(push.credential().clone()))?;
    let release = push.release(&github, pre).await;

    let settings = config::CONFIG.release();
    let ghr = Ghr::new(owner, repository, push.credential().clone())
        .with_binary(settings.ghr())
        .with_commitish(settings.commitish());

    tracing::info!(
        tag = release.tag(),
        repo = %ghr.slug(),
        archives = package.archives().len(),
        "Publishing release"
    );
    let stats = tokio::task::block_in_place(|| push.publish(&release, &package, ghr))?;

    Ok(stats)
}

/// Archive every collection without stalling the runtime worker the command runs on.
fn package(push: &Push, packaging: &Packaging, quiet: bool) -> Result<Package, pdk::Error> {
    let progress = Progress::start(quiet);
    let mut item = progress.root.add_child(format!("Packaging {}", push.version().tag()));
    let packaged = tokio::task::block_in_place(|| push.package(packaging, &mut item));
    drop(item);
    progress.finish();
    packaged
}
