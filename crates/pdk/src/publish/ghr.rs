//! Uploads through the `ghr` command line tool, one invocation per asset.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::{Release, Transport};
use crate::github::Credential;
use crate::process;

/// A [`Transport`] publishing to a GitHub repository with `ghr`.
#[derive(Debug, Clone)]
pub struct Ghr {
    binary: PathBuf,
    owner: String,
    repository: String,
    commitish: String,
    credential: Credential,
}

impl Ghr {
    /// The branch new release tags are created on unless told otherwise.
    pub const COMMITISH: &'static str = "releases";

    /// Publish to `owner/repository` with `credential`, using `ghr` from `PATH`.
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Ghr {
            binary: PathBuf::from("ghr"),
            owner: owner.into(),
            repository: repository.into(),
            commitish: Ghr::COMMITISH.to_owned(),
            credential,
        }
    }

    /// Use the `ghr` executable at `binary`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Create new tags on `commitish`.
    pub fn with_commitish(mut self, commitish: impl Into<String>) -> Self {
        self.commitish = commitish.into();
        self
    }

    /// The `owner/repository` releases go to.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    pub(super) fn args(&self, release: &Release, asset: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-owner",
            self.owner.as_str(),
            "-repository",
            self.repository.as_str(),
            "-token",
            self.credential.expose(),
            "-body",
            release.description(),
            "-commitish",
            self.commitish.as_str(),
            "-replace",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        if release.is_prerelease() {
            args.push("-prerelease".into());
        }
        args.push(release.tag().into());
        args.push(asset.into());
        args
    }
}

impl Transport for Ghr {
    type Error = process::Error;

    fn upload(&self, release: &Release, asset: &Path) -> Result<(), Self::Error> {
        process::run(&self.binary, self.args(release, asset), None)?;
        Ok(())
    }
}
