//! # GitHub Helpers
//!
//! Credential lookup for release uploads and the commit date lookup used to describe a
//! release.
#[cfg(test)]
mod tests;

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// The environment variable a token is read from when none is given explicitly.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// An error talking to the GitHub API.
#[derive(Error, Debug)]
pub enum Error {
    /// A transparent wrapper for a [`reqwest::Error`]
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// An API token. Its `Debug` representation never includes the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap `token`, unless it is blank.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        (!trimmed.is_empty()).then(|| Credential(trimmed.to_owned()))
    }

    /// The raw token, for handing to the transport.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The credential to publish with: `explicit` if given, else the [`TOKEN_ENV`] variable.
pub fn credential(explicit: Option<String>) -> Option<Credential> {
    credential_from(explicit, std::env::var(TOKEN_ENV).ok())
}

fn credential_from(explicit: Option<String>, env: Option<String>) -> Option<Credential> {
    explicit
        .and_then(Credential::new)
        .or_else(|| env.and_then(Credential::new))
}

/// Render the calendar date of `date` the way release descriptions show it, e.g.
/// `2024-03-01`.
pub fn iso8601(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Deserialize)]
struct CommitResponse {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Signature,
}

#[derive(Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

/// A minimal GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: reqwest::Client,
    api: String,
    credential: Option<Credential>,
}

impl GitHub {
    /// A client for the API rooted at `api`, authenticating with `credential` if given.
    pub fn new(api: impl Into<String>, credential: Option<Credential>) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(GitHub {
            client,
            api: api.into().trim_end_matches('/').to_owned(),
            credential,
        })
    }

    fn commit_url(&self, repo: &str, commit: &str) -> String {
        format!("{}/repos/{repo}/commits/{commit}", self.api)
    }

    /// The committer date of `commit` in `repo` (`owner/name`).
    ///
    /// Returns `None` when the repository or commit is unknown to the API.
    #[tracing::instrument(skip(self), err)]
    pub async fn commit_date(
        &self,
        repo: &str,
        commit: &str,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        let mut request = self
            .client
            .get(self.commit_url(repo, commit))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(credential) = &self.credential {
            request = request.bearer_auth(credential.expose());
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::debug!(status = %response.status(), "commit not found");
                return Ok(None);
            },
            _ => (),
        }

        let body: CommitResponse = response.error_for_status()?.json().await?;
        Ok(Some(body.commit.committer.date))
    }
}
