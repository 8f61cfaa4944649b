use chrono::TimeZone;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;

#[test]
fn explicit_credential_wins() {
    let found = credential_from(Some("explicit".into()), Some("env".into()));
    assert_eq!(found.as_ref().map(Credential::expose), Some("explicit"));
}

#[test]
fn blank_credentials_are_absent() {
    assert_eq!(credential_from(Some("  ".into()), None), None);
    assert_eq!(credential_from(None, Some(String::new())), None);

    let found = credential_from(Some(String::new()), Some("env".into()));
    assert_eq!(found.as_ref().map(Credential::expose), Some("env"));
}

#[test]
fn credential_debug_is_redacted() {
    let credential = Credential::new("ghp_secret").unwrap();
    let rendered = format!("{credential:?}");
    assert!(!rendered.contains("ghp_secret"));
    insta::assert_snapshot!(rendered, @"Credential(<redacted>)");
}

#[test]
fn dates_render_as_calendar_dates() {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 5).unwrap();
    insta::assert_snapshot!(iso8601(&date), @"2024-03-01");
}

#[test]
fn parses_committer_date() -> Result<(), anyhow::Error> {
    let body = r#"{
        "sha": "abc123",
        "commit": {
            "author": { "name": "a", "date": "2023-01-01T00:00:00Z" },
            "committer": { "name": "c", "date": "2024-03-01T12:30:05Z" }
        }
    }"#;
    let parsed: CommitResponse = serde_json::from_str(body)?;
    assert_eq!(
        parsed.commit.committer.date,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
    );
    Ok(())
}

#[test]
fn commit_url_layout() -> Result<(), anyhow::Error> {
    let github = GitHub::new("https://api.github.com/", None)?;
    assert_eq!(
        github.commit_url("RTimothyEdwards/open_pdks", "abc123"),
        "https://api.github.com/repos/RTimothyEdwards/open_pdks/commits/abc123"
    );
    Ok(())
}

/// Serve a single canned HTTP response on a local port, returning the API root.
async fn serve_once(status: &'static str, body: &'static str) -> Result<String, anyhow::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn commit_date_from_api() -> Result<(), anyhow::Error> {
    let api = serve_once(
        "200 OK",
        r#"{"commit":{"committer":{"date":"2024-03-01T12:30:05Z"}}}"#,
    )
    .await?;
    let github = GitHub::new(api, Credential::new("token"))?;

    let date = github.commit_date("owner/repo", "abc123").await?;
    assert_eq!(date, Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()));
    Ok(())
}

#[tokio::test]
async fn unknown_commit_has_no_date() -> Result<(), anyhow::Error> {
    let api = serve_once("422 Unprocessable Entity", r#"{"message":"No commit found"}"#).await?;
    let github = GitHub::new(api, None)?;

    assert_eq!(github.commit_date("owner/repo", "nope").await?, None);
    Ok(())
}

#[tokio::test]
async fn server_errors_are_returned() -> Result<(), anyhow::Error> {
    let api = serve_once("500 Internal Server Error", "{}").await?;
    let github = GitHub::new(api, None)?;

    assert!(github.commit_date("owner/repo", "abc123").await.is_err());
    Ok(())
}
