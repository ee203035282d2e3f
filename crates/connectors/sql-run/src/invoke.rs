//! Reading a single event for the `invoke` command.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};

/// The event bytes from `path`, or everything `stdin` yields when there is no path.
pub async fn read_event(
    path: Option<&Path>,
    mut stdin: impl AsyncRead + Unpin,
) -> std::io::Result<Vec<u8>> {
    match path {
        Some(path) => tokio::fs::read(path).await,
        None => {
            let mut input = vec![];
            stdin.read_to_end(&mut input).await?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_stdin_without_a_path() {
        let input = read_event(None, &br#"{"RequestType":"Create"}"#[..])
            .await
            .unwrap();

        assert_eq!(input, br#"{"RequestType":"Create"}"#);
    }

    #[tokio::test]
    async fn prefers_the_event_file() {
        let path =
            std::env::temp_dir().join(format!("sql-run-event-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"{}").await.unwrap();

        let input = read_event(Some(&path), &b"ignored"[..]).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(input.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn missing_files_are_errors() {
        let path = std::env::temp_dir().join("sql-run-no-such-event.json");

        let err = read_event(Some(&path), &b""[..]).await.unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
