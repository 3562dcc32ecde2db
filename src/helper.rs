//! Helper functions allowing you to avoid writing boilerplate code for common operations, such as
//! parsing JSON or reading files.

// Copyright (c) 2016 Google Inc (lewinb@google.com).
//
// Refer to the project root for licensing information.
use crate::types::{ApplicationSecret, ConsoleApplicationSecret};

use std::io;
use std::path::Path;

/// Read an application secret from a file.
pub async fn read_application_secret<P: AsRef<Path>>(path: P) -> io::Result<ApplicationSecret> {
    let path = path.as_ref();
    let secret = tokio::fs::read(path)
        .await
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
    parse_application_secret(secret)
}

/// Read an application secret from a JSON string.
///
/// Both the `installed` and the `web` shape of the developer console file are accepted;
/// `installed` wins when both are present.
pub fn parse_application_secret<S: AsRef<[u8]>>(secret: S) -> io::Result<ApplicationSecret> {
    let decoded: ConsoleApplicationSecret =
        serde_json::from_slice(secret.as_ref()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Bad application secret: {}", e),
            )
        })?;

    decoded.installed.or(decoded.web).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "Unknown application secret format",
        )
    })
}

pub(crate) fn join<T>(pieces: &[T], separator: &str) -> String
where
    T: AsRef<str>,
{
    let mut iter = pieces.iter();
    let first = match iter.next() {
        Some(p) => p,
        None => return String::new(),
    };
    let num_separators = pieces.len() - 1;
    let pieces_size: usize = pieces.iter().map(|p| p.as_ref().len()).sum();
    let size = pieces_size + separator.len() * num_separators;
    let mut result = String::with_capacity(size);
    result.push_str(first.as_ref());
    for p in iter {
        result.push_str(separator);
        result.push_str(p.as_ref());
    }
    debug_assert_eq!(size, result.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::SECRET;

    #[test]
    fn test_parse_installed_secret() {
        let secret = parse_application_secret(SECRET).unwrap();
        assert_eq!(
            secret.client_id,
            "384276011093-q2rk8d0c2cmq5l7vbsgq4hf1fkbmnd0e.apps.googleusercontent.com"
        );
        assert_eq!(secret.redirect_uris[0], "urn:ietf:wg:oauth:2.0:oob");
    }

    #[test]
    fn test_parse_web_secret() {
        let secret = parse_application_secret(
            r#"{"web": {"client_id": "web-id", "client_secret": "s",
                "auth_uri": "https://a", "token_uri": "https://t"}}"#,
        )
        .unwrap();
        assert_eq!(secret.client_id, "web-id");
        assert!(secret.redirect_uris.is_empty());
    }

    #[test]
    fn test_parse_unknown_secret() {
        let err = parse_application_secret(r#"{"other": {}}"#).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = parse_application_secret("not json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_missing_secret() {
        let tempdir = tempfile::tempdir().unwrap();
        let err = read_application_secret(tempdir.path().join(".client_secret.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_join() {
        assert_eq!(join::<&str>(&[], " "), "");
        assert_eq!(join(&["a"], " "), "a");
        assert_eq!(join(&["a", "b", "c"], ", "), "a, b, c");
    }
}
