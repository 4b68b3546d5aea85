use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Reported when a package's version cannot be determined.
pub const UNKNOWN_VERSION: &str = "<UNKNOWN>";
pub const MANIFEST_FILE: &str = "package.json";

#[derive(Error, Debug)]
enum ManifestError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} has no string \"version\" field", path.display())]
    MissingVersion { path: PathBuf },
}

async fn read_manifest_version(dir: &Path) -> Result<String, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = fs::read(&path).await.map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;
    let manifest: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| ManifestError::Parse {
            path: path.clone(),
            source,
        })?;
    manifest
        .get("version")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or(ManifestError::MissingVersion { path })
}

/// Declared version of the package rooted at `dir`, or [`UNKNOWN_VERSION`].
pub async fn read_version(dir: &Path) -> String {
    match read_manifest_version(dir).await {
        Ok(version) => version,
        Err(err) => {
            log::debug!("Version unknown: {err}");
            UNKNOWN_VERSION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_declared_version() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            br#"{"name":"@aws-sdk/client-s3","version":"3.1.0"}"#,
        )
        .unwrap();
        assert_eq!(read_version(temp.path()).await, "3.1.0");
    }

    #[tokio::test]
    async fn missing_manifest_is_unknown() {
        let temp = tempdir().unwrap();
        assert_eq!(read_version(temp.path()).await, UNKNOWN_VERSION);
    }

    #[tokio::test]
    async fn missing_directory_is_unknown() {
        let temp = tempdir().unwrap();
        assert_eq!(
            read_version(&temp.path().join("gone")).await,
            UNKNOWN_VERSION
        );
    }

    #[tokio::test]
    async fn corrupt_manifest_is_unknown() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), b"{ not json").unwrap();
        assert_eq!(read_version(temp.path()).await, UNKNOWN_VERSION);
    }

    #[tokio::test]
    async fn non_string_version_is_unknown() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), br#"{"version": 3}"#).unwrap();
        assert_eq!(read_version(temp.path()).await, UNKNOWN_VERSION);

        fs::write(temp.path().join(MANIFEST_FILE), br#"{"name": "x"}"#).unwrap();
        assert_eq!(read_version(temp.path()).await, UNKNOWN_VERSION);
    }
}
