use crate::path_resolver::{resolve_candidates, SDK_SCOPE};
use crate::version::read_version;
use crate::{ProbeError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::JoinSet;

/// Package name (`@aws-sdk/<name>`) to declared version.
pub type PackageVersions = BTreeMap<String, String>;

/// Search path directory to the packages found under its scope.
pub type DependencyReport = BTreeMap<String, PackageVersions>;

/// Scanner for the packages installed under one scope of a `node_modules` dir
pub struct DependencyScanner {
    root: PathBuf,
    scope: String,
}

impl DependencyScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            scope: SDK_SCOPE.to_string(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn scope_dir(&self) -> PathBuf {
        self.root.join(&self.scope)
    }

    /// List the scope's package directories and read their versions.
    ///
    /// Version reads run concurrently and degrade individually; only a failure
    /// to list the scope directory itself is an error.
    pub async fn scan(&self) -> Result<PackageVersions> {
        let scope_dir = self.scope_dir();
        let scan_error = |source| ProbeError::ScanError {
            path: scope_dir.clone(),
            source,
        };

        let mut entries = fs::read_dir(&scope_dir).await.map_err(scan_error)?;
        let mut join = JoinSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(scan_error)? {
            let Ok(name) = entry.file_name().into_string() else {
                log::debug!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if Self::is_hidden(&name) {
                log::debug!("Skipping hidden entry {}", entry.path().display());
                continue;
            }
            if !Self::is_directory(&entry).await {
                continue;
            }

            let package = format!("{}/{}", self.scope, name);
            let path = entry.path();
            join.spawn(async move {
                let version = read_version(&path).await;
                (package, version)
            });
        }

        let mut packages = PackageVersions::new();
        while let Some(joined) = join.join_next().await {
            match joined {
                Ok((package, version)) => {
                    packages.insert(package, version);
                }
                Err(err) => log::warn!("Version probe task failed: {err}"),
            }
        }

        log::debug!(
            "Found {} packages under {}",
            packages.len(),
            scope_dir.display()
        );
        Ok(packages)
    }

    /// Dot-prefixed entries are tooling and cache artifacts.
    fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    /// Directories, including symlinks that resolve to one.
    async fn is_directory(entry: &fs::DirEntry) -> bool {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => true,
            Ok(file_type) if file_type.is_symlink() => fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false),
            Ok(_) => false,
            Err(err) => {
                log::debug!("Skipping unreadable entry {}: {err}", entry.path().display());
                false
            }
        }
    }
}

/// Resolve candidates on `search_path` and scan each one concurrently.
///
/// A candidate whose scope cannot be listed is logged and left out; the
/// remaining candidates are still reported.
pub async fn scan_search_path(search_path: &str) -> DependencyReport {
    scan_candidates(resolve_candidates(search_path).await).await
}

async fn scan_candidates(candidates: Vec<PathBuf>) -> DependencyReport {
    let mut join = JoinSet::new();
    for dir in candidates {
        join.spawn(async move {
            let scanned = DependencyScanner::new(&dir).scan().await;
            (dir, scanned)
        });
    }
    collect_scans(join).await
}

/// Drain every scan, keeping the ones that succeeded.
async fn collect_scans(mut join: JoinSet<(PathBuf, Result<PackageVersions>)>) -> DependencyReport {
    let mut report = DependencyReport::new();
    while let Some(joined) = join.join_next().await {
        match joined {
            Ok((dir, Ok(packages))) => {
                report.insert(dir.to_string_lossy().into_owned(), packages);
            }
            Ok((dir, Err(err))) => {
                log::warn!("Skipping {}: {err}", dir.display());
            }
            Err(err) => log::warn!("Scan task failed: {err}"),
        }
    }
    report
}
