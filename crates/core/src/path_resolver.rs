use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;

pub const SEARCH_PATH_SEPARATOR: char = ':';
pub const MODULES_DIR_NAME: &str = "node_modules";
/// Package scope whose contents are reported.
pub const SDK_SCOPE: &str = "@aws-sdk";

/// Why a search path entry is not worth scanning.
#[derive(Error, Debug)]
pub enum CandidateRejection {
    #[error("{} does not end with node_modules", path.display())]
    NotModulesDir { path: PathBuf },

    #[error("{}/@aws-sdk is not a directory", path.display())]
    ScopeNotDirectory { path: PathBuf },

    #[error("stat {}/@aws-sdk: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Check that `dir` is a `node_modules` directory with an `@aws-sdk` scope.
pub async fn validate_candidate(dir: &Path) -> Result<(), CandidateRejection> {
    if !dir.ends_with(MODULES_DIR_NAME) {
        return Err(CandidateRejection::NotModulesDir {
            path: dir.to_path_buf(),
        });
    }

    let metadata = tokio::fs::metadata(dir.join(SDK_SCOPE))
        .await
        .map_err(|source| CandidateRejection::Stat {
            path: dir.to_path_buf(),
            source,
        })?;
    if !metadata.is_dir() {
        return Err(CandidateRejection::ScopeNotDirectory {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Filter a colon-separated search path down to directories worth scanning.
///
/// Entries are validated concurrently; the result keeps input order.
pub async fn resolve_candidates(search_path: &str) -> Vec<PathBuf> {
    let mut join = JoinSet::new();
    for (idx, token) in search_path.split(SEARCH_PATH_SEPARATOR).enumerate() {
        let dir = PathBuf::from(token);
        join.spawn(async move {
            let verdict = validate_candidate(&dir).await;
            (idx, dir, verdict)
        });
    }

    let mut accepted = Vec::new();
    while let Some(joined) = join.join_next().await {
        match joined {
            Ok((idx, dir, Ok(()))) => accepted.push((idx, dir)),
            Ok((_, _, Err(rejection))) => log::debug!("Skipping search path entry: {rejection}"),
            Err(err) => log::warn!("Search path validation task failed: {err}"),
        }
    }
    accepted.sort_by_key(|(idx, _)| *idx);

    let candidates: Vec<PathBuf> = accepted.into_iter().map(|(_, dir)| dir).collect();
    log::debug!("Resolved {} candidate module directories", candidates.len());
    candidates
}
