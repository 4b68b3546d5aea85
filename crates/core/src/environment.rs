use std::collections::BTreeMap;

/// Variable holding the colon-separated module search path.
pub const SEARCH_PATH_VAR: &str = "NODE_PATH";

/// Snapshot of process environment variables, keyed by name.
pub type EnvironmentMap = BTreeMap<String, String>;

/// Capture the current process environment.
///
/// Entries whose name or value is not valid UTF-8 are skipped.
pub fn snapshot_process_env() -> EnvironmentMap {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Runtime settings read once per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub node_env: Option<String>,
    pub stage: Option<String>,
    pub aws_region: Option<String>,
}

impl Settings {
    pub fn from_env(env: &EnvironmentMap) -> Self {
        let read = |key: &str| {
            env.get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            node_env: read("NODE_ENV"),
            stage: read("STAGE"),
            aws_region: read("AWS_REGION"),
        }
    }
}

/// Search path recorded in the snapshot, or the empty string.
pub fn search_path(env: &EnvironmentMap) -> &str {
    env.get(SEARCH_PATH_VAR).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env_of(pairs: &[(&str, &str)]) -> EnvironmentMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn settings_ignore_blank_values() {
        let env = env_of(&[
            ("NODE_ENV", "production"),
            ("STAGE", "  "),
            ("AWS_REGION", "ap-northeast-2"),
        ]);
        let settings = Settings::from_env(&env);
        assert_eq!(
            settings,
            Settings {
                node_env: Some("production".to_string()),
                stage: None,
                aws_region: Some("ap-northeast-2".to_string()),
            }
        );
    }

    #[test]
    fn search_path_defaults_to_empty() {
        assert_eq!(search_path(&EnvironmentMap::new()), "");
        let env = env_of(&[(SEARCH_PATH_VAR, "/opt/nodejs/node_modules:/var/task")]);
        assert_eq!(search_path(&env), "/opt/nodejs/node_modules:/var/task");
    }
}
