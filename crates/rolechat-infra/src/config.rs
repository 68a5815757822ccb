//! Configuration loader for rolechat.
//!
//! Reads `config.toml` from the data directory (`~/.rolechat/` by default) or
//! an explicit path and deserializes it into [`AppConfig`]. Falls back to
//! defaults when the file is missing or malformed. Environment variables are
//! applied on top.
//!
//! Loading runs before the tracing subscriber exists, so problems are
//! collected in [`LoadedConfig::warnings`] for the caller to log.

use std::path::{Path, PathBuf};

use rolechat_types::config::AppConfig;

/// A loaded configuration plus the problems found while loading it.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Emit every collected warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }
    }
}

/// Load configuration from `path`, or `{data_dir}/config.toml` when `path` is `None`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, records a warning and returns the default.
pub async fn load_config(data_dir: &Path, path: Option<&Path>) -> LoadedConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| data_dir.join("config.toml"));

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return LoadedConfig::default();
        }
        Err(err) => {
            return LoadedConfig {
                config: AppConfig::default(),
                warnings: vec![format!(
                    "Failed to read {}: {err}, using defaults",
                    config_path.display()
                )],
            };
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => LoadedConfig {
            config,
            warnings: Vec::new(),
        },
        Err(err) => LoadedConfig {
            config: AppConfig::default(),
            warnings: vec![format!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            )],
        },
    }
}

/// Apply environment overrides. `lookup` is `std::env::var` in production.
///
/// Recognized: `HOST`, `PORT`, `LETTA_BASE_URL`, `LETTA_API_KEY`,
/// `DATABASE_URL`, `DB_NAME`, `ROLECHAT_STORAGE`, `ROLECHAT_WEB_DIR`.
/// Unparseable values are ignored and returned as warnings.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut warnings = Vec::new();

    if let Some(host) = get("HOST") {
        config.server.host = host;
    }
    if let Some(port) = get("PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warnings.push(format!("Ignoring PORT={port}: {e}")),
        }
    }
    if let Some(url) = get("LETTA_BASE_URL") {
        config.upstream.base_url = url;
    }
    if let Some(key) = get("LETTA_API_KEY") {
        config.upstream.api_key = Some(key);
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(name) = get("DB_NAME") {
        config.database.name = name;
    }
    if let Some(backend) = get("ROLECHAT_STORAGE") {
        match backend.parse() {
            Ok(backend) => config.storage.backend = backend,
            Err(e) => warnings.push(format!("Ignoring ROLECHAT_STORAGE: {e}")),
        }
    }
    if let Some(dir) = get("ROLECHAT_WEB_DIR") {
        config.server.web_dir = Some(dir);
    }
    warnings
}

/// Load the file config and apply `lookup` as the environment.
pub async fn load_app_config_with(
    data_dir: &Path,
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> LoadedConfig {
    let mut loaded = load_config(data_dir, path).await;
    let env_warnings = apply_env_overrides(&mut loaded.config, lookup);
    loaded.warnings.extend(env_warnings);
    loaded
}

/// Load the file config and apply the process environment.
pub async fn load_app_config(data_dir: &Path, path: Option<&Path>) -> LoadedConfig {
    load_app_config_with(data_dir, path, |key| std::env::var(key).ok()).await
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `ROLECHAT_DATA_DIR`
/// 2. `~/.rolechat`
/// 3. `./.rolechat`
pub fn resolve_data_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup("ROLECHAT_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".rolechat");
    }

    PathBuf::from(".rolechat")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rolechat_types::config::StorageBackend;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_config(tmp.path(), None).await;
        assert_eq!(loaded.config.server.port, 3001);
        assert_eq!(loaded.config.storage.backend, StorageBackend::Sqlite);
        assert!(loaded.warnings.is_empty());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "[server]\nport = 9000\n\n[chat]\nserialize_turns = false\n",
        )
        .await
        .unwrap();

        let config = load_config(tmp.path(), None).await.config;
        assert_eq!(config.server.port, 9000);
        assert!(!config.chat.serialize_turns);
    }

    #[tokio::test]
    async fn load_config_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let custom = tmp.path().join("custom.toml");
        tokio::fs::write(&custom, "[server]\nhost = \"127.0.0.1\"\n").await.unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "[server]\nhost = \"10.0.0.1\"\n")
            .await
            .unwrap();

        let config = load_config(tmp.path(), Some(&custom)).await.config;
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is [[[ not valid")
            .await
            .unwrap();

        let loaded = load_config(tmp.path(), None).await;
        assert_eq!(loaded.config.server.port, 3001);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Failed to parse"));
        assert!(loaded.warnings[0].contains("config.toml"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        let warnings = apply_env_overrides(
            &mut config,
            env(&[
                ("HOST", "127.0.0.1"),
                ("PORT", "8088"),
                ("LETTA_BASE_URL", "http://localhost:8283"),
                ("LETTA_API_KEY", "sk-env"),
                ("DB_NAME", "chat"),
                ("ROLECHAT_STORAGE", "memory"),
                ("ROLECHAT_WEB_DIR", "web/dist"),
            ]),
        );

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.upstream.base_url, "http://localhost:8283");
        assert_eq!(config.upstream.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.database.name, "chat");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.web_dir.as_deref(), Some("web/dist"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn env_overrides_ignore_bad_and_empty_values() {
        let mut config = AppConfig::default();
        let warnings = apply_env_overrides(
            &mut config,
            env(&[("PORT", "not-a-port"), ("ROLECHAT_STORAGE", "mysql"), ("HOST", "  ")]),
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].starts_with("Ignoring PORT=not-a-port"));
        assert!(warnings[1].starts_with("Ignoring ROLECHAT_STORAGE"));
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[tokio::test]
    async fn load_app_config_collects_file_and_env_warnings() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is = = not toml")
            .await
            .unwrap();

        let loaded = load_app_config_with(
            tmp.path(),
            None,
            env(&[("PORT", "notaport"), ("ROLECHAT_STORAGE", "memory")]),
        )
        .await;

        assert_eq!(loaded.config.storage.backend, StorageBackend::Memory);
        assert_eq!(loaded.config.server.port, 3001);
        assert_eq!(loaded.warnings.len(), 2);
        assert!(loaded.warnings[0].starts_with("Failed to parse"));
        assert!(loaded.warnings[1].starts_with("Ignoring PORT=notaport"));
    }

    #[test]
    fn data_dir_prefers_env() {
        let dir = resolve_data_dir(env(&[("ROLECHAT_DATA_DIR", "/srv/rolechat")]));
        assert_eq!(dir, PathBuf::from("/srv/rolechat"));

        let fallback = resolve_data_dir(env(&[]));
        assert!(fallback.ends_with(".rolechat"));
    }
}
