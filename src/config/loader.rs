//! Loaders for the plain-text configuration files

use super::{ConfigError, DEFAULT_CHUNK_SIZE, Provider};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locations of the configuration files
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// `key=value` settings
    pub config: PathBuf,
    /// One URL per line
    pub urls: PathBuf,
    /// One field name per line
    pub fields: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            config: PathBuf::from("config.txt"),
            urls: PathBuf::from("urls.txt"),
            fields: PathBuf::from("fields.txt"),
        }
    }
}

/// Settings read from `config.txt`
#[derive(Debug, Clone, PartialEq)]
pub struct FileSettings {
    /// Selected provider
    pub provider: Provider,
    /// Together credential
    pub together_api_key: String,
    /// Groq credential
    pub groq_api_key: String,
    /// Chunk budget
    pub chunk_size: usize,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Together,
            together_api_key: String::new(),
            groq_api_key: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FileSettings {
    /// Interpret parsed `key=value` pairs.
    ///
    /// Unknown providers and unparsable chunk sizes fall back to defaults.
    /// Empty credentials are looked up through `env`.
    pub fn from_pairs<F>(pairs: &HashMap<String, String>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match pairs.get("api_provider") {
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("{}, using {}", e, Provider::Together);
                Provider::Together
            }),
            None => Provider::Together,
        };

        let chunk_size = match pairs.get("chunk_size") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid chunk_size '{}', using {}", raw, DEFAULT_CHUNK_SIZE);
                DEFAULT_CHUNK_SIZE
            }),
            None => DEFAULT_CHUNK_SIZE,
        };

        let key = |provider: Provider| {
            pairs
                .get(provider.config_key())
                .filter(|k| !k.is_empty())
                .cloned()
                .or_else(|| env(provider.api_key_env()))
                .unwrap_or_default()
        };

        Self {
            provider,
            together_api_key: key(Provider::Together),
            groq_api_key: key(Provider::Groq),
            chunk_size,
        }
    }
}

/// Parse `key=value` lines. Lines without `=` are ignored and only the first
/// `=` splits, so values may contain `=`.
pub fn parse_key_values(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.trim().split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Load `config.txt`, falling back to defaults when it does not exist
pub async fn load_config_file(path: &Path) -> Result<FileSettings, ConfigError> {
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!("Loaded settings from {}", path.display());
            Ok(FileSettings::from_pairs(&parse_key_values(&text), env))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Config file {} not found. Using default values.", path.display());
            Ok(FileSettings::from_pairs(&HashMap::new(), env))
        }
        Err(source) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Read a one-entry-per-line list, skipping blank lines.
///
/// A missing file yields an empty list so the caller can report it.
pub async fn read_list(path: &Path, label: &str) -> Result<Vec<String>, ConfigError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} file {} not found.", label, path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(ConfigError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_key_values() {
        let pairs = parse_key_values(
            "api_provider = Groq\n# comment without separator\ngroq_api_key=abc=def\n\n",
        );

        assert_eq!(pairs.get("api_provider").unwrap(), "Groq");
        assert_eq!(pairs.get("groq_api_key").unwrap(), "abc=def");
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_file_settings() {
        let pairs = parse_key_values("api_provider=groq\ngroq_api_key=g\nchunk_size=1200");
        let settings = FileSettings::from_pairs(&pairs, no_env);

        assert_eq!(settings.provider, Provider::Groq);
        assert_eq!(settings.groq_api_key, "g");
        assert_eq!(settings.together_api_key, "");
        assert_eq!(settings.chunk_size, 1200);
    }

    #[test]
    fn test_file_settings_fallbacks() {
        let pairs = parse_key_values("api_provider=mystery\nchunk_size=lots");
        let settings = FileSettings::from_pairs(&pairs, |name| {
            (name == "TOGETHER_API_KEY").then(|| "from-env".to_string())
        });

        assert_eq!(settings.provider, Provider::Together);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.together_api_key, "from-env");
    }

    #[tokio::test]
    async fn test_missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let urls = read_list(&dir.path().join("urls.txt"), "URLs").await.unwrap();
        assert!(urls.is_empty());

        let settings = load_config_file(&dir.path().join("config.txt"))
            .await
            .unwrap();
        assert_eq!(settings.provider, Provider::Together);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn test_read_list_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.txt");
        tokio::fs::write(&path, "name\n\n  price  \n\t\naddress\n")
            .await
            .unwrap();

        let fields = read_list(&path, "fields").await.unwrap();
        assert_eq!(fields, vec!["name", "price", "address"]);
    }
}
