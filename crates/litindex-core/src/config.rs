use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::batch::DEFAULT_MAX_SKIP_REASONS;
use crate::normalize::DEFAULT_DELIMITER;
use crate::schema::SchemaVariant;

/// Smallest writer heap tantivy accepts for a single indexing thread.
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub delimiter: String,
    pub writer_heap_bytes: usize,
    pub max_skip_reasons: usize,
    pub schema: SchemaVariant,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            writer_heap_bytes: 50_000_000,
            max_skip_reasons: DEFAULT_MAX_SKIP_REASONS,
            schema: SchemaVariant::default(),
        }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load `config.toml` and `config.<env>.toml` from the working directory.
    pub fn load() -> anyhow::Result<Self> { Self::load_from(Path::new(".")) }

    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::default("indexer", IndexerSettings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.indexer()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn indexer(&self) -> anyhow::Result<IndexerSettings> {
        let settings: IndexerSettings = self.get("indexer")?;
        if settings.delimiter.is_empty() {
            anyhow::bail!("indexer.delimiter must not be empty");
        }
        if settings.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            anyhow::bail!("indexer.writer_heap_bytes must be at least {}", MIN_WRITER_HEAP_BYTES);
        }
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
