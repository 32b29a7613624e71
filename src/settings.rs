use std::path::Path;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, Map};
use serde::Deserialize;

use crate::extract::{DEFAULT_MAX_CONTEXTS, DEFAULT_MAX_RESULTS};

const DEFAULT_CONFIG_NAME: &str = "mint_scout";
const ENV_PREFIX: &str = "MINT_SCOUT";
/// Upper bound on batch fan-out.
pub const MAX_CONCURRENCY: usize = 256;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Max in-flight fetches in batch mode.
    pub concurrency: usize,
    pub max_results: usize,
    pub max_contexts: usize,
    /// Replaces the built-in denylist when set.
    pub denylist: Option<Vec<String>>,
    pub extra_denylist: Vec<String>,
    pub extra_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            concurrency: 8,
            max_results: DEFAULT_MAX_RESULTS,
            max_contexts: DEFAULT_MAX_CONTEXTS,
            denylist: None,
            extra_denylist: Vec::new(),
            extra_keywords: Vec::new(),
        }
    }
}

impl Settings {
    /// Defaults, then `path` (or an optional `mint_scout.toml` in the working
    /// directory), then `MINT_SCOUT_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Settings::load_with_env(path, None)
    }

    /// Like `load`, but reads the `MINT_SCOUT_*` layer from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("denylist")
                    .with_list_parse_key("extra_denylist")
                    .with_list_parse_key("extra_keywords")
                    .source(env),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be > 0");
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            bail!("concurrency must be between 1 and {}", MAX_CONCURRENCY);
        }
        if self.max_results == 0 {
            bail!("max_results must be > 0");
        }
        Ok(())
    }
}
