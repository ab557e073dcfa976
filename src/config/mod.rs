// src/config/mod.rs
//! Application configuration: `config/app.toml` (or `$APP_CONFIG_PATH`) plus
//! env overrides. Every field has a default, so a missing file is fine.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

const ENV_PATH: &str = "APP_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub registry: RegistryConfig,
    pub harvest: HarvestConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
    /// Create missing indices at startup.
    pub provision_on_start: bool,
    /// Delete and recreate every index at startup, then run a full harvest.
    pub wipe_on_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".into(),
            username: None,
            password: None,
            request_timeout_secs: 10,
            provision_on_start: true,
            wipe_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/sources.toml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub enabled: bool,
    pub batch_size: u64,
    /// Trailing window for incremental runs.
    pub fresh_window_mins: u64,
    pub fetch_timeout_secs: u64,
    pub store_timeout_secs: u64,
    pub interval_secs: u64,
    pub full_on_start: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 8,
            fresh_window_mins: 20,
            fetch_timeout_secs: 15,
            store_timeout_secs: 5,
            interval_secs: 600,
            full_on_start: false,
        }
    }
}

impl HarvestConfig {
    pub fn fresh_window(&self) -> Duration {
        Duration::from_secs(self.fresh_window_mins.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_page_size: 10_000,
        }
    }
}

/// What the binary does to the store and the scheduler before serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupPlan {
    pub provision: bool,
    pub wipe: bool,
    pub full_harvest: bool,
}

impl AppConfig {
    /// A wipe implies provisioning and a full pass to refill the indices.
    pub fn startup_plan(&self) -> StartupPlan {
        let wipe = self.store.wipe_on_start;
        StartupPlan {
            provision: self.store.provision_on_start || wipe,
            wipe,
            full_harvest: self.harvest.full_on_start || wipe,
        }
    }

    /// Parse an explicit file, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Resolution order:
    /// 1) $APP_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("APP_CONFIG_PATH points to non-existent path"));
        }
        let p = PathBuf::from(DEFAULT_PATH);
        if p.exists() {
            return Self::load_from(&p);
        }
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = non_empty_env("ELASTIC_URL") {
            self.store.url = v;
        }
        if let Some(v) = non_empty_env("ELASTIC_USERNAME") {
            self.store.username = Some(v);
        }
        if let Some(v) = non_empty_env("ELASTIC_PASSWORD") {
            self.store.password = Some(v);
        }
        if let Some(v) = non_empty_env("HARVEST_BATCH_SIZE") {
            self.harvest.batch_size = v
                .parse()
                .with_context(|| format!("HARVEST_BATCH_SIZE is not a number: {v}"))?;
        }
        if let Some(v) = non_empty_env("HARVEST_FRESH_WINDOW_MINS") {
            self.harvest.fresh_window_mins = v
                .parse()
                .with_context(|| format!("HARVEST_FRESH_WINDOW_MINS is not a number: {v}"))?;
        }
        if self.harvest.batch_size == 0 {
            return Err(anyhow!("harvest.batch_size must be at least 1"));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
