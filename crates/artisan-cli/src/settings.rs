//! Runtime configuration, deserialised from `config.toml` layered under
//! `ARTISAN_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `ARTISAN_BLIZZARD__CLIENT_SECRET` sets `blizzard.client_secret`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;

use artisan_blizzard::{BackoffPolicy, BlizzardConfig};
use artisan_sync::SyncConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default)]
  pub blizzard:   BlizzardSection,
  #[serde(default)]
  pub sync:       SyncSection,
}

fn default_store_path() -> PathBuf { PathBuf::from("artisan.db") }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }

/// `[blizzard]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlizzardSection {
  pub region:        String,
  pub locale:        String,
  pub client_id:     String,
  pub client_secret: String,
  pub realm:         String,
  pub guild:         String,
  pub timeout_secs:  u64,
  pub max_retries:   usize,
  pub oauth_base:    Option<String>,
  pub api_base:      Option<String>,
}

impl Default for BlizzardSection {
  fn default() -> Self {
    Self {
      region:        "us".into(),
      locale:        "en_US".into(),
      client_id:     String::new(),
      client_secret: String::new(),
      realm:         String::new(),
      guild:         String::new(),
      timeout_secs:  20,
      max_retries:   3,
      oauth_base:    None,
      api_base:      None,
    }
  }
}

/// `[sync]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSection {
  pub batch_size:            usize,
  pub resolve_crafted_items: bool,
  pub bootstrap_catalog:     bool,
}

impl Default for SyncSection {
  fn default() -> Self {
    let defaults = SyncConfig::default();
    Self {
      batch_size:            defaults.batch_size,
      resolve_crafted_items: defaults.resolve_crafted_items,
      bootstrap_catalog:     defaults.bootstrap_catalog,
    }
  }
}

impl AppConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ARTISAN")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut cfg: AppConfig = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn blizzard_config(&self) -> BlizzardConfig {
    let b = &self.blizzard;
    BlizzardConfig {
      region:        b.region.clone(),
      locale:        b.locale.clone(),
      client_id:     b.client_id.clone(),
      client_secret: b.client_secret.clone(),
      realm:         b.realm.clone(),
      guild:         b.guild.clone(),
      timeout:       Duration::from_secs(b.timeout_secs),
      backoff:       BackoffPolicy { max_retries: b.max_retries, ..BackoffPolicy::default() },
      oauth_base:    b.oauth_base.clone(),
      api_base:      b.api_base.clone(),
    }
  }

  pub fn sync_config(&self) -> SyncConfig {
    SyncConfig {
      batch_size:            self.sync.batch_size.max(1),
      resolve_crafted_items: self.sync.resolve_crafted_items,
      bootstrap_catalog:     self.sync.bootstrap_catalog,
      locale:                self.blizzard.locale.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
