// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use kbsearch_app::{PageConfig, SearchVariant};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT: &str = "30s";
const DEFAULT_STREAM_TIMEOUT: &str = "5m";
const DEFAULT_SOURCE_NAME: &str = "Result";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            search: Search::default(),
            storage: Storage::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub search_url: Option<String>,
    pub summarize_url: Option<String>,
    pub timeout: Option<String>,
    pub stream_timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
    pub variant: Option<String>,
    pub source_name: Option<String>,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            variant: Some(SearchVariant::Minimal.as_str().to_owned()),
            source_name: Some(DEFAULT_SOURCE_NAME.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("KBSEARCH_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set KBSEARCH_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(kbsearch_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and keep values under [api], [search], [storage], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `kbsearch --print-example-config` for the current layout",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (key, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.search_url", &self.api.search_url),
            ("api.summarize_url", &self.api.summarize_url),
        ] {
            if let Some(url) = value
                && url.trim().is_empty()
            {
                bail!("{key} in {} must not be empty", path.display());
            }
        }

        for (key, value) in [
            ("api.timeout", &self.api.timeout),
            ("api.stream_timeout", &self.api.stream_timeout),
        ] {
            if let Some(raw) = value {
                let parsed = parse_duration(raw)?;
                if parsed <= Duration::ZERO {
                    bail!("{key} in {} must be positive, got {raw}", path.display());
                }
            }
        }

        if let Some(variant) = &self.search.variant
            && SearchVariant::parse(variant).is_none()
        {
            bail!(
                "search.variant in {} must be \"minimal\" or \"extended\", got {variant:?}",
                path.display()
            );
        }

        if let Some(db_path) = &self.storage.db_path {
            kbsearch_db::validate_db_path(db_path)?;
        }

        if let Some(level) = &self.log.level
            && level.trim().is_empty()
        {
            bail!("log.level in {} must not be empty", path.display());
        }

        Ok(())
    }

    /// Base URL with trailing slashes removed. `KBSEARCH_API_URL` applies
    /// when the file leaves `[api].base_url` unset.
    pub fn api_base_url(&self) -> String {
        let raw = match &self.api.base_url {
            Some(url) => url.clone(),
            None => env::var("KBSEARCH_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        };
        raw.trim().trim_end_matches('/').to_owned()
    }

    pub fn search_url(&self) -> String {
        match &self.api.search_url {
            Some(url) => url.trim().trim_end_matches('/').to_owned(),
            None => format!("{}/smart_search", self.api_base_url()),
        }
    }

    pub fn summarize_url(&self) -> String {
        if let Some(url) = &self.api.summarize_url {
            return url.trim().trim_end_matches('/').to_owned();
        }
        match env::var("KBSEARCH_SUMMARIZE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_owned(),
            _ => format!("{}/summarize", self.api_base_url()),
        }
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn stream_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.api
                .stream_timeout
                .as_deref()
                .unwrap_or(DEFAULT_STREAM_TIMEOUT),
        )
    }

    pub fn variant(&self) -> SearchVariant {
        self.search
            .variant
            .as_deref()
            .and_then(SearchVariant::parse)
            .unwrap_or(SearchVariant::Minimal)
    }

    pub fn page_config(&self) -> PageConfig {
        PageConfig {
            variant: self.variant(),
            source_name: self
                .search
                .source_name
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_owned()),
        }
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => kbsearch_db::default_db_path(),
        }
    }

    /// Filter directive for the log file. `KBSEARCH_LOG` wins over the file.
    pub fn log_level(&self) -> String {
        match env::var("KBSEARCH_LOG") {
            Ok(level) if !level.trim().is_empty() => level,
            _ => self
                .log
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned()),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path to a writable file")
        })?;
        let app_dir = data_root.join(kbsearch_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create data directory {}", app_dir.display()))?;
        Ok(app_dir.join("kbsearch.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# kbsearch config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\n# search_url = \"{}/smart_search\"\n# summarize_url = \"{}/summarize\"\ntimeout = \"{}\"\nstream_timeout = \"{}\"\n\n[search]\n# \"minimal\" or \"extended\" (asks for a manufacturing process number)\nvariant = \"minimal\"\nsource_name = \"{}\"\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/kbsearch/kbsearch.db)\n# db_path = \"/absolute/path/to/kbsearch.db\"\n\n[log]\nlevel = \"{}\"\n# path = \"/absolute/path/to/kbsearch.log\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_API_BASE_URL,
            DEFAULT_API_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_STREAM_TIMEOUT,
            DEFAULT_SOURCE_NAME,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
