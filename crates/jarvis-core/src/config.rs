use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Top-level configuration for Jarvis.
///
/// Loaded from a TOML file; every section falls back to its defaults when
/// omitted. Environment variables can override the tracker settings, see
/// [`JarvisConfig::apply_env_overrides`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JarvisConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

impl JarvisConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. Callers that
    /// want defaults on failure decide themselves, after logging is up.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: JarvisConfig = toml::from_str(&content)?;
        config.tracker.normalize_aliases();
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Override settings from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable never
    /// wipes a configured value.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("JIRA_BASE_URL") {
            self.tracker.base_url = url;
        }
        if let Some(keys) = get("JIRA_PROJECT_KEYS") {
            self.tracker.project_keys = parse_csv(&keys);
        }
        if let Some(map) = get("JIRA_PROJECT_NAME_MAP") {
            self.tracker.project_aliases = parse_project_name_map(&map);
        }
        if let Some(enabled) = get("JIRA_CREATE_ENABLED") {
            self.chat.create_enabled = enabled.eq_ignore_ascii_case("true");
        }
        if let Some(name) = get("BOT_NAME") {
            self.general.bot_name = name;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Display name used in replies.
    pub bot_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bot_name: "Jarvis".to_string(),
        }
    }
}

/// Drafting conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Word that introduces explicit commands (`jira criar`, `jira definir`).
    pub command_prefix: String,
    /// Minutes a pending draft survives. Zero disables expiry.
    pub draft_ttl_minutes: u32,
    /// Whether card creation is allowed at all.
    pub create_enabled: bool,
    /// Summary used when neither the user nor the extractor supplied one.
    pub default_summary: String,
    /// Longest original command quoted in the origin footer.
    pub max_origin_command_chars: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            command_prefix: "jira".to_string(),
            draft_ttl_minutes: 120,
            create_enabled: true,
            default_summary: "Card criado via Jarvis".to_string(),
            max_origin_command_chars: 400,
        }
    }
}

impl ChatSettings {
    /// Pending-draft time-to-live as a duration.
    pub fn draft_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.draft_ttl_minutes))
    }
}

/// Ticketing system settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL used to build `/browse/KEY` links.
    pub base_url: String,
    /// Projects used to scope default listing queries.
    pub project_keys: Vec<String>,
    /// Human project name (lower-case) to project key (upper-case).
    pub project_aliases: BTreeMap<String, String>,
}

impl TrackerConfig {
    fn normalize_aliases(&mut self) {
        self.project_aliases = std::mem::take(&mut self.project_aliases)
            .into_iter()
            .map(|(name, key)| (name.trim().to_lowercase(), key.trim().to_uppercase()))
            .filter(|(name, key)| !name.is_empty() && !key.is_empty())
            .collect();
    }
}

/// Parse `name1:KEY1,name2:KEY2` into a lower-case name to upper-case key map.
///
/// Malformed or empty entries are skipped.
pub fn parse_project_name_map(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, key) = entry.trim().split_once(':')?;
            let name = name.trim().to_lowercase();
            let key = key.trim().to_uppercase();
            (!name.is_empty() && !key.is_empty()).then_some((name, key))
        })
        .collect()
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
