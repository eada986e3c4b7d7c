use std::time::Duration;

use serde::Deserialize;

use crate::domain::CheckPolicy;

/// Top-level config, loaded from YAML with `${VAR}` environment expansion so
/// secrets stay out of the file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub patreon: PatreonConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub interval_seconds: u64,
    pub initial_delay_seconds: u64,
    pub use_fetch_cache: bool,
    pub cache_validity_seconds: u64,
    /// Defaults to half the cache validity when unset.
    pub cache_eviction_period_seconds: Option<u64>,
    pub cache_rewards_max_size: usize,
    /// Defaults to `cache_rewards_max_size` when unset.
    pub cache_campaigns_max_size: Option<usize>,
    pub remove_missing_rewards: bool,
    pub notify_on_missing_rewards: bool,
    pub notify_on_forbidden_rewards: bool,
    pub skip_reward_entry_check_if_empty_and_no_error: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 300,
            initial_delay_seconds: 0,
            use_fetch_cache: true,
            cache_validity_seconds: 600,
            cache_eviction_period_seconds: None,
            cache_rewards_max_size: 100,
            cache_campaigns_max_size: None,
            remove_missing_rewards: false,
            notify_on_missing_rewards: true,
            notify_on_forbidden_rewards: true,
            skip_reward_entry_check_if_empty_and_no_error: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PatreonConfig {
    pub base_domain: String,
    pub request_timeout_seconds: u64,
}

impl Default for PatreonConfig {
    fn default() -> Self {
        Self {
            base_domain: "https://www.patreon.com".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_key: Option<String>,
    pub default_locale: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/main.db".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let raw = expand_env(&raw);
        let cfg: Config = serde_yaml::from_str(&raw)?;
        Ok(cfg)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.run.interval_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.run.initial_delay_seconds)
    }

    pub fn cache_validity(&self) -> Duration {
        Duration::from_secs(self.run.cache_validity_seconds)
    }

    pub fn cache_eviction_period(&self) -> Duration {
        Duration::from_secs(
            self.run
                .cache_eviction_period_seconds
                .unwrap_or(self.run.cache_validity_seconds / 2),
        )
    }

    pub fn cache_campaigns_max_size(&self) -> usize {
        self.run
            .cache_campaigns_max_size
            .unwrap_or(self.run.cache_rewards_max_size)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.patreon.request_timeout_seconds)
    }

    pub fn check_policy(&self) -> CheckPolicy {
        CheckPolicy {
            remove_missing_rewards: self.run.remove_missing_rewards,
            notify_on_missing_rewards: self.run.notify_on_missing_rewards,
            notify_on_forbidden_rewards: self.run.notify_on_forbidden_rewards,
            skip_entry_check_if_empty_and_no_error: self
                .run
                .skip_reward_entry_check_if_empty_and_no_error,
            ..CheckPolicy::default()
        }
    }
}

/// very small ${VAR} expansion to keep config simple
fn expand_env(s: &str) -> String {
    let mut out = s.to_string();
    for (k, v) in std::env::vars() {
        out = out.replace(&format!("${{{}}}", k), &v);
    }
    out
}
