use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_HEALTHY_INTERVAL: Duration = Duration::from_millis(300_000);
pub const DEFAULT_UNHEALTHY_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_BACKGROUND_GRACE: Duration = Duration::from_millis(30_000);
/// Longest tick period the poller will arm.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30 * 24 * 3600);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid scoring weight {name}: {value}")]
    InvalidWeight { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub scoring: ScoringWeights,
    pub polling: PollingConfig,
}

impl Config {
    /// Reads `FEED_SCORE_*` and `FEED_POLL_*`, falling back per field on missing or
    /// unparsable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = ScoringWeights::default();
        let scoring = ScoringWeights {
            recency_max: env_or("FEED_SCORE_RECENCY_MAX", defaults.recency_max),
            recency_half_life_hours: env_or(
                "FEED_SCORE_RECENCY_HALF_LIFE_HOURS",
                defaults.recency_half_life_hours,
            ),
            pin_bonus: env_or("FEED_SCORE_PIN_BONUS", defaults.pin_bonus),
            unanswered_bonus: env_or("FEED_SCORE_UNANSWERED_BONUS", defaults.unanswered_bonus),
            unseen_bonus: env_or("FEED_SCORE_UNSEEN_BONUS", defaults.unseen_bonus),
            like_weight: env_or("FEED_SCORE_LIKE_WEIGHT", defaults.like_weight),
            reply_weight: env_or("FEED_SCORE_REPLY_WEIGHT", defaults.reply_weight),
        };
        scoring.validate()?;

        let polling = PollingConfig {
            enabled: env_or("FEED_POLL_ENABLED", true),
            realtime_healthy: env_or("FEED_POLL_REALTIME_HEALTHY", false),
            healthy_interval: Duration::from_millis(env_or(
                "FEED_POLL_HEALTHY_INTERVAL_MS",
                DEFAULT_HEALTHY_INTERVAL.as_millis() as u64,
            )),
            unhealthy_interval: Duration::from_millis(env_or(
                "FEED_POLL_UNHEALTHY_INTERVAL_MS",
                DEFAULT_UNHEALTHY_INTERVAL.as_millis() as u64,
            )),
            background_grace: Duration::from_millis(env_or(
                "FEED_POLL_BACKGROUND_GRACE_MS",
                DEFAULT_BACKGROUND_GRACE.as_millis() as u64,
            )),
        };

        Ok(Config { scoring, polling })
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Debug>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(
                key = key,
                value = %raw,
                default = ?default,
                "Unparsable config value, using default"
            );
            default
        }),
        Err(_) => default,
    }
}

/// Scoring policy constants.
///
/// Only the orderings matter: `pin_bonus` must dwarf every other term so pinned
/// items stay on top, and every term is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Recency contribution of a brand new item
    pub recency_max: f64,
    pub recency_half_life_hours: f64,
    pub pin_bonus: f64,
    /// Open question with no replies
    pub unanswered_bonus: f64,
    pub unseen_bonus: f64,
    /// Multiplier on `ln(1 + like_count)`
    pub like_weight: f64,
    /// Multiplier on `ln(1 + reply_count)`
    pub reply_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency_max: 100.0,
            recency_half_life_hours: 24.0,
            pin_bonus: 1000.0,
            unanswered_bonus: 50.0,
            unseen_bonus: 30.0,
            like_weight: 10.0,
            reply_weight: 15.0,
        }
    }
}

impl ScoringWeights {
    pub fn with_pin_bonus(mut self, pin_bonus: f64) -> Self {
        self.pin_bonus = pin_bonus;
        self
    }

    pub fn with_recency(mut self, max: f64, half_life_hours: f64) -> Self {
        self.recency_max = max;
        self.recency_half_life_hours = half_life_hours;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("recency_max", self.recency_max),
            ("pin_bonus", self.pin_bonus),
            ("unanswered_bonus", self.unanswered_bonus),
            ("unseen_bonus", self.unseen_bonus),
            ("like_weight", self.like_weight),
            ("reply_weight", self.reply_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if !self.recency_half_life_hours.is_finite() || self.recency_half_life_hours <= 0.0 {
            return Err(ConfigError::InvalidWeight {
                name: "recency_half_life_hours",
                value: self.recency_half_life_hours,
            });
        }
        if self.pin_bonus <= self.max_unpinned_score() {
            return Err(ConfigError::InvalidWeight {
                name: "pin_bonus",
                value: self.pin_bonus,
            });
        }
        Ok(())
    }

    /// Highest score an unpinned item can reach; counts are `u32` so engagement is bounded.
    pub fn max_unpinned_score(&self) -> f64 {
        let max_engagement = (u32::MAX as f64).ln_1p();
        self.recency_max
            + self.unanswered_bonus
            + self.unseen_bonus
            + (self.like_weight + self.reply_weight) * max_engagement
    }
}

/// Inputs of the adaptive poller for one update cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub enabled: bool,
    /// Whether the realtime channel is currently delivering events
    pub realtime_healthy: bool,
    pub healthy_interval: Duration,
    pub unhealthy_interval: Duration,
    /// Minimum time since the last resume fetch before another one is issued
    pub background_grace: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            realtime_healthy: false,
            healthy_interval: DEFAULT_HEALTHY_INTERVAL,
            unhealthy_interval: DEFAULT_UNHEALTHY_INTERVAL,
            background_grace: DEFAULT_BACKGROUND_GRACE,
        }
    }
}

impl PollingConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_realtime_healthy(mut self, healthy: bool) -> Self {
        self.realtime_healthy = healthy;
        self
    }

    pub fn with_intervals(mut self, healthy: Duration, unhealthy: Duration) -> Self {
        self.healthy_interval = healthy;
        self.unhealthy_interval = unhealthy;
        self
    }

    pub fn with_background_grace(mut self, grace: Duration) -> Self {
        self.background_grace = grace;
        self
    }

    /// Zero durations fall back to the defaults; tick periods are capped at [`MAX_POLL_INTERVAL`].
    pub fn normalized(&self) -> Self {
        fn or_default(value: Duration, default: Duration) -> Duration {
            if value.is_zero() {
                default
            } else {
                value
            }
        }

        Self {
            enabled: self.enabled,
            realtime_healthy: self.realtime_healthy,
            healthy_interval: or_default(self.healthy_interval, DEFAULT_HEALTHY_INTERVAL)
                .min(MAX_POLL_INTERVAL),
            unhealthy_interval: or_default(self.unhealthy_interval, DEFAULT_UNHEALTHY_INTERVAL)
                .min(MAX_POLL_INTERVAL),
            background_grace: or_default(self.background_grace, DEFAULT_BACKGROUND_GRACE),
        }
    }

    pub fn exceeds_max_interval(&self) -> bool {
        self.healthy_interval > MAX_POLL_INTERVAL || self.unhealthy_interval > MAX_POLL_INTERVAL
    }

    /// Tick period selected by the current health flag.
    pub fn active_interval(&self) -> Duration {
        let normalized = self.normalized();
        if normalized.realtime_healthy {
            normalized.healthy_interval
        } else {
            normalized.unhealthy_interval
        }
    }
}
