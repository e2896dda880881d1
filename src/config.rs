//! Service configuration and controller tuning

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::DifficultyLevel;
use crate::{
    ANSWER_FEEDBACK_MS, AVERAGE_WINDOW, CONFUSION_MARGIN, COOLDOWN_MS, DEBOUNCE_MS,
    DEFAULT_ACCURACY, DIRECTION_DISPLAY_MS, HISTORY_CAPACITY, REACTIVE_ENGAGEMENT_DOWN,
    REACTIVE_ENGAGEMENT_UP, REACTIVE_STRESS_DOWN, REACTIVE_STRESS_UP, STEADY_ACCURACY_DOWN,
    STEADY_ACCURACY_UP, STEADY_ENGAGEMENT_DOWN, STEADY_ENGAGEMENT_UP, STEADY_STRESS_DOWN,
    STEADY_STRESS_UP,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GENERATOR_URL: &str = "http://localhost:3000";
const DEFAULT_GENERATOR_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_REPORT_DIR: &str = "./reports";

/// Service-level settings read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub generator_url: String,
    pub generator_timeout: Duration,
    pub report_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
            generator_url: DEFAULT_GENERATOR_URL.to_string(),
            generator_timeout: Duration::from_millis(DEFAULT_GENERATOR_TIMEOUT_MS),
            report_dir: DEFAULT_REPORT_DIR.to_string(),
        }
    }
}

impl Config {
    /// Read `.env` (if any) then the process environment
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let host = env_parse("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT").unwrap_or(defaults.port);
        let log_level = env_string("RUST_LOG").unwrap_or(defaults.log_level);
        let generator_url = env_string("GENERATOR_URL").unwrap_or(defaults.generator_url);
        let generator_timeout = env_parse::<u64>("GENERATOR_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.generator_timeout);
        let report_dir = env_string("REPORT_DIR").unwrap_or(defaults.report_dir);

        Self {
            host,
            port,
            log_level,
            generator_url,
            generator_timeout,
            report_dir,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}

/// Every threshold and timer the controller uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub history_capacity: usize,
    pub average_window: usize,
    pub confusion_margin: f64,

    pub reactive_stress_down: f64,
    pub reactive_engagement_down: f64,
    pub reactive_engagement_up: f64,
    pub reactive_stress_up: f64,

    pub steady_engagement_down: f64,
    pub steady_stress_down: f64,
    pub steady_accuracy_down: f64,
    pub steady_engagement_up: f64,
    pub steady_stress_up: f64,
    pub steady_accuracy_up: f64,
    pub default_accuracy: f64,

    pub default_level: DifficultyLevel,

    pub debounce_ms: u64,
    pub cooldown_ms: u64,
    pub direction_display_ms: u64,
    pub answer_feedback_ms: u64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            average_window: AVERAGE_WINDOW,
            confusion_margin: CONFUSION_MARGIN,
            reactive_stress_down: REACTIVE_STRESS_DOWN,
            reactive_engagement_down: REACTIVE_ENGAGEMENT_DOWN,
            reactive_engagement_up: REACTIVE_ENGAGEMENT_UP,
            reactive_stress_up: REACTIVE_STRESS_UP,
            steady_engagement_down: STEADY_ENGAGEMENT_DOWN,
            steady_stress_down: STEADY_STRESS_DOWN,
            steady_accuracy_down: STEADY_ACCURACY_DOWN,
            steady_engagement_up: STEADY_ENGAGEMENT_UP,
            steady_stress_up: STEADY_STRESS_UP,
            steady_accuracy_up: STEADY_ACCURACY_UP,
            default_accuracy: DEFAULT_ACCURACY,
            default_level: DifficultyLevel::default(),
            debounce_ms: DEBOUNCE_MS,
            cooldown_ms: COOLDOWN_MS,
            direction_display_ms: DIRECTION_DISPLAY_MS,
            answer_feedback_ms: ANSWER_FEEDBACK_MS,
        }
    }
}

impl AdaptiveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn direction_display(&self) -> Duration {
        Duration::from_millis(self.direction_display_ms)
    }

    pub fn answer_feedback(&self) -> Duration {
        Duration::from_millis(self.answer_feedback_ms)
    }
}
