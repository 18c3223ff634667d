//! Configuration types for poem-corpus

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Top-level pipeline configuration
///
/// Constructed per invocation; there is no config file. Consumers build
/// this struct (or deserialize it from whatever source they like) and hand
/// it to [`Pipeline::new`](crate::Pipeline::new).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Retry behavior for the fetch stage
    #[serde(default)]
    pub retry: RetryConfig,

    /// HTTP fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Path of the JSONL record store (default: "./poem_success.jsonl")
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            fetch: FetchConfig::default(),
            store_path: default_store_path(),
        }
    }
}

impl Config {
    /// Validate the configuration, returning a keyed error for the first
    /// invalid setting found
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_workers == 0 {
            return Err(Error::Config {
                message: "max_workers must be at least 1".to_string(),
                key: Some("retry.max_workers".to_string()),
            });
        }
        if let Err(e) = Url::parse(&self.fetch.reader_base_url) {
            return Err(Error::Config {
                message: format!("invalid reader base URL: {}", e),
                key: Some("fetch.reader_base_url".to_string()),
            });
        }
        Ok(())
    }
}

/// Retry configuration for the fetch stage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry rounds before giving up (default: 20)
    ///
    /// Zero means no rounds run at all and every item is reported unfetched.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum fetch attempts in flight at once (default: 4, must be ≥ 1)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Delay between retry rounds, in milliseconds (default: 500)
    ///
    /// This is the sole rate-limiting mechanism against the remote server.
    #[serde(default = "default_round_delay", with = "duration_ms_serde")]
    pub round_delay: Duration,

    /// Add random jitter to the inter-round delay (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            max_workers: 4,
            round_delay: Duration::from_millis(500),
            jitter: true,
        }
    }
}

/// HTTP fetch configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Readable-content proxy prefixed to every page URL
    /// (default: "https://r.jina.ai/")
    ///
    /// The target URL is the page URL appended verbatim to this prefix, so
    /// it must end with a trailing slash.
    #[serde(default = "default_reader_base_url")]
    pub reader_base_url: String,

    /// Per-request timeout, in milliseconds (default: 30000)
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            reader_base_url: default_reader_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./poem_success.jsonl")
}

fn default_max_retries() -> u32 {
    20
}

fn default_max_workers() -> usize {
    4
}

fn default_round_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_true() -> bool {
    true
}

fn default_reader_base_url() -> String {
    "https://r.jina.ai/".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(30_000)
}

fn default_user_agent() -> String {
    format!("poem-corpus/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
