//! Client configuration loaded from the environment.

use std::env::vars;
use std::time::Duration;

use log::info;
use serde::Deserialize;
use ustr::Ustr;

const DEFAULT_USER_TYPE: &str = "technical";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    /// Root of the users API, without a trailing slash (e.g. `https://admin.example.com/api`).
    api_base_url: String,
    /// Subtype every list call is filtered to and every write is tagged with.
    user_type: Ustr,
    search_debounce: Duration,
    /// Poll the collection on this interval when set.
    refresh_interval: Option<Duration>,
    request_timeout: Duration,
    /// Sent verbatim as the `Authorization` header when present.
    authorization: Option<String>,
}

// Environment variables as read, before defaults and validation.
#[derive(Deserialize)]
struct RawConfig {
    api_base_url: Option<String>,
    user_type: Option<String>,
    search_debounce_ms: Option<u64>,
    refresh_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    api_authorization: Option<String>,
}

impl BusinessConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let api_base_url: String = api_base_url.into();
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
            user_type: Ustr::from(DEFAULT_USER_TYPE),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            refresh_interval: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            authorization: None,
        }
    }

    /// Reads `API_BASE_URL`, `USER_TYPE`, `SEARCH_DEBOUNCE_MS`,
    /// `REFRESH_INTERVAL_SECS`, `REQUEST_TIMEOUT_SECS` and `API_AUTHORIZATION`
    /// from the environment.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");
        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            api_base_url,
            user_type,
            search_debounce_ms,
            refresh_interval_secs,
            request_timeout_secs,
            api_authorization,
        } = raw_config;

        let Some(api_base_url) = api_base_url.filter(|url| !url.trim().is_empty()) else {
            anyhow::bail!("API_BASE_URL must be set");
        };
        let api_base_url = api_base_url.trim();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            anyhow::bail!("API_BASE_URL must start with http:// or https://, got {api_base_url}");
        }

        let mut config = Self::new(api_base_url);

        match user_type.as_deref().map(str::trim) {
            Some("") => anyhow::bail!("USER_TYPE must not be empty"),
            Some(user_type) => config.user_type = Ustr::from(user_type),
            None => info!("USER_TYPE not set, defaulting to {DEFAULT_USER_TYPE}"),
        }

        if let Some(ms) = search_debounce_ms {
            config.search_debounce = Duration::from_millis(ms);
        }

        config.refresh_interval = match refresh_interval_secs {
            Some(0) => anyhow::bail!("REFRESH_INTERVAL_SECS must be positive"),
            Some(secs) => {
                info!("Polling the account list every {secs}s");
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        if let Some(secs) = request_timeout_secs {
            if secs == 0 {
                anyhow::bail!("REQUEST_TIMEOUT_SECS must be positive");
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        config.authorization = api_authorization.filter(|value| !value.is_empty());

        Ok(config)
    }

    pub fn with_user_type(mut self, user_type: &str) -> Self {
        self.user_type = Ustr::from(user_type);
        self
    }

    pub fn with_search_debounce(mut self, window: Duration) -> Self {
        self.search_debounce = window;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn user_type(&self) -> Ustr {
        self.user_type
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}
