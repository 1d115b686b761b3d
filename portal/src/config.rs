//! Configuration management for the portal.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file is honored by the binary through `dotenvy`.

use ourbusway_client::ApiConfig;
use ourbusway_client::api::DEFAULT_BASE_URL;
use ourbusway_client::stripe::DEFAULT_STRIPE_API_URL;
use ourbusway_runtime::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration problems detected when a feature is used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Card payments need the provider's publishable key
    #[error("STRIPE_PUBLISHABLE_KEY is not set")]
    MissingStripeKey,
}

/// Portal configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Gateway configuration
    pub api: ApiSettings,
    /// Payment provider configuration
    pub stripe: StripeSettings,
    /// Checkout timings
    pub payment: PaymentSettings,
    /// Log filter (`RUST_LOG` syntax)
    pub log_level: String,
}

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Gateway base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Payment provider configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeSettings {
    /// Publishable key (`pk_...`)
    pub publishable_key: Option<String>,
    /// Provider API URL
    pub api_url: String,
}

impl std::fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeSettings")
            .field("publishable_key", &self.publishable_key.as_ref().map(|_| "<set>"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Checkout timings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Attempts to obtain the payment intent
    pub init_max_attempts: u32,
    /// Milliseconds between attempts
    pub init_retry_delay_ms: u64,
    /// Milliseconds between a successful payment and the redirect
    pub success_redirect_ms: u64,
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiSettings {
                base_url: lookup("OURBUSWAY_API_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout_secs: parsed(&lookup, "OURBUSWAY_API_TIMEOUT_SECS", 30),
            },
            stripe: StripeSettings {
                publishable_key: lookup("STRIPE_PUBLISHABLE_KEY").filter(|k| !k.trim().is_empty()),
                api_url: lookup("STRIPE_API_URL")
                    .unwrap_or_else(|| DEFAULT_STRIPE_API_URL.to_string()),
            },
            payment: PaymentSettings {
                init_max_attempts: parsed(&lookup, "PAYMENT_INIT_MAX_ATTEMPTS", 10),
                init_retry_delay_ms: parsed(&lookup, "PAYMENT_INIT_RETRY_DELAY_MS", 500),
                success_redirect_ms: parsed(&lookup, "PAYMENT_SUCCESS_REDIRECT_MS", 2000),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Gateway client settings
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_secs(self.api.timeout_secs))
    }

    /// Retry policy for payment initialization
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(self.payment.init_max_attempts)
            .delay(Duration::from_millis(self.payment.init_retry_delay_ms))
            .build()
    }

    /// Delay before leaving a successful checkout
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.payment.success_redirect_ms)
    }

    /// Publishable key, required for card payments
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingStripeKey`] when unset.
    pub fn stripe_key(&self) -> Result<&str, ConfigError> {
        self.stripe
            .publishable_key
            .as_deref()
            .ok_or(ConfigError::MissingStripeKey)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.stripe.api_url, "https://api.stripe.com");
        assert_eq!(config.retry_policy(), RetryPolicy::payment_initialization());
        assert_eq!(config.redirect_delay(), Duration::from_secs(2));
        assert_eq!(config.stripe_key(), Err(ConfigError::MissingStripeKey));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("OURBUSWAY_API_URL", "https://gateway.ourbusway.ma"),
            ("STRIPE_PUBLISHABLE_KEY", "pk_test_123"),
            ("PAYMENT_INIT_MAX_ATTEMPTS", "4"),
            ("PAYMENT_INIT_RETRY_DELAY_MS", "not-a-number"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.api.base_url, "https://gateway.ourbusway.ma");
        assert_eq!(config.stripe_key(), Ok("pk_test_123"));
        assert_eq!(config.retry_policy().max_attempts, 4);
        assert_eq!(config.retry_policy().delay, Duration::from_millis(500));
    }

    #[test]
    fn test_debug_hides_publishable_key() {
        let config = Config::from_lookup(|key| {
            (key == "STRIPE_PUBLISHABLE_KEY").then(|| "pk_live_secretish".to_string())
        });
        assert!(!format!("{config:?}").contains("pk_live_secretish"));
    }
}
