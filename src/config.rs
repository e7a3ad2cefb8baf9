//! Service configuration.

use serde::Deserialize;

/// Subscription service configuration, fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubscribeConfig {
    /// Upper bound on live subscriptions, to stop exhaustion attacks.
    /// Default: 100,000,000
    pub maximum_subscriptions: u32,

    /// Lease length granted by subscribe and renew.
    /// Default: 10 minutes
    pub subscription_expiration_minutes: u32,

    /// Threads serving the unordered lane (renew). Zero is treated as one.
    /// Default: 4
    pub unordered_workers: usize,
}

impl Default for SubscribeConfig {
    fn default() -> Self {
        Self {
            maximum_subscriptions: 100_000_000,
            subscription_expiration_minutes: 10,
            unordered_workers: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SubscribeConfig =
            serde_json::from_str(r#"{ "maximum_subscriptions": 50 }"#).unwrap();
        assert_eq!(config.maximum_subscriptions, 50);
        assert_eq!(config.subscription_expiration_minutes, 10);
        assert_eq!(config.unordered_workers, 4);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: SubscribeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SubscribeConfig::default());
    }
}
