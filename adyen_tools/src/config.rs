use std::{collections::HashMap, fmt::Display, str::FromStr};

use apg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

use crate::AdyenApiError;

pub const DEFAULT_CHECKOUT_VERSION: &str = "v70";
pub const DEFAULT_PAYMENT_VERSION: &str = "v68";
pub const DEFAULT_CAPTURE_DELIVERY_STATE: &str = "shipped";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdyenEnvironment {
    #[default]
    Test,
    Live,
}

impl FromStr for AdyenEnvironment {
    type Err = AdyenApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "live" | "production" => Ok(Self::Live),
            _ => Err(AdyenApiError::ConfigurationError(format!("Unknown Adyen environment: {s}"))),
        }
    }
}

impl Display for AdyenEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Live => write!(f, "live"),
        }
    }
}

/// Merchant configuration for one sales channel.
#[derive(Debug, Clone, Default)]
pub struct AdyenConfig {
    pub merchant_account: String,
    pub environment: AdyenEnvironment,
    pub api_key_test: Secret<String>,
    pub api_key_live: Secret<String>,
    pub hmac_key_test: Secret<String>,
    pub hmac_key_live: Secret<String>,
    pub notification_username: String,
    pub notification_password: Secret<String>,
    /// The account-specific prefix of the live endpoints, e.g. `1797a841fbb37ca7-AdyenDemo`.
    pub live_endpoint_url_prefix: String,
    /// Whether manual capture is enabled for payment methods that support it.
    pub manual_capture: bool,
    /// The delivery state that triggers the capture of manually captured payments.
    pub capture_delivery_state: String,
    pub donation_account: Option<String>,
    /// Overrides the Checkout API base url. Mostly useful for pointing the client at a mock server.
    pub checkout_url: Option<String>,
    /// Overrides the Payment API base url.
    pub payment_url: Option<String>,
}

impl AdyenConfig {
    pub fn api_key(&self) -> &Secret<String> {
        match self.environment {
            AdyenEnvironment::Test => &self.api_key_test,
            AdyenEnvironment::Live => &self.api_key_live,
        }
    }

    pub fn hmac_key(&self) -> &Secret<String> {
        match self.environment {
            AdyenEnvironment::Test => &self.hmac_key_test,
            AdyenEnvironment::Live => &self.hmac_key_live,
        }
    }

    pub fn has_notification_credentials(&self) -> bool {
        !self.notification_username.is_empty() && !self.notification_password.is_empty()
    }

    pub fn checkout_url(&self) -> String {
        if let Some(url) = &self.checkout_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.environment {
            AdyenEnvironment::Test => format!("https://checkout-test.adyen.com/{DEFAULT_CHECKOUT_VERSION}"),
            AdyenEnvironment::Live => format!(
                "https://{}-checkout-live.adyenpayments.com/checkout/{DEFAULT_CHECKOUT_VERSION}",
                self.live_endpoint_url_prefix
            ),
        }
    }

    pub fn payment_url(&self) -> String {
        if let Some(url) = &self.payment_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.environment {
            AdyenEnvironment::Test => format!("https://pal-test.adyen.com/pal/servlet/Payment/{DEFAULT_PAYMENT_VERSION}"),
            AdyenEnvironment::Live => format!(
                "https://{}-pal-live.adyenpayments.com/pal/servlet/Payment/{DEFAULT_PAYMENT_VERSION}",
                self.live_endpoint_url_prefix
            ),
        }
    }

    /// Loads the configuration for `channel`, falling back to `defaults` for every value that does not have a
    /// channel-specific override (`APG_ADYEN_MERCHANT_ACCOUNT__MY_CHANNEL`).
    fn from_env(channel: &str, defaults: &AdyenConfig) -> Self {
        let var = |name: &str| std::env::var(channel_var_name(name, channel)).ok();
        let secret = |name: &str, default: &Secret<String>| var(name).map(Secret::new).unwrap_or_else(|| default.clone());
        let environment = var("APG_ADYEN_ENVIRONMENT")
            .and_then(|s| {
                s.parse()
                    .map_err(|e| error!("🪛️ {e}. Using the default environment for sales channel {channel}"))
                    .ok()
            })
            .unwrap_or(defaults.environment);
        Self {
            merchant_account: var("APG_ADYEN_MERCHANT_ACCOUNT").unwrap_or_else(|| defaults.merchant_account.clone()),
            environment,
            api_key_test: secret("APG_ADYEN_API_KEY_TEST", &defaults.api_key_test),
            api_key_live: secret("APG_ADYEN_API_KEY_LIVE", &defaults.api_key_live),
            hmac_key_test: secret("APG_ADYEN_HMAC_KEY_TEST", &defaults.hmac_key_test),
            hmac_key_live: secret("APG_ADYEN_HMAC_KEY_LIVE", &defaults.hmac_key_live),
            notification_username: var("APG_ADYEN_NOTIFICATION_USERNAME")
                .unwrap_or_else(|| defaults.notification_username.clone()),
            notification_password: secret("APG_ADYEN_NOTIFICATION_PASSWORD", &defaults.notification_password),
            live_endpoint_url_prefix: var("APG_ADYEN_LIVE_ENDPOINT_PREFIX")
                .unwrap_or_else(|| defaults.live_endpoint_url_prefix.clone()),
            manual_capture: parse_boolean_flag(var("APG_ADYEN_MANUAL_CAPTURE"), defaults.manual_capture),
            capture_delivery_state: var("APG_ADYEN_CAPTURE_DELIVERY_STATE")
                .unwrap_or_else(|| defaults.capture_delivery_state.clone()),
            donation_account: var("APG_ADYEN_DONATION_ACCOUNT").or_else(|| defaults.donation_account.clone()),
            checkout_url: var("APG_ADYEN_CHECKOUT_URL").or_else(|| defaults.checkout_url.clone()),
            payment_url: var("APG_ADYEN_PAYMENT_URL").or_else(|| defaults.payment_url.clone()),
        }
    }

    fn default_from_env() -> Self {
        let merchant_account = std::env::var("APG_ADYEN_MERCHANT_ACCOUNT").unwrap_or_else(|_| {
            error!("🪛️ APG_ADYEN_MERCHANT_ACCOUNT is not set. Every Adyen request and notification will be rejected.");
            String::default()
        });
        let environment = std::env::var("APG_ADYEN_ENVIRONMENT")
            .ok()
            .and_then(|s| s.parse().map_err(|e| error!("🪛️ {e}. Using the test environment.")).ok())
            .unwrap_or_else(|| {
                info!("🪛️ APG_ADYEN_ENVIRONMENT is not set. Using the test environment.");
                AdyenEnvironment::Test
            });
        let secret = |name: &str| {
            Secret::new(std::env::var(name).unwrap_or_else(|_| {
                warn!("🪛️ {name} is not set.");
                String::default()
            }))
        };
        let notification_username = std::env::var("APG_ADYEN_NOTIFICATION_USERNAME").unwrap_or_else(|_| {
            warn!("🪛️ APG_ADYEN_NOTIFICATION_USERNAME is not set. Incoming notifications will be rejected.");
            String::default()
        });
        let live_endpoint_url_prefix = std::env::var("APG_ADYEN_LIVE_ENDPOINT_PREFIX").unwrap_or_else(|_| {
            if environment == AdyenEnvironment::Live {
                error!("🪛️ APG_ADYEN_LIVE_ENDPOINT_PREFIX is not set, but the live environment is configured.");
            }
            String::default()
        });
        let capture_delivery_state = std::env::var("APG_ADYEN_CAPTURE_DELIVERY_STATE").unwrap_or_else(|_| {
            debug!("🪛️ APG_ADYEN_CAPTURE_DELIVERY_STATE is not set. Using {DEFAULT_CAPTURE_DELIVERY_STATE}.");
            DEFAULT_CAPTURE_DELIVERY_STATE.to_string()
        });
        Self {
            merchant_account,
            environment,
            api_key_test: secret("APG_ADYEN_API_KEY_TEST"),
            api_key_live: secret("APG_ADYEN_API_KEY_LIVE"),
            hmac_key_test: secret("APG_ADYEN_HMAC_KEY_TEST"),
            hmac_key_live: secret("APG_ADYEN_HMAC_KEY_LIVE"),
            notification_username,
            notification_password: secret("APG_ADYEN_NOTIFICATION_PASSWORD"),
            live_endpoint_url_prefix,
            manual_capture: parse_boolean_flag(std::env::var("APG_ADYEN_MANUAL_CAPTURE").ok(), false),
            capture_delivery_state,
            donation_account: std::env::var("APG_ADYEN_DONATION_ACCOUNT").ok(),
            checkout_url: std::env::var("APG_ADYEN_CHECKOUT_URL").ok(),
            payment_url: std::env::var("APG_ADYEN_PAYMENT_URL").ok(),
        }
    }
}

/// The merchant configuration of every sales channel the gateway serves.
#[derive(Debug, Clone, Default)]
pub struct AdyenConfigs {
    default: AdyenConfig,
    channels: HashMap<String, AdyenConfig>,
}

impl AdyenConfigs {
    pub fn new(default: AdyenConfig) -> Self {
        Self { default, channels: HashMap::new() }
    }

    pub fn with_channel<S: Into<String>>(mut self, sales_channel_id: S, config: AdyenConfig) -> Self {
        self.channels.insert(sales_channel_id.into(), config);
        self
    }

    /// Returns the configuration of the given sales channel, or the default configuration if the channel has none.
    pub fn for_sales_channel(&self, sales_channel_id: Option<&str>) -> &AdyenConfig {
        sales_channel_id.and_then(|id| self.channels.get(id)).unwrap_or(&self.default)
    }

    pub fn default_config(&self) -> &AdyenConfig {
        &self.default
    }

    pub fn sales_channels(&self) -> impl Iterator<Item = &String> {
        self.channels.keys()
    }

    /// Reads the default configuration from `APG_ADYEN_*` variables. Every sales channel listed in
    /// `APG_SALES_CHANNELS` gets its own configuration, where `APG_ADYEN_<NAME>__<CHANNEL>` overrides the default.
    pub fn new_from_env_or_default() -> Self {
        let default = AdyenConfig::default_from_env();
        let channels = std::env::var("APG_SALES_CHANNELS")
            .map(|s| apg_common::helpers::parse_list(&s))
            .unwrap_or_default();
        let mut configs = Self::new(default);
        for channel in channels {
            info!("🪛️ Loading Adyen configuration for sales channel {channel}");
            let config = AdyenConfig::from_env(&channel, &configs.default);
            configs = configs.with_channel(channel, config);
        }
        configs
    }
}

/// `APG_ADYEN_MERCHANT_ACCOUNT` for channel `eu-store` becomes `APG_ADYEN_MERCHANT_ACCOUNT__EU_STORE`.
pub fn channel_var_name(name: &str, channel: &str) -> String {
    let channel = channel.to_ascii_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    format!("{name}__{channel}")
}
