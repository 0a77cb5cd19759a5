use std::{env, net::IpAddr};

use adyen_payment_engine::adyen_api::notification_processor::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ERROR_COUNT};
use apg_common::{helpers::parse_boolean_flag, Secret};
use chrono::Duration;
use log::*;

const DEFAULT_APG_HOST: &str = "127.0.0.1";
const DEFAULT_APG_PORT: u16 = 8360;
const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::seconds(60);
const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::minutes(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Bearer token for the `/api` admin routes. If empty, every admin request is refused.
    pub admin_api_token: Secret<String>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// If supplied, webhook notifications are only accepted from these addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub adyen_whitelist: Option<Vec<IpAddr>>,
    pub notifications: NotificationConfig,
}

/// Settings for the receipt and scheduled processing of webhook notifications.
#[derive(Clone, Copy, Debug)]
pub struct NotificationConfig {
    /// How often the notification worker looks for due notifications.
    pub interval: Duration,
    /// How many notifications are processed per run.
    pub batch_size: i64,
    /// How long notifications other than `AUTHORISATION` wait before they are processed.
    pub delay: Duration,
    /// A notification is given up after failing this many times.
    pub max_error_count: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_NOTIFICATION_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_NOTIFICATION_DELAY,
            max_error_count: DEFAULT_MAX_ERROR_COUNT,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_APG_HOST.to_string(),
            port: DEFAULT_APG_PORT,
            database_url: String::default(),
            admin_api_token: Secret::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            adyen_whitelist: None,
            notifications: NotificationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("APG_HOST").ok().unwrap_or_else(|| DEFAULT_APG_HOST.into());
        let port = env::var("APG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for APG_PORT. {e} Using the default, {DEFAULT_APG_PORT}, instead."
                    );
                    DEFAULT_APG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_APG_PORT);
        let database_url = env::var("APG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ APG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let admin_api_token = env::var("APG_ADMIN_API_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ APG_ADMIN_API_TOKEN is not set. All admin requests will be refused.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("APG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("APG_USE_FORWARDED").ok(), false);
        let adyen_whitelist = env::var("APG_ADYEN_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &adyen_whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Adyen IP whitelist was configured, but is empty. The server will run, but won't accept \
                     any webhook notifications."
                );
            },
            None => {
                info!("🪛️ No Adyen IP whitelist is set. Only basic auth and HMAC validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Adyen IP whitelist: {addrs}");
            },
        }
        let notifications = NotificationConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            admin_api_token: Secret::new(admin_api_token),
            use_x_forwarded_for,
            use_forwarded,
            adyen_whitelist,
            notifications,
        }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let interval = env::var("APG_NOTIFICATION_INTERVAL")
            .ok()
            .and_then(|s| parse_positive("APG_NOTIFICATION_INTERVAL", &s))
            .map(Duration::seconds)
            .unwrap_or(defaults.interval);
        let batch_size = env::var("APG_NOTIFICATION_BATCH_SIZE")
            .ok()
            .and_then(|s| parse_positive("APG_NOTIFICATION_BATCH_SIZE", &s))
            .unwrap_or(defaults.batch_size);
        let delay = env::var("APG_NOTIFICATION_DELAY")
            .map_err(|_| {
                info!(
                    "🪛️ APG_NOTIFICATION_DELAY is not set. Using the default value of {} minutes.",
                    defaults.delay.num_minutes()
                )
            })
            .ok()
            .and_then(|s| s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid value for APG_NOTIFICATION_DELAY. {e}")).ok())
            .map(|secs| Duration::seconds(secs.max(0)))
            .unwrap_or(defaults.delay);
        let max_error_count = env::var("APG_NOTIFICATION_MAX_ERRORS")
            .ok()
            .and_then(|s| parse_positive("APG_NOTIFICATION_MAX_ERRORS", &s))
            .unwrap_or(defaults.max_error_count);
        Self { interval, batch_size, delay, max_error_count }
    }
}

fn parse_positive(name: &str, value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(v) if v > 0 => Some(v),
        Ok(v) => {
            warn!("🪛️ {name} must be positive, but is {v}. Using the default.");
            None
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name}. {e}. Using the default.");
            None
        },
    }
}

/// Parses a comma-separated list of IP addresses. `None` means the whitelist is disabled.
pub fn parse_whitelist(value: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&value.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Adyen IP whitelist is disabled. If this is not what you want, set APG_ADYEN_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>().map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in APG_ADYEN_IP_WHITELIST: {e}")).ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub adyen_whitelist: Option<Vec<IpAddr>>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            adyen_whitelist: config.adyen_whitelist.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whitelist_parsing() {
        assert!(parse_whitelist("none").is_none());
        assert!(parse_whitelist("False").is_none());
        let list = parse_whitelist("10.0.0.1, not-an-ip,::1").unwrap();
        assert_eq!(list, vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse::<IpAddr>().unwrap()]);
        assert_eq!(parse_whitelist(""), Some(vec![]));
    }

    #[test]
    fn positive_values() {
        assert_eq!(parse_positive("X", " 15 "), Some(15));
        assert_eq!(parse_positive("X", "0"), None);
        assert_eq!(parse_positive("X", "-2"), None);
        assert_eq!(parse_positive("X", "ten"), None);
    }
}
