//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How new order numbers are minted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderNumberStrategy {
    /// `PREFIX-XXXXXXXX`, random alphanumeric suffix
    Random,
    /// `PREFIX-YYYYMMDD-NNNNN`, per-day sequence
    Daily,
}

impl std::str::FromStr for OrderNumberStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "daily" => Ok(Self::Daily),
            other => Err(format!(
                "ORDER_NUMBER_STRATEGY must be random or daily, got {other}"
            )),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    pub http_port: u16,
    /// PostgreSQL connection URL; `None` selects the in-memory store (development only)
    pub database_url: Option<String>,
    /// Bearer token for staff routes
    pub admin_token: String,
    pub order_number_prefix: String,
    pub order_number_strategy: OrderNumberStrategy,
    /// Loopback callers bypass the whitelist (development only)
    pub allow_loopback: bool,
    /// Strip payout fields from audit payloads
    pub redact_payout_details: bool,
    pub audit_buffer_size: usize,
    pub notify_buffer_size: usize,
    /// Mail service endpoint; `None` logs notifications instead
    pub notify_webhook_url: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let development = environment == "development";

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && !development {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let order_number_strategy = match std::env::var("ORDER_NUMBER_STRATEGY") {
            Ok(v) => v.parse::<OrderNumberStrategy>()?,
            Err(_) => OrderNumberStrategy::Random,
        };

        let allow_loopback = development && Self::parse_or("ALLOW_LOOPBACK", true);

        Ok(Self {
            http_port: Self::parse_or("HTTP_PORT", 8080),
            database_url,
            admin_token: Self::require_secret("ADMIN_TOKEN", &environment)?,
            order_number_prefix: std::env::var("ORDER_NUMBER_PREFIX")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "TRD".into()),
            order_number_strategy,
            allow_loopback,
            redact_payout_details: Self::parse_or("REDACT_PAYOUT_DETAILS", true),
            audit_buffer_size: Self::parse_or("AUDIT_BUFFER_SIZE", 1024usize).max(1),
            notify_buffer_size: Self::parse_or("NOTIFY_BUFFER_SIZE", 256usize).max(1),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            environment,
        })
    }

    /// Development defaults, used by the test suite
    pub fn for_development() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            database_url: None,
            admin_token: "dev-ADMIN_TOKEN-not-for-production".into(),
            order_number_prefix: "TRD".into(),
            order_number_strategy: OrderNumberStrategy::Random,
            allow_loopback: true,
            redact_payout_details: true,
            audit_buffer_size: 1024,
            notify_buffer_size: 256,
            notify_webhook_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("daily".parse(), Ok(OrderNumberStrategy::Daily));
        assert_eq!(" Random ".parse(), Ok(OrderNumberStrategy::Random));
        assert!("sequential".parse::<OrderNumberStrategy>().is_err());
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::for_development();
        assert!(config.is_development());
        assert!(config.allow_loopback);
        assert!(config.redact_payout_details);
        assert_eq!(config.order_number_prefix, "TRD");
    }
}
