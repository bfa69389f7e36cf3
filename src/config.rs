//! Server configuration

use chrono::TimeDelta;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::time::Duration;

/// One year; longer sweep intervals are a misconfiguration.
const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Process-local, lost on restart
    Memory,
    Scylla,
}

/// Marketplace order service configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "marketplace-orders", about = "Marketplace order lifecycle service", long_about = None)]
pub struct Config {
    /// HTTP bind address
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port
    #[arg(long, env = "HTTP_PORT", default_value = "8080")]
    pub port: u16,

    /// Where aggregates are persisted
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value = "memory")]
    pub store_backend: StoreBackend,

    /// Comma-separated ScyllaDB contact points
    #[arg(long, env = "SCYLLA_NODES", value_delimiter = ',', default_value = "127.0.0.1:9042")]
    pub scylla_nodes: Vec<String>,

    #[arg(long, env = "SCYLLA_KEYSPACE", default_value = "marketplace")]
    pub scylla_keyspace: String,

    /// JSON catalog seed (businesses, categories, items, partners)
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog_path: Option<String>,

    /// Platform commission as a percentage of each line price
    #[arg(long, env = "COMMISSION_RATE", default_value = "5")]
    pub commission_rate: Decimal,

    #[arg(
        long,
        env = "ESCALATION_INTERVAL_SECS",
        default_value = "86400",
        value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_SECS)
    )]
    pub escalation_interval_secs: u64,

    /// Days a partner has to answer a refund/exchange request
    #[arg(long, env = "ESCALATION_THRESHOLD_DAYS", default_value = "7", value_parser = parse_threshold_days)]
    pub escalation_threshold_days: i64,

    #[arg(long, env = "NOTIFICATION_QUEUE_CAPACITY", default_value = "1024")]
    pub notification_queue_capacity: usize,
}

impl Config {
    /// Load configuration from `.env`, the environment and CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn escalation_interval(&self) -> Duration {
        Duration::from_secs(self.escalation_interval_secs.clamp(1, MAX_INTERVAL_SECS))
    }

    pub fn escalation_threshold(&self) -> TimeDelta {
        TimeDelta::try_days(self.escalation_threshold_days).unwrap_or(TimeDelta::MAX)
    }
}

fn parse_threshold_days(value: &str) -> Result<i64, String> {
    let days: i64 = value.parse().map_err(|e| format!("{e}"))?;
    if days < 1 {
        return Err("must be at least one day".to_string());
    }
    TimeDelta::try_days(days)
        .map(|_| days)
        .ok_or_else(|| format!("{days} days is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["marketplace-orders"]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.escalation_interval(), Duration::from_secs(86_400));
        assert_eq!(config.escalation_threshold(), TimeDelta::days(7));
        assert_eq!(config.commission_rate, Decimal::from(5));
    }

    #[test]
    fn test_flags_override() {
        let config = Config::try_parse_from([
            "marketplace-orders",
            "--store-backend",
            "scylla",
            "--scylla-nodes",
            "10.0.0.1:9042,10.0.0.2:9042",
            "--commission-rate",
            "7.5",
            "--port",
            "9000",
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Scylla);
        assert_eq!(config.scylla_nodes.len(), 2);
        assert_eq!(config.commission_rate, Decimal::new(75, 1));
        assert_eq!(config.socket_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_escalation_settings_out_of_range_rejected() {
        for (flag, value) in [
            ("--escalation-threshold-days", "9223372036854775807"),
            ("--escalation-threshold-days", "0"),
            ("--escalation-interval-secs", "0"),
            ("--escalation-interval-secs", "18446744073709551615"),
        ] {
            let err = Config::try_parse_from(["marketplace-orders", flag, value]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{flag}={value}");
        }

        let config =
            Config::try_parse_from(["marketplace-orders", "--escalation-threshold-days", "30"]).unwrap();
        assert_eq!(config.escalation_threshold(), TimeDelta::days(30));
    }
}
