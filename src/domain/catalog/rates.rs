use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

/// Source of the platform commission percentage, read at pricing time.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn commission_rate(&self) -> anyhow::Result<Decimal>;
}

/// Rate held in process settings; admins may change it at runtime.
pub struct SettingsRateProvider {
    rate: RwLock<Decimal>,
}

impl SettingsRateProvider {
    pub fn new(rate: Decimal) -> Self {
        Self {
            rate: RwLock::new(rate),
        }
    }

    pub async fn set(&self, rate: Decimal) {
        tracing::info!(rate = %rate, "Commission rate updated");
        *self.rate.write().await = rate;
    }
}

#[async_trait]
impl RateProvider for SettingsRateProvider {
    async fn commission_rate(&self) -> anyhow::Result<Decimal> {
        Ok(*self.rate.read().await)
    }
}
