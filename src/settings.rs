use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::models::{referrals::ReferralRates, BPS_DENOMINATOR};

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub cron_secret: String,
    pub admin_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Investments {
    pub default_earnings_cap_bps: i64,
}

impl Default for Investments {
    fn default() -> Self {
        Investments {
            default_earnings_cap_bps: 20_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub schedule: Vec<i64>,
}

impl Default for Rewards {
    fn default() -> Self {
        Rewards {
            schedule: vec![100, 200, 300, 400, 500, 600, 1_000],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Withdrawals {
    pub min_amount: i64,
    pub fee_bps: i64,
}

impl Default for Withdrawals {
    fn default() -> Self {
        Withdrawals {
            min_amount: 1_000,
            fee_bps: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub server: Server,
    #[serde(default)]
    pub investments: Investments,
    #[serde(default)]
    pub referrals: ReferralRates,
    #[serde(default)]
    pub rewards: Rewards,
    #[serde(default)]
    pub withdrawals: Withdrawals,
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("INVEST").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rates = self
            .referrals
            .as_slice()
            .into_iter()
            .chain([self.withdrawals.fee_bps]);
        for rate in rates {
            if !(0..=BPS_DENOMINATOR).contains(&rate) {
                return Err(ConfigError::Message(format!(
                    "Rate {} bps is outside 0..={}",
                    rate, BPS_DENOMINATOR
                )));
            }
        }

        if self.investments.default_earnings_cap_bps <= 0 {
            return Err(ConfigError::Message(
                "investments.default_earnings_cap_bps must be positive".to_string(),
            ));
        }
        if self.rewards.schedule.is_empty() || self.rewards.schedule.iter().any(|r| *r < 0) {
            return Err(ConfigError::Message(
                "rewards.schedule must be a non-empty list of non-negative amounts".to_string(),
            ));
        }
        if self.withdrawals.min_amount <= 0 {
            return Err(ConfigError::Message(
                "withdrawals.min_amount must be positive".to_string(),
            ));
        }
        if self.server.cron_secret.is_empty() || self.server.admin_secret.is_empty() {
            return Err(ConfigError::Message(
                "server.cron_secret and server.admin_secret must be set".to_string(),
            ));
        }

        Ok(())
    }
}
