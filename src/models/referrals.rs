use serde::{Deserialize, Serialize};

use super::apply_bps;

pub const MAX_REFERRAL_LEVEL: i32 = 3;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Referral {
    pub id: String,
    pub referrer_id: String,
    pub referred_id: String,
    pub level: i32,
    pub created_at: chrono::NaiveDateTime,
}

/// A user brought in by someone else, as seen from the referrer.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ReferredUser {
    pub user_id: String,
    pub full_name: String,
    pub level: i32,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referrals: Vec<ReferredUser>,
    pub total_commissions: i64,
}

/// Commission rates per referral level, in basis points of the invested amount.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferralRates {
    pub level_1_bps: i64,
    pub level_2_bps: i64,
    pub level_3_bps: i64,
}

impl Default for ReferralRates {
    fn default() -> Self {
        ReferralRates {
            level_1_bps: 1_000,
            level_2_bps: 500,
            level_3_bps: 200,
        }
    }
}

impl ReferralRates {
    pub fn rate_for(&self, level: i32) -> i64 {
        match level {
            1 => self.level_1_bps,
            2 => self.level_2_bps,
            3 => self.level_3_bps,
            _ => 0,
        }
    }

    pub fn commission(&self, level: i32, amount: i64) -> i64 {
        apply_bps(amount, self.rate_for(level))
    }

    pub fn as_slice(&self) -> [i64; 3] {
        [self.level_1_bps, self.level_2_bps, self.level_3_bps]
    }
}

/// Builds the `(referrer_id, level)` rows for a newly registered user.
///
/// `ancestors` are the referral rows in which the direct referrer is the
/// referred party; each of them moves one level further away from the new user.
pub fn referral_chain(direct_referrer_id: &str, ancestors: &[Referral]) -> Vec<(String, i32)> {
    let mut chain = vec![(direct_referrer_id.to_string(), 1)];

    let mut upstream: Vec<&Referral> = ancestors
        .iter()
        .filter(|r| r.referred_id == direct_referrer_id && r.level < MAX_REFERRAL_LEVEL)
        .collect();
    upstream.sort_by_key(|r| r.level);

    for referral in upstream {
        if chain.iter().any(|(id, _)| id == &referral.referrer_id) {
            continue;
        }
        chain.push((referral.referrer_id.clone(), referral.level + 1));
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referral(referrer: &str, referred: &str, level: i32) -> Referral {
        Referral {
            id: format!("{referrer}-{referred}"),
            referrer_id: referrer.to_string(),
            referred_id: referred.to_string(),
            level,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn default_rates_decrease_by_level() {
        let rates = ReferralRates::default();
        assert_eq!(rates.commission(1, 100_000), 10_000);
        assert_eq!(rates.commission(2, 100_000), 5_000);
        assert_eq!(rates.commission(3, 100_000), 2_000);
        assert_eq!(rates.commission(4, 100_000), 0);
        assert_eq!(rates.commission(0, 100_000), 0);
    }

    #[test]
    fn chain_without_ancestors_is_direct_only() {
        assert_eq!(referral_chain("b", &[]), vec![("b".to_string(), 1)]);
    }

    #[test]
    fn chain_stops_at_third_level() {
        // a -> b -> c -> d, and e registers with d's code.
        let ancestors = vec![
            referral("c", "d", 1),
            referral("b", "d", 2),
            referral("a", "d", 3),
        ];
        assert_eq!(
            referral_chain("d", &ancestors),
            vec![
                ("d".to_string(), 1),
                ("c".to_string(), 2),
                ("b".to_string(), 3)
            ]
        );
    }

    #[test]
    fn chain_ignores_unrelated_rows() {
        let ancestors = vec![referral("x", "y", 1), referral("c", "d", 1)];
        assert_eq!(
            referral_chain("d", &ancestors),
            vec![("d".to_string(), 1), ("c".to_string(), 2)]
        );
    }
}
