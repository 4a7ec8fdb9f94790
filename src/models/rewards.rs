use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct DailyReward {
    pub id: String,
    pub user_id: String,
    pub reward_date: NaiveDate,
    pub streak: i32,
    pub amount: i64,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RewardStatus {
    pub claimable: bool,
    pub current_streak: u32,
    pub next_streak: u32,
    pub next_amount: i64,
    pub last_claimed: Option<NaiveDate>,
}

/// Streak a claim made on `today` would reach, or `None` when today was already claimed.
pub fn next_streak(last_claim: Option<(NaiveDate, u32)>, today: NaiveDate) -> Option<u32> {
    match last_claim {
        None => Some(1),
        Some((date, _)) if date >= today => None,
        Some((date, streak)) if date.succ_opt() == Some(today) => Some(streak.saturating_add(1)),
        Some(_) => Some(1),
    }
}

/// The last schedule entry repeats once the streak outgrows the schedule.
pub fn reward_for_streak(schedule: &[i64], streak: u32) -> i64 {
    if schedule.is_empty() || streak == 0 {
        return 0;
    }
    let index = (streak as usize).min(schedule.len()) - 1;
    schedule[index]
}

pub fn reward_status(
    schedule: &[i64],
    last: Option<&DailyReward>,
    today: NaiveDate,
) -> RewardStatus {
    let last_claim = last.map(|r| (r.reward_date, r.streak.max(0) as u32));
    let current_streak = match last_claim {
        Some((date, streak)) if date.succ_opt() >= Some(today) => streak,
        _ => 0,
    };

    match next_streak(last_claim, today) {
        Some(streak) => RewardStatus {
            claimable: true,
            current_streak,
            next_streak: streak,
            next_amount: reward_for_streak(schedule, streak),
            last_claimed: last_claim.map(|(date, _)| date),
        },
        None => {
            let upcoming = current_streak.saturating_add(1);
            RewardStatus {
                claimable: false,
                current_streak,
                next_streak: upcoming,
                next_amount: reward_for_streak(schedule, upcoming),
                last_claimed: last_claim.map(|(date, _)| date),
            }
        }
    }
}
