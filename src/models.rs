pub mod investments;
pub mod notifications;
pub mod projects;
pub mod referrals;
pub mod rewards;
pub mod transactions;
pub mod users;
pub mod wallets;

/// Basis points in 100%.
pub const BPS_DENOMINATOR: i64 = 10_000;

/// Applies a basis-point rate to an amount in cents, rounding toward zero.
pub fn apply_bps(amount: i64, bps: i64) -> i64 {
    let value = (amount as i128 * bps as i128) / BPS_DENOMINATOR as i128;
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Renders cents as a decimal string, e.g. `12345` -> `"123.45"`.
pub fn format_cents(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}
