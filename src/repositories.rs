pub mod investments;
pub mod notifications;
pub mod projects;
pub mod referrals;
pub mod rewards;
pub mod transactions;
pub mod users;
pub mod wallets;

/// True when the error chain bottoms out in a Postgres unique-constraint violation.
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod testing;
