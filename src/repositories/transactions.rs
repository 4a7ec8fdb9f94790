use crate::models::{
    new_id,
    transactions::{NewTransaction, Transaction, TransactionStatus},
};
use sqlx::{PgConnection, PgPool};

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, anyhow::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }

    pub async fn sum_completed(&self, user_id: &str, kind: &str) -> Result<i64, anyhow::Error> {
        let amount: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(amount), 0)::BIGINT FROM transactions
            WHERE user_id = $1 AND kind = $2 AND status = 'completed'"#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(&self.conn)
        .await?;

        Ok(amount)
    }
}

pub async fn insert_transaction(
    conn: &mut PgConnection,
    new: &NewTransaction,
) -> Result<Transaction, anyhow::Error> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"INSERT INTO transactions
        (id, user_id, kind, amount, status, reference)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *"#,
    )
    .bind(new_id())
    .bind(&new.user_id)
    .bind(new.kind.as_str())
    .bind(new.amount)
    .bind(new.status.as_str())
    .bind(&new.reference)
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}

pub async fn fetch_transaction_for_update(
    conn: &mut PgConnection,
    id: &str,
) -> Result<Option<Transaction>, anyhow::Error> {
    let transaction =
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

    Ok(transaction)
}

pub async fn update_transaction_status(
    conn: &mut PgConnection,
    id: &str,
    status: TransactionStatus,
) -> Result<Transaction, anyhow::Error> {
    let transaction = sqlx::query_as::<_, Transaction>(
        "UPDATE transactions SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(status.as_str())
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(transaction)
}
