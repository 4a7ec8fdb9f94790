use serde::{Deserialize, Serialize};

use super::wallets::WalletDelta;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Investment,
    Earning,
    PrincipalReturn,
    ReferralCommission,
    DailyReward,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Investment => "investment",
            TransactionKind::Earning => "earning",
            TransactionKind::PrincipalReturn => "principal_return",
            TransactionKind::ReferralCommission => "referral_commission",
            TransactionKind::DailyReward => "daily_reward",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "deposit" => Some(TransactionKind::Deposit),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            "investment" => Some(TransactionKind::Investment),
            "earning" => Some(TransactionKind::Earning),
            "principal_return" => Some(TransactionKind::PrincipalReturn),
            "referral_commission" => Some(TransactionKind::ReferralCommission),
            "daily_reward" => Some(TransactionKind::DailyReward),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub status: String,
    pub reference: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl Transaction {
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::parse(&self.kind)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending.as_str()
    }
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub user_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    pub status: TransactionStatus,
    pub reference: Option<String>,
}

impl NewTransaction {
    pub fn completed(
        user_id: &str,
        kind: TransactionKind,
        amount: i64,
        reference: Option<&str>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            amount,
            status: TransactionStatus::Completed,
            reference: reference.map(str::to_string),
        }
    }

    pub fn pending(
        user_id: &str,
        kind: TransactionKind,
        amount: i64,
        reference: Option<&str>,
    ) -> Self {
        Self {
            status: TransactionStatus::Pending,
            ..Self::completed(user_id, kind, amount, reference)
        }
    }
}

/// Outcome of an admin review of a pending deposit or withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn from_approved(approved: bool) -> Self {
        if approved {
            ReviewDecision::Approve
        } else {
            ReviewDecision::Reject
        }
    }

    pub fn resulting_status(&self) -> TransactionStatus {
        match self {
            ReviewDecision::Approve => TransactionStatus::Completed,
            ReviewDecision::Reject => TransactionStatus::Rejected,
        }
    }
}

/// Wallet change applied when a pending deposit or withdrawal is reviewed.
pub fn review_effect(
    kind: TransactionKind,
    amount: i64,
    decision: ReviewDecision,
) -> Option<WalletDelta> {
    let delta = match (kind, decision) {
        (TransactionKind::Deposit, ReviewDecision::Approve) => WalletDelta {
            balance: amount,
            ..Default::default()
        },
        (TransactionKind::Deposit, ReviewDecision::Reject) => WalletDelta::default(),
        (TransactionKind::Withdrawal, ReviewDecision::Approve) => WalletDelta {
            pending_withdrawal: -amount,
            ..Default::default()
        },
        (TransactionKind::Withdrawal, ReviewDecision::Reject) => WalletDelta {
            balance: amount,
            pending_withdrawal: -amount,
            ..Default::default()
        },
        _ => return None,
    };

    Some(delta)
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewRequest {
    pub approve: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_survive_their_column_representation() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::Withdrawal,
            TransactionKind::Investment,
            TransactionKind::Earning,
            TransactionKind::PrincipalReturn,
            TransactionKind::ReferralCommission,
            TransactionKind::DailyReward,
        ] {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse("swap"), None);
    }

    #[test]
    fn pending_constructor_only_changes_status() {
        let tx = NewTransaction::pending("u1", TransactionKind::Deposit, 500, Some("pix"));
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, 500);
        assert_eq!(tx.reference.as_deref(), Some("pix"));
    }

    #[test]
    fn approved_deposit_credits_balance() {
        let effect = review_effect(TransactionKind::Deposit, 700, ReviewDecision::Approve);
        assert_eq!(
            effect,
            Some(WalletDelta {
                balance: 700,
                ..Default::default()
            })
        );
    }

    #[test]
    fn rejected_withdrawal_refunds_balance() {
        let effect = review_effect(TransactionKind::Withdrawal, 700, ReviewDecision::Reject);
        assert_eq!(
            effect,
            Some(WalletDelta {
                balance: 700,
                pending_withdrawal: -700,
                ..Default::default()
            })
        );
        let approved = review_effect(TransactionKind::Withdrawal, 700, ReviewDecision::Approve);
        assert_eq!(approved.map(|e| e.balance), Some(0));
    }

    #[test]
    fn only_deposits_and_withdrawals_are_reviewable() {
        assert_eq!(
            review_effect(TransactionKind::Earning, 10, ReviewDecision::Approve),
            None
        );
    }
}
