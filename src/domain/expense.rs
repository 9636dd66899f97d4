use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Millis, Share, SplitMethod, UserId};

pub type ExpenseId = i64;

/// A shared expense. Expenses are immutable once recorded and always own at
/// least one participation, one of which belongs to the creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub description: Option<String>,
    /// When the expense happened, in the creator's local time
    pub occurred_at: NaiveDateTime,
    pub split_method: SplitMethod,
    /// Total in millis (always positive)
    pub total_amount: Millis,
    pub created_by: UserId,
}

/// A validated expense waiting to be persisted together with its shares.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub split_method: SplitMethod,
    pub created_by: UserId,
    pub shares: Vec<Share>,
}

impl NewExpense {
    /// The total is whatever the shares add up to; the split guarantees this equals
    /// the submitted amount.
    pub fn total_amount(&self) -> Millis {
        self.shares.iter().map(|s| s.amount).sum()
    }
}

/// One participant's share of a recorded expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    pub expense_id: ExpenseId,
    pub user_id: UserId,
    pub amount_owed: Millis,
}
