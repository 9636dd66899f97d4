use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Expense, ExpenseId, Millis, SplitMethod, UserId};

/// An expense seen from one participant's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExpense {
    pub expense_id: ExpenseId,
    pub title: String,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub split_method: SplitMethod,
    pub total_amount: Millis,
    pub amount_owed: Millis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOwedTotal {
    pub user_id: UserId,
    pub email: String,
    pub total_owed: Millis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_expenses: usize,
    pub total_amount_spent: Millis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallReport {
    pub overall_summary: OverallSummary,
    pub expenses: Vec<Expense>,
    pub user_summary: Vec<UserOwedTotal>,
}

impl OverallReport {
    pub fn new(expenses: Vec<Expense>, user_summary: Vec<UserOwedTotal>) -> Self {
        let overall_summary = OverallSummary {
            total_expenses: expenses.len(),
            total_amount_spent: expenses.iter().map(|e| e.total_amount).sum(),
        };
        Self {
            overall_summary,
            expenses,
            user_summary,
        }
    }
}

/// One row of the individual balance sheet: a user's share of one expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetEntry {
    pub user_id: UserId,
    pub email: String,
    pub expense_id: ExpenseId,
    pub title: String,
    pub description: Option<String>,
    pub occurred_at: NaiveDateTime,
    pub amount_owed: Millis,
}
