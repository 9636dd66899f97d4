use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::domain::{
    Expense, ExpenseId, NewUser, Participation, User, UserId, is_valid_email,
    is_valid_mobile_number, parse_filter_date,
};
use crate::storage::Repository;

use super::{AppError, BalanceSheetEntry, ExpenseRequest, OverallReport, UserExpense};

/// Application service providing high-level operations for the expense ledger.
/// This is the primary interface for any client (HTTP API, CLI, tests).
pub struct ExpenseService {
    repo: Repository,
}

/// A user registration as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile_number: Option<String>,
}

/// Look a user up by id or, when no id is given, by email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLookup {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// Both sheets of the balance sheet export
pub struct BalanceSheet {
    pub date: Option<NaiveDate>,
    pub individual: Vec<BalanceSheetEntry>,
    pub overall: Vec<Expense>,
}

impl ExpenseService {
    /// Create a new expense service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Expense operations
    // ========================

    /// Validate, split and atomically record a new expense.
    ///
    /// Validation failures are returned before anything touches the database.
    /// A store failure rolls the whole expense back and surfaces as
    /// `AppError::Database`.
    pub async fn record_expense(&self, request: ExpenseRequest) -> Result<ExpenseId, AppError> {
        let expense = request.validate(Local::now().naive_local())?;

        let expense_id = self.repo.record_expense(&expense).await?;

        tracing::info!(
            expense_id,
            created_by = expense.created_by,
            participants = expense.shares.len(),
            method = %expense.split_method,
            "recorded expense"
        );
        Ok(expense_id)
    }

    /// Get an expense with its participations.
    pub async fn get_expense(
        &self,
        id: ExpenseId,
    ) -> Result<Option<(Expense, Vec<Participation>)>, AppError> {
        let Some(expense) = self.repo.get_expense(id).await? else {
            return Ok(None);
        };
        let participations = self.repo.list_participations(id).await?;
        Ok(Some((expense, participations)))
    }

    /// List the expenses a user takes part in, optionally for a single day.
    pub async fn list_user_expenses(
        &self,
        user_id: UserId,
        date: Option<&str>,
    ) -> Result<Vec<UserExpense>, AppError> {
        let date = Self::filter_date(date)?;
        Ok(self.repo.list_user_expenses(user_id, date).await?)
    }

    /// Summarize all expenses and what every user owes, optionally for a single day.
    pub async fn overall_report(&self, date: Option<&str>) -> Result<OverallReport, AppError> {
        let date = Self::filter_date(date)?;
        let expenses = self.repo.list_expenses(date).await?;
        let user_summary = self.repo.user_owed_totals(date).await?;
        Ok(OverallReport::new(expenses, user_summary))
    }

    /// Collect both balance sheet tables, optionally for a single day.
    pub async fn balance_sheet(&self, date: Option<&str>) -> Result<BalanceSheet, AppError> {
        let date = Self::filter_date(date)?;
        Ok(BalanceSheet {
            date,
            individual: self.repo.list_balance_sheet(date).await?,
            overall: self.repo.list_expenses(date).await?,
        })
    }

    fn filter_date(date: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
        match date {
            Some(raw) if !raw.is_empty() => {
                Ok(Some(parse_filter_date(raw, Local::now().date_naive())?))
            }
            _ => Ok(None),
        }
    }

    // ========================
    // User operations
    // ========================

    /// Register a new user.
    pub async fn create_user(&self, request: UserRequest) -> Result<UserId, AppError> {
        let (Some(email), Some(first_name), Some(last_name), Some(mobile_number)) = (
            request.email.filter(|s| !s.is_empty()),
            request.first_name.filter(|s| !s.is_empty()),
            request.last_name.filter(|s| !s.is_empty()),
            request.mobile_number.filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::MissingFields(
                "Required fields are missing".to_string(),
            ));
        };

        if !is_valid_mobile_number(&mobile_number) {
            return Err(AppError::InvalidMobileNumber(mobile_number));
        }
        if !is_valid_email(&email) {
            return Err(AppError::InvalidEmail(email));
        }

        if self.repo.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(email));
        }

        let user = NewUser {
            email,
            first_name,
            middle_name: request.middle_name.filter(|s| !s.is_empty()),
            last_name,
            mobile_number,
        };
        let id = self.repo.save_user(&user).await?;

        tracing::info!(user_id = id, "created user");
        Ok(id)
    }

    /// Find a user by id, or by email when no id is given.
    pub async fn find_user(&self, lookup: UserLookup) -> Result<User, AppError> {
        let id = lookup.id.filter(|s| !s.is_empty());
        let email = lookup.email.filter(|s| !s.is_empty());

        if let Some(raw_id) = id {
            let id: UserId = raw_id
                .trim()
                .parse()
                .map_err(|_| AppError::InvalidIdFormat(raw_id.clone()))?;
            return self.get_user(id).await;
        }

        let Some(email) = email else {
            return Err(AppError::MissingLookupKey);
        };
        if !is_valid_email(&email) {
            return Err(AppError::InvalidEmail(email));
        }
        match self.repo.get_user_by_email(&email).await? {
            Some(user) => Ok(user),
            None => Err(AppError::UserNotFound(email)),
        }
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }
}
