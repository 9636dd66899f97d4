use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, Transaction};

use crate::application::{BalanceSheetEntry, UserExpense, UserOwedTotal};
use crate::domain::{
    DATE_FORMAT, DATE_TIME_FORMAT, Expense, ExpenseId, NewExpense, NewUser, Participation,
    SplitMethod, User, UserId, format_date_time,
};

use super::MIGRATION_001_INITIAL;

/// SQLite rejects statements with more than 32766 bind variables, and each
/// participation row binds three.
const PARTICIPATIONS_PER_INSERT: usize = 32_766 / 3;

/// Repository for persisting and querying users, expenses and participations.
///
/// The pool is the ledger store: every write that spans more than one row runs
/// inside a single transaction obtained from it.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Access the underlying pool (used by tests to inject failures).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================
    // User operations
    // ========================

    /// Save a new user and return the assigned ID.
    pub async fn save_user(&self, user: &NewUser) -> Result<UserId> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, first_name, middle_name, last_name, mobile_number, joined_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.middle_name)
        .bind(&user.last_name)
        .bind(&user.mobile_number)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;

        Ok(result.last_insert_rowid())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, first_name, middle_name, last_name, mobile_number, joined_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, first_name, middle_name, last_name, mobile_number, joined_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let joined_at_str: String = row.get("joined_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            first_name: row.get("first_name"),
            middle_name: row.get("middle_name"),
            last_name: row.get("last_name"),
            mobile_number: row.get("mobile_number"),
            joined_at: DateTime::parse_from_rfc3339(&joined_at_str)
                .context("Invalid joined_at timestamp")?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .context("Invalid updated_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Expense operations
    // ========================

    /// Save an expense together with all of its participations.
    ///
    /// Both writes share one transaction: either the expense and every share are
    /// committed, or the transaction is rolled back and nothing is visible.
    pub async fn record_expense(&self, expense: &NewExpense) -> Result<ExpenseId> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        match Self::insert_expense(&mut tx, expense).await {
            Ok(expense_id) => {
                // A failed commit drops the transaction, which rolls it back
                tx.commit()
                    .await
                    .context("Failed to commit expense transaction")?;
                Ok(expense_id)
            }
            Err(err) => {
                tracing::warn!("rolling back expense '{}': {err:#}", expense.title);
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!("failed to roll back expense transaction: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    async fn insert_expense(
        tx: &mut Transaction<'static, Sqlite>,
        expense: &NewExpense,
    ) -> Result<ExpenseId> {
        if expense.shares.is_empty() {
            bail!("Expense '{}' has no participations", expense.title);
        }

        let expense_id = sqlx::query(
            r#"
            INSERT INTO expenses (title, description, occurred_at, split_method, total_amount_millis, created_by, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.title)
        .bind(&expense.description)
        .bind(format_date_time(expense.occurred_at))
        .bind(expense.split_method.as_str())
        .bind(expense.total_amount())
        .bind(expense.created_by)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to save expense")?
        .last_insert_rowid();

        for chunk in expense.shares.chunks(PARTICIPATIONS_PER_INSERT) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO participations (expense_id, user_id, amount_owed_millis) ",
            );
            builder.push_values(chunk, |mut row, share| {
                row.push_bind(expense_id)
                    .push_bind(share.participant_id)
                    .push_bind(share.amount);
            });
            builder
                .build()
                .execute(&mut **tx)
                .await
                .context("Failed to save participations")?;
        }

        Ok(expense_id)
    }

    /// Get an expense by ID.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, occurred_at, split_method, total_amount_millis, created_by
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch expense")?;

        row.as_ref().map(Self::row_to_expense).transpose()
    }

    /// List expenses ordered by occurrence, optionally restricted to one day.
    pub async fn list_expenses(&self, date: Option<NaiveDate>) -> Result<Vec<Expense>> {
        let mut query = String::from(
            "SELECT id, title, description, occurred_at, split_method, total_amount_millis, created_by FROM expenses",
        );
        if date.is_some() {
            query.push_str(" WHERE date(occurred_at) = ?");
        }
        query.push_str(" ORDER BY occurred_at ASC, id ASC");

        let mut sql_query = sqlx::query(&query);
        if let Some(date) = date {
            sql_query = sql_query.bind(date.format(DATE_FORMAT).to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    /// List the participations of an expense in insertion order.
    pub async fn list_participations(&self, expense_id: ExpenseId) -> Result<Vec<Participation>> {
        let rows = sqlx::query(
            r#"
            SELECT expense_id, user_id, amount_owed_millis
            FROM participations
            WHERE expense_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(expense_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list participations")?;

        Ok(rows
            .iter()
            .map(|row| Participation {
                expense_id: row.get("expense_id"),
                user_id: row.get("user_id"),
                amount_owed: row.get("amount_owed_millis"),
            })
            .collect())
    }

    /// List the expenses a user takes part in, with that user's share.
    pub async fn list_user_expenses(
        &self,
        user_id: UserId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<UserExpense>> {
        let mut query = String::from(
            r#"
            SELECT e.id, e.title, e.description, e.occurred_at, e.split_method, e.total_amount_millis, p.amount_owed_millis
            FROM expenses e
            JOIN participations p ON e.id = p.expense_id
            WHERE p.user_id = ?
            "#,
        );
        if date.is_some() {
            query.push_str(" AND date(e.occurred_at) = ?");
        }
        query.push_str(" ORDER BY e.occurred_at ASC, e.id ASC");

        let mut sql_query = sqlx::query(&query).bind(user_id);
        if let Some(date) = date {
            sql_query = sql_query.bind(date.format(DATE_FORMAT).to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list expenses for user")?;

        rows.iter()
            .map(|row| {
                let occurred_at: String = row.get("occurred_at");
                let split_method: String = row.get("split_method");
                Ok(UserExpense {
                    expense_id: row.get("id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    occurred_at: Self::parse_occurred_at(&occurred_at)?,
                    split_method: Self::parse_split_method(&split_method)?,
                    total_amount: row.get("total_amount_millis"),
                    amount_owed: row.get("amount_owed_millis"),
                })
            })
            .collect()
    }

    /// Sum what every user owes, optionally counting only expenses of one day.
    /// Users without participations are reported with zero.
    pub async fn user_owed_totals(&self, date: Option<NaiveDate>) -> Result<Vec<UserOwedTotal>> {
        let mut query = String::from(
            r#"
            SELECT u.id AS user_id, u.email, COALESCE(SUM(owed.amount_owed_millis), 0) AS total_owed
            FROM users u
            LEFT JOIN (
                SELECT p.user_id, p.amount_owed_millis
                FROM participations p
                JOIN expenses e ON e.id = p.expense_id
            "#,
        );
        if date.is_some() {
            query.push_str(" WHERE date(e.occurred_at) = ?");
        }
        query.push_str(") owed ON owed.user_id = u.id GROUP BY u.id, u.email ORDER BY u.id");

        let mut sql_query = sqlx::query(&query);
        if let Some(date) = date {
            sql_query = sql_query.bind(date.format(DATE_FORMAT).to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute user totals")?;

        Ok(rows
            .iter()
            .map(|row| UserOwedTotal {
                user_id: row.get("user_id"),
                email: row.get("email"),
                total_owed: row.get("total_owed"),
            })
            .collect())
    }

    /// One row per (user, expense) participation, ordered by user then occurrence.
    pub async fn list_balance_sheet(&self, date: Option<NaiveDate>) -> Result<Vec<BalanceSheetEntry>> {
        let mut query = String::from(
            r#"
            SELECT u.id AS user_id, u.email, e.id AS expense_id, e.title, e.description, e.occurred_at, p.amount_owed_millis
            FROM users u
            JOIN participations p ON u.id = p.user_id
            JOIN expenses e ON p.expense_id = e.id
            "#,
        );
        if date.is_some() {
            query.push_str(" WHERE date(e.occurred_at) = ?");
        }
        query.push_str(" ORDER BY u.id, e.occurred_at ASC, e.id ASC");

        let mut sql_query = sqlx::query(&query);
        if let Some(date) = date {
            sql_query = sql_query.bind(date.format(DATE_FORMAT).to_string());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list balance sheet")?;

        rows.iter()
            .map(|row| {
                let occurred_at: String = row.get("occurred_at");
                Ok(BalanceSheetEntry {
                    user_id: row.get("user_id"),
                    email: row.get("email"),
                    expense_id: row.get("expense_id"),
                    title: row.get("title"),
                    description: row.get("description"),
                    occurred_at: Self::parse_occurred_at(&occurred_at)?,
                    amount_owed: row.get("amount_owed_millis"),
                })
            })
            .collect()
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let occurred_at: String = row.get("occurred_at");
        let split_method: String = row.get("split_method");

        Ok(Expense {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            occurred_at: Self::parse_occurred_at(&occurred_at)?,
            split_method: Self::parse_split_method(&split_method)?,
            total_amount: row.get("total_amount_millis"),
            created_by: row.get("created_by"),
        })
    }

    fn parse_occurred_at(value: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
            .with_context(|| format!("Invalid occurred_at timestamp: {}", value))
    }

    fn parse_split_method(value: &str) -> Result<SplitMethod> {
        SplitMethod::from_str(value)
            .ok_or_else(|| anyhow::anyhow!("Invalid split method: {}", value))
    }
}
