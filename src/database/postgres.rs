use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Loan, LoanDetails, LoanStatus, User};
use crate::database::store::{LoanStore, Store, UserStore};

const LOAN_COLUMNS: &str =
    "id, user_id, borrower_name, amount, interest_rate, term, status, start_date, description";

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        info!("Ensuring loan-ledger schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS loans (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                borrower_name TEXT NOT NULL,
                amount NUMERIC NOT NULL,
                interest_rate NUMERIC NOT NULL,
                term INTEGER NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'paid', 'defaulted')),
                start_date TIMESTAMPTZ NOT NULL,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS loans_by_user ON loans (user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS loans_by_status ON loans (status)")
            .execute(&self.pool)
            .await?;

        info!("Schema ready");
        Ok(())
    }

    fn loan_from_row(row: &PgRow) -> Result<Loan, DatabaseError> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<LoanStatus>()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(Loan {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            borrower_name: row.try_get("borrower_name")?,
            amount: row.try_get("amount")?,
            interest_rate: row.try_get("interest_rate")?,
            term: row.try_get("term")?,
            status,
            start_date: row.try_get("start_date")?,
            description: row.try_get("description")?,
        })
    }

    fn user_from_row(row: &PgRow) -> Result<User, DatabaseError> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            salt: row.try_get("salt")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn expect_one(rows_affected: u64, id: Uuid) -> Result<(), DatabaseError> {
        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(format!("loan {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl LoanStore for PgStore {
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Loan>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM loans WHERE user_id = $1 ORDER BY start_date, id",
            LOAN_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(owner).fetch_all(&self.pool).await?;
        rows.iter().map(Self::loan_from_row).collect()
    }

    async fn list_by_status(&self, owner: Uuid, status: LoanStatus) -> Result<Vec<Loan>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM loans WHERE status = $1 AND user_id = $2 ORDER BY start_date, id",
            LOAN_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::loan_from_row).collect()
    }

    async fn insert_loan(&self, loan: &Loan) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO loans ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            LOAN_COLUMNS
        );
        sqlx::query(&sql)
            .bind(loan.id)
            .bind(loan.user_id)
            .bind(&loan.borrower_name)
            .bind(loan.amount)
            .bind(loan.interest_rate)
            .bind(loan.term)
            .bind(loan.status.as_str())
            .bind(loan.start_date)
            .bind(&loan.description)
            .execute(&self.pool)
            .await?;

        debug!("Inserted loan {}", loan.id);
        Ok(())
    }

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, DatabaseError> {
        let sql = format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::loan_from_row).transpose()
    }

    async fn update_loan_details(&self, id: Uuid, details: &LoanDetails) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET borrower_name = $2, amount = $3, interest_rate = $4, term = $5, description = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&details.borrower_name)
        .bind(details.amount)
        .bind(details.interest_rate)
        .bind(details.term)
        .bind(&details.description)
        .execute(&self.pool)
        .await?;

        Self::expect_one(result.rows_affected(), id)
    }

    async fn update_loan_status(&self, id: Uuid, status: LoanStatus) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE loans SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Self::expect_one(result.rows_affected(), id)
    }

    async fn delete_loan(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Self::expect_one(result.rows_affected(), id)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, salt, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DatabaseError::Conflict(format!("email {}", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query("SELECT id, email, password_hash, salt, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query("SELECT id, email, password_hash, salt, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::user_from_row).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
