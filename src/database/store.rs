use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Loan, LoanDetails, LoanStatus, User};

/// Loan table operations. Every call is a single-record read or write,
/// except the two index-backed listings.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// `by_user` index
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Loan>, DatabaseError>;

    /// `by_status` index, scoped to one owner
    async fn list_by_status(&self, owner: Uuid, status: LoanStatus) -> Result<Vec<Loan>, DatabaseError>;

    async fn insert_loan(&self, loan: &Loan) -> Result<(), DatabaseError>;

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, DatabaseError>;

    /// Fails with `NotFound` when the row is gone
    async fn update_loan_details(&self, id: Uuid, details: &LoanDetails) -> Result<(), DatabaseError>;

    /// Fails with `NotFound` when the row is gone
    async fn update_loan_status(&self, id: Uuid, status: LoanStatus) -> Result<(), DatabaseError>;

    /// Fails with `NotFound` when the row is gone
    async fn delete_loan(&self, id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
}

#[async_trait]
pub trait Store: LoanStore + UserStore {
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub type SharedStore = Arc<dyn Store>;
