use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthUser, Session};
use crate::database::models::{Loan, LoanDetails, LoanStatus};
use crate::database::{DatabaseError, SharedStore};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not authenticated")]
    NotAuthenticated,
    /// Covers both "no such loan" and "someone else's loan"
    #[error("Loan not found or unauthorized")]
    NotFoundOrUnauthorized,
    #[error(transparent)]
    Store(DatabaseError),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            // Row vanished between the ownership check and the write
            DatabaseError::NotFound(_) => ServiceError::NotFoundOrUnauthorized,
            other => ServiceError::Store(other),
        }
    }
}

/// Every loan operation: resolve caller, check ownership where a record is
/// targeted, then one store call.
pub struct LoanService {
    store: SharedStore,
}

impl LoanService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All loans owned by the caller, optionally narrowed to one status
    pub async fn list(&self, session: &Session, status: Option<LoanStatus>) -> Result<Vec<Loan>, ServiceError> {
        let caller = require_caller(session)?;
        let loans = match status {
            Some(status) => self.store.list_by_status(caller.user_id, status).await?,
            None => self.store.list_by_owner(caller.user_id).await?,
        };
        Ok(loans)
    }

    pub async fn create(&self, session: &Session, details: LoanDetails) -> Result<Uuid, ServiceError> {
        let caller = require_caller(session)?;
        let loan = Loan::open(caller.user_id, details, Utc::now());
        self.store.insert_loan(&loan).await?;
        debug!("User {} created loan {}", caller.user_id, loan.id);
        Ok(loan.id)
    }

    pub async fn get(&self, session: &Session, loan_id: &str) -> Result<Loan, ServiceError> {
        self.owned_loan(session, loan_id).await
    }

    pub async fn update(&self, session: &Session, loan_id: &str, details: LoanDetails) -> Result<(), ServiceError> {
        let loan = self.owned_loan(session, loan_id).await?;
        self.store.update_loan_details(loan.id, &details).await?;
        Ok(())
    }

    pub async fn update_status(&self, session: &Session, loan_id: &str, status: LoanStatus) -> Result<(), ServiceError> {
        let loan = self.owned_loan(session, loan_id).await?;
        self.store.update_loan_status(loan.id, status).await?;
        debug!("Loan {} status {} -> {}", loan.id, loan.status, status);
        Ok(())
    }

    pub async fn remove(&self, session: &Session, loan_id: &str) -> Result<(), ServiceError> {
        let loan = self.owned_loan(session, loan_id).await?;
        self.store.delete_loan(loan.id).await?;
        debug!("Loan {} removed", loan.id);
        Ok(())
    }

    async fn owned_loan(&self, session: &Session, loan_id: &str) -> Result<Loan, ServiceError> {
        let caller = require_caller(session)?;
        // An unparseable id cannot name any loan the caller owns
        let id = Uuid::parse_str(loan_id).map_err(|_| ServiceError::NotFoundOrUnauthorized)?;

        match self.store.get_loan(id).await? {
            Some(loan) if loan.user_id == caller.user_id => Ok(loan),
            _ => Err(ServiceError::NotFoundOrUnauthorized),
        }
    }
}

fn require_caller(session: &Session) -> Result<&AuthUser, ServiceError> {
    session.caller().ok_or(ServiceError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn service() -> LoanService {
        LoanService::new(Arc::new(MemoryStore::new()))
    }

    fn session() -> Session {
        Session::authenticated(AuthUser {
            user_id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
        })
    }

    fn jane() -> LoanDetails {
        LoanDetails {
            borrower_name: "Jane Doe".to_string(),
            amount: Decimal::from(1000),
            interest_rate: Decimal::from(5),
            term: 12,
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn anonymous_callers_are_rejected_everywhere() {
        let svc = service();
        let owner = session();
        let id = svc.create(&owner, jane()).await.unwrap().to_string();
        let anon = Session::anonymous();

        assert!(matches!(svc.list(&anon, None).await, Err(ServiceError::NotAuthenticated)));
        assert!(matches!(svc.create(&anon, jane()).await, Err(ServiceError::NotAuthenticated)));
        assert!(matches!(svc.get(&anon, &id).await, Err(ServiceError::NotAuthenticated)));
        assert!(matches!(svc.update(&anon, &id, jane()).await, Err(ServiceError::NotAuthenticated)));
        assert!(matches!(
            svc.update_status(&anon, &id, LoanStatus::Paid).await,
            Err(ServiceError::NotAuthenticated)
        ));
        assert!(matches!(svc.remove(&anon, &id).await, Err(ServiceError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn create_then_list_returns_one_pending_loan() {
        let svc = service();
        let owner = session();
        let before = Utc::now();
        let id = svc.create(&owner, jane()).await.unwrap();

        let loans = svc.list(&owner, None).await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].id, id);
        assert_eq!(loans[0].status, LoanStatus::Pending);
        assert_eq!(loans[0].user_id, owner.caller().unwrap().user_id);
        assert!(loans[0].start_date >= before && loans[0].start_date <= Utc::now());
    }

    #[tokio::test]
    async fn status_change_is_visible_through_get() {
        let svc = service();
        let owner = session();
        let id = svc.create(&owner, jane()).await.unwrap().to_string();

        svc.update_status(&owner, &id, LoanStatus::Active).await.unwrap();
        assert_eq!(svc.get(&owner, &id).await.unwrap().status, LoanStatus::Active);

        // Any state may follow any other
        svc.update_status(&owner, &id, LoanStatus::Pending).await.unwrap();
        assert_eq!(svc.get(&owner, &id).await.unwrap().status, LoanStatus::Pending);
    }

    #[tokio::test]
    async fn other_users_cannot_see_or_touch_a_loan() {
        let svc = service();
        let owner = session();
        let intruder = session();
        let id = svc.create(&owner, jane()).await.unwrap().to_string();

        assert!(svc.list(&intruder, None).await.unwrap().is_empty());
        assert!(matches!(svc.get(&intruder, &id).await, Err(ServiceError::NotFoundOrUnauthorized)));
        assert!(matches!(
            svc.update(&intruder, &id, jane()).await,
            Err(ServiceError::NotFoundOrUnauthorized)
        ));
        assert!(matches!(
            svc.update_status(&intruder, &id, LoanStatus::Defaulted).await,
            Err(ServiceError::NotFoundOrUnauthorized)
        ));
        assert!(matches!(svc.remove(&intruder, &id).await, Err(ServiceError::NotFoundOrUnauthorized)));

        // Untouched for the owner
        let loan = svc.get(&owner, &id).await.unwrap();
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.borrower_name, "Jane Doe");
    }

    #[tokio::test]
    async fn update_keeps_status_owner_and_start_date() {
        let svc = service();
        let owner = session();
        let id = svc.create(&owner, jane()).await.unwrap().to_string();
        svc.update_status(&owner, &id, LoanStatus::Active).await.unwrap();
        let before = svc.get(&owner, &id).await.unwrap();

        let edited = LoanDetails {
            borrower_name: "Jane Q. Doe".to_string(),
            amount: Decimal::new(125050, 2),
            interest_rate: Decimal::new(45, 1),
            term: 18,
            description: "renegotiated".to_string(),
        };
        svc.update(&owner, &id, edited.clone()).await.unwrap();

        let after = svc.get(&owner, &id).await.unwrap();
        assert_eq!(after.borrower_name, edited.borrower_name);
        assert_eq!(after.amount, edited.amount);
        assert_eq!(after.interest_rate, edited.interest_rate);
        assert_eq!(after.term, 18);
        assert_eq!(after.description, "renegotiated");
        assert_eq!(after.status, LoanStatus::Active);
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.start_date, before.start_date);
    }

    #[tokio::test]
    async fn removed_loan_is_gone() {
        let svc = service();
        let owner = session();
        let id = svc.create(&owner, jane()).await.unwrap().to_string();

        svc.remove(&owner, &id).await.unwrap();
        assert!(matches!(svc.get(&owner, &id).await, Err(ServiceError::NotFoundOrUnauthorized)));
        assert!(matches!(svc.remove(&owner, &id).await, Err(ServiceError::NotFoundOrUnauthorized)));
        assert!(svc.list(&owner, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_ids_look_like_missing_loans() {
        let svc = service();
        let owner = session();
        assert!(matches!(
            svc.get(&owner, "not-a-uuid").await,
            Err(ServiceError::NotFoundOrUnauthorized)
        ));
    }

    #[tokio::test]
    async fn list_can_narrow_by_status() {
        let svc = service();
        let owner = session();
        let first = svc.create(&owner, jane()).await.unwrap().to_string();
        svc.create(&owner, jane()).await.unwrap();
        svc.update_status(&owner, &first, LoanStatus::Paid).await.unwrap();

        let paid = svc.list(&owner, Some(LoanStatus::Paid)).await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id.to_string(), first);
        assert_eq!(svc.list(&owner, Some(LoanStatus::Pending)).await.unwrap().len(), 1);
        assert!(svc.list(&owner, Some(LoanStatus::Defaulted)).await.unwrap().is_empty());
    }
}
