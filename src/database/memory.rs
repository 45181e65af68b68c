use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Loan, LoanDetails, LoanStatus, User};
use crate::database::store::{LoanStore, Store, UserStore};

#[derive(Default)]
struct Tables {
    loans: HashMap<Uuid, Loan>,
    by_user: HashMap<Uuid, HashSet<Uuid>>,
    by_status: HashMap<LoanStatus, HashSet<Uuid>>,
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
}

impl Tables {
    fn collect(&self, ids: impl Iterator<Item = Uuid>) -> Vec<Loan> {
        let mut loans: Vec<Loan> = ids.filter_map(|id| self.loans.get(&id).cloned()).collect();
        loans.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        loans
    }

    fn reindex_status(&mut self, id: Uuid, from: LoanStatus, to: LoanStatus) {
        if let Some(set) = self.by_status.get_mut(&from) {
            set.remove(&id);
        }
        self.by_status.entry(to).or_default().insert(id);
    }
}

/// In-process store for development and tests. Keeps the same two
/// secondary indexes as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("loan {}", id))
}

#[async_trait]
impl LoanStore for MemoryStore {
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Loan>, DatabaseError> {
        let tables = self.tables.read().await;
        let ids = tables.by_user.get(&owner).into_iter().flatten().copied();
        Ok(tables.collect(ids))
    }

    async fn list_by_status(&self, owner: Uuid, status: LoanStatus) -> Result<Vec<Loan>, DatabaseError> {
        let tables = self.tables.read().await;
        let owned = tables.by_user.get(&owner);
        let ids = tables
            .by_status
            .get(&status)
            .into_iter()
            .flatten()
            .filter(|id| owned.map_or(false, |set| set.contains(*id)))
            .copied();
        Ok(tables.collect(ids))
    }

    async fn insert_loan(&self, loan: &Loan) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.loans.contains_key(&loan.id) {
            return Err(DatabaseError::Conflict(format!("loan {}", loan.id)));
        }
        tables.by_user.entry(loan.user_id).or_default().insert(loan.id);
        tables.by_status.entry(loan.status).or_default().insert(loan.id);
        tables.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn get_loan(&self, id: Uuid) -> Result<Option<Loan>, DatabaseError> {
        Ok(self.tables.read().await.loans.get(&id).cloned())
    }

    async fn update_loan_details(&self, id: Uuid, details: &LoanDetails) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let loan = tables.loans.get_mut(&id).ok_or_else(|| missing(id))?;
        loan.apply_details(details);
        Ok(())
    }

    async fn update_loan_status(&self, id: Uuid, status: LoanStatus) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let loan = tables.loans.get_mut(&id).ok_or_else(|| missing(id))?;
        let previous = std::mem::replace(&mut loan.status, status);
        tables.reindex_status(id, previous, status);
        Ok(())
    }

    async fn delete_loan(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let loan = tables.loans.remove(&id).ok_or_else(|| missing(id))?;
        if let Some(set) = tables.by_user.get_mut(&loan.user_id) {
            set.remove(&id);
        }
        if let Some(set) = tables.by_status.get_mut(&loan.status) {
            set.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users_by_email.contains_key(&user.email) {
            return Err(DatabaseError::Conflict(format!("email {}", user.email)));
        }
        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
