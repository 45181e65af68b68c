pub mod account_service;
pub mod loan_service;

pub use account_service::{AccountService, AuthError, Credentials, SessionGrant};
pub use loan_service::{LoanService, ServiceError};
