pub mod loan;
pub mod user;

pub use loan::{CreatedLoan, InvalidStatus, Loan, LoanDetails, LoanStatus, StatusChange};
pub use user::{User, UserProfile};
