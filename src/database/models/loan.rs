use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a loan. Any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Paid,
    Defaulted,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Pending,
        LoanStatus::Active,
        LoanStatus::Paid,
        LoanStatus::Defaulted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Paid => "paid",
            LoanStatus::Defaulted => "defaulted",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid loan status '{0}' (expected one of: pending, active, paid, defaulted)")]
pub struct InvalidStatus(pub String);

impl FromStr for LoanStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LoanStatus::Pending),
            "active" => Ok(LoanStatus::Active),
            "paid" => Ok(LoanStatus::Paid),
            "defaulted" => Ok(LoanStatus::Defaulted),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// A stored loan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub borrower_name: String,
    pub amount: Decimal,
    /// Percentage, e.g. 5 means 5%
    pub interest_rate: Decimal,
    /// Months
    pub term: i32,
    pub status: LoanStatus,
    pub start_date: DateTime<Utc>,
    pub description: String,
}

impl Loan {
    /// Fresh record owned by `user_id`: always pending, started at `now`.
    pub fn open(user_id: Uuid, details: LoanDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            borrower_name: details.borrower_name,
            amount: details.amount,
            interest_rate: details.interest_rate,
            term: details.term,
            status: LoanStatus::Pending,
            start_date: now,
            description: details.description,
        }
    }

    /// Overwrite the editable fields. Owner, status and start date stay put.
    pub fn apply_details(&mut self, details: &LoanDetails) {
        self.borrower_name = details.borrower_name.clone();
        self.amount = details.amount;
        self.interest_rate = details.interest_rate;
        self.term = details.term;
        self.description = details.description.clone();
    }
}

/// Caller-supplied fields for create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoanDetails {
    pub borrower_name: String,
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub term: i32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChange {
    pub status: LoanStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreatedLoan {
    pub id: Uuid,
}
