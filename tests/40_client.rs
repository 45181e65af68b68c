mod common;

use anyhow::Result;
use loan_ledger::cli::client::ApiClient;
use loan_ledger::database::models::{LoanDetails, LoanStatus};
use loan_ledger::services::Credentials;
use rust_decimal::Decimal;

fn details() -> LoanDetails {
    LoanDetails {
        borrower_name: "Jane Doe".to_string(),
        amount: Decimal::from(1000),
        interest_rate: Decimal::from(5),
        term: 12,
        description: "test".to_string(),
    }
}

#[tokio::test]
async fn cli_client_drives_the_full_api() -> Result<()> {
    let server = common::start_server().await?;

    let anonymous = ApiClient::new(server.base_url.clone(), None);
    let grant = anonymous
        .register(&Credentials { email: "cli@example.com".to_string(), password: "correct-horse".to_string() })
        .await?;
    let client = ApiClient::new(server.base_url.clone(), Some(grant.token));

    assert_eq!(client.whoami().await?.email, "cli@example.com");

    let id = client.create_loan(&details()).await?.to_string();
    let loans = client.list_loans(None).await?;
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].status, LoanStatus::Pending);
    assert_eq!(loans[0].amount, Decimal::from(1000));

    client.update_status(&id, LoanStatus::Paid).await?;
    assert!(client.list_loans(Some(LoanStatus::Pending)).await?.is_empty());
    assert_eq!(client.get_loan(&id).await?.status, LoanStatus::Paid);

    client.delete_loan(&id).await?;
    let err = client.get_loan(&id).await.expect_err("deleted loan should be gone");
    assert!(err.to_string().contains("404"), "unexpected error: {}", err);
    Ok(())
}

#[tokio::test]
async fn cli_client_surfaces_auth_errors() -> Result<()> {
    let server = common::start_server().await?;
    let client = ApiClient::new(server.base_url.clone(), None);

    let err = client.list_loans(None).await.expect_err("anonymous list should fail");
    assert!(err.to_string().contains("401"), "unexpected error: {}", err);
    Ok(())
}
