use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cli::config::EnvironmentConfig;
use crate::database::models::{CreatedLoan, Loan, LoanDetails, LoanStatus, UserProfile};
use crate::services::{Credentials, SessionGrant};

/// Typed client for the ledger's JSON API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_environment(env: &EnvironmentConfig) -> Self {
        Self::new(env.server_url.clone(), env.token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> anyhow::Result<Value> {
        let response = self.http.get(format!("{}/health", self.base_url)).send().await?;
        Ok(response.json().await?)
    }

    pub async fn register(&self, credentials: &Credentials) -> anyhow::Result<SessionGrant> {
        let request = self.request(Method::POST, "/auth/register").json(credentials);
        expect_data(self.send(request).await?)
    }

    pub async fn login(&self, credentials: &Credentials) -> anyhow::Result<SessionGrant> {
        let request = self.request(Method::POST, "/auth/login").json(credentials);
        expect_data(self.send(request).await?)
    }

    pub async fn whoami(&self) -> anyhow::Result<UserProfile> {
        expect_data(self.send(self.request(Method::GET, "/api/auth/whoami")).await?)
    }

    pub async fn list_loans(&self, status: Option<LoanStatus>) -> anyhow::Result<Vec<Loan>> {
        let mut request = self.request(Method::GET, "/api/loans");
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        expect_data(self.send(request).await?)
    }

    pub async fn get_loan(&self, id: &str) -> anyhow::Result<Loan> {
        expect_data(self.send(self.request(Method::GET, &format!("/api/loans/{}", id))).await?)
    }

    pub async fn create_loan(&self, details: &LoanDetails) -> anyhow::Result<Uuid> {
        let request = self.request(Method::POST, "/api/loans").json(details);
        let created: CreatedLoan = expect_data(self.send(request).await?)?;
        Ok(created.id)
    }

    pub async fn update_loan(&self, id: &str, details: &LoanDetails) -> anyhow::Result<()> {
        let request = self.request(Method::PUT, &format!("/api/loans/{}", id)).json(details);
        self.send::<Value>(request).await?;
        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: LoanStatus) -> anyhow::Result<()> {
        let request = self
            .request(Method::PUT, &format!("/api/loans/{}/status", id))
            .json(&json!({ "status": status }));
        self.send::<Value>(request).await?;
        Ok(())
    }

    pub async fn delete_loan(&self, id: &str) -> anyhow::Result<()> {
        self.send::<Value>(self.request(Method::DELETE, &format!("/api/loans/{}", id)))
            .await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Unwrap the `{ success, data | error }` envelope. `None` for 204.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<Option<T>> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Unexpected response from server ({}): {}", status, e))?;

        if !body.get("success").and_then(Value::as_bool).unwrap_or(false) {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            anyhow::bail!("{} ({})", message, status.as_u16());
        }

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        Ok(Some(serde_json::from_value(data)?))
    }
}

fn expect_data<T>(data: Option<T>) -> anyhow::Result<T> {
    data.ok_or_else(|| anyhow::anyhow!("Server returned no data"))
}
