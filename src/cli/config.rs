use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Persistent CLI state: which server, and the current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            email: None,
            logged_in_at: None,
        }
    }
}

impl EnvironmentConfig {
    pub fn sign_in(&mut self, token: String, email: String) {
        self.token = Some(token);
        self.email = Some(email);
        self.logged_in_at = Some(Utc::now());
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.email = None;
        self.logged_in_at = None;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("LOANS_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("loan-ledger").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    load_environment_config_from(&get_config_dir()?)
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    save_environment_config_to(&get_config_dir()?, config)
}

pub fn load_environment_config_from(dir: &Path) -> anyhow::Result<EnvironmentConfig> {
    let env_file = dir.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config_to(dir: &Path, config: &EnvironmentConfig) -> anyhow::Result<()> {
    let env_file = dir.join("env.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(env_file, content)?;
    Ok(())
}

pub async fn ping_server(server_url: &str) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_url.trim_end_matches('/'));

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loans-cli-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = scratch_dir();
        let config = load_environment_config_from(&dir).unwrap();
        assert_eq!(config, EnvironmentConfig::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn session_survives_save_and_sign_out_clears_it() {
        let dir = scratch_dir();
        let mut config = EnvironmentConfig::default();
        config.server_url = "http://ledger.internal:8080".to_string();
        config.sign_in("tok".to_string(), "jane@example.com".to_string());
        save_environment_config_to(&dir, &config).unwrap();

        let mut loaded = load_environment_config_from(&dir).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("tok"));
        assert_eq!(loaded.server_url, "http://ledger.internal:8080");

        loaded.sign_out();
        assert!(loaded.token.is_none() && loaded.email.is_none());
        fs::remove_dir_all(dir).ok();
    }
}
