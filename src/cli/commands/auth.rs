use clap::Subcommand;
use serde_json::json;
use std::io::{self, BufRead, Write};

use crate::cli::client::ApiClient;
use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::services::Credentials;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and sign in")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to LOANS_PASSWORD, then prompts)")]
        password: Option<String>,
    },

    #[command(about = "Sign in to the current server")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to LOANS_PASSWORD, then prompts)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show the signed-in user")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env = load_environment_config()?;
    let client = ApiClient::from_environment(&env);

    match cmd {
        AuthCommands::Register { email, password } => {
            let credentials = Credentials { email, password: resolve_password(password)? };
            let grant = client.register(&credentials).await?;
            env.sign_in(grant.token, grant.user.email.clone());
            save_environment_config(&env)?;
            output_success(
                &output_format,
                &format!("Registered and signed in as {}", grant.user.email),
                Some(serde_json::to_value(&grant.user)?),
            )
        }
        AuthCommands::Login { email, password } => {
            let credentials = Credentials { email, password: resolve_password(password)? };
            let grant = client.login(&credentials).await?;
            env.sign_in(grant.token, grant.user.email.clone());
            save_environment_config(&env)?;
            output_success(
                &output_format,
                &format!("Signed in as {}", grant.user.email),
                Some(serde_json::to_value(&grant.user)?),
            )
        }
        AuthCommands::Logout => {
            let was = env.email.take();
            env.sign_out();
            save_environment_config(&env)?;
            let message = match &was {
                Some(email) => format!("Signed out {}", email),
                None => "No active session".to_string(),
            };
            output_success(&output_format, &message, Some(json!({ "email": was })))
        }
        AuthCommands::Whoami => {
            if env.token.is_none() {
                anyhow::bail!("Not signed in; run `loans auth login <email>`");
            }
            let profile = client.whoami().await?;
            output_success(
                &output_format,
                &format!("Signed in as {} on {}", profile.email, client.base_url()),
                Some(serde_json::to_value(&profile)?),
            )
        }
    }
}

fn resolve_password(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("LOANS_PASSWORD") {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
