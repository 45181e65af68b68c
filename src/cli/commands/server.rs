use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_environment_config, ping_server, save_environment_config, ServerStatus};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a ledger server")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Check server health from the /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let parsed = url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            let url = parsed.as_str().trim_end_matches('/').to_string();

            let mut env = load_environment_config()?;
            if env.server_url != url {
                // A token from one server means nothing to another
                env.sign_out();
            }
            env.server_url = url.clone();
            save_environment_config(&env)?;

            output_success(
                &output_format,
                &format!("Using server {}", url),
                Some(json!({ "server_url": url })),
            )
        }
        ServerCommands::Show => {
            let env = load_environment_config()?;
            let status = ping_server(&env.server_url).await;
            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Current server",
                    Some(json!({ "server_url": env.server_url, "status": status })),
                ),
                OutputFormat::Text => {
                    println!("Server: {}", env.server_url);
                    println!("Status: {}", if status == ServerStatus::Up { "up" } else { "down" });
                    Ok(())
                }
            }
        }
        ServerCommands::Health => {
            let env = load_environment_config()?;
            let client = ApiClient::from_environment(&env);
            let body = client.health().await?;
            let healthy = body.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
            if !healthy {
                anyhow::bail!("Server {} is degraded", client.base_url());
            }
            output_success(&output_format, &format!("Server {} is healthy", client.base_url()), Some(body))
        }
    }
}
