use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::json;
use std::io::{self, BufRead, Write};

use crate::cli::client::ApiClient;
use crate::cli::config::load_environment_config;
use crate::cli::utils::{output_empty_collection, output_success, render_loan_detail, render_loan_table};
use crate::cli::OutputFormat;
use crate::database::models::{Loan, LoanDetails, LoanStatus};

#[derive(Subcommand)]
pub enum LoanCommands {
    #[command(about = "List your loans")]
    List {
        #[arg(long, help = "Only loans with this status (pending, active, paid, defaulted)")]
        status: Option<LoanStatus>,
    },

    #[command(about = "Show one loan")]
    Show {
        #[arg(help = "Loan ID")]
        id: String,
    },

    #[command(about = "Record a new loan (starts pending)")]
    Create {
        #[command(flatten)]
        fields: NewLoanArgs,
    },

    #[command(about = "Edit borrower, amount, rate, term or description")]
    Update {
        #[arg(help = "Loan ID")]
        id: String,
        #[command(flatten)]
        fields: EditLoanArgs,
    },

    #[command(about = "Change a loan's status")]
    Status {
        #[arg(help = "Loan ID")]
        id: String,
        #[arg(help = "pending, active, paid or defaulted")]
        status: LoanStatus,
    },

    #[command(about = "Delete a loan (asks for confirmation)")]
    Delete {
        #[arg(help = "Loan ID")]
        id: String,
        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct NewLoanArgs {
    #[arg(long, help = "Borrower name")]
    pub borrower: String,
    #[arg(long, help = "Principal amount")]
    pub amount: Decimal,
    #[arg(long, help = "Interest rate in percent")]
    pub rate: Decimal,
    #[arg(long, help = "Term in months")]
    pub term: i32,
    #[arg(long, default_value = "", help = "Free-text description")]
    pub description: String,
}

/// Omitted flags keep the loan's current value
#[derive(Args, Debug, Default)]
pub struct EditLoanArgs {
    #[arg(long)]
    pub borrower: Option<String>,
    #[arg(long)]
    pub amount: Option<Decimal>,
    #[arg(long)]
    pub rate: Option<Decimal>,
    #[arg(long)]
    pub term: Option<i32>,
    #[arg(long)]
    pub description: Option<String>,
}

impl From<NewLoanArgs> for LoanDetails {
    fn from(args: NewLoanArgs) -> Self {
        LoanDetails {
            borrower_name: args.borrower,
            amount: args.amount,
            interest_rate: args.rate,
            term: args.term,
            description: args.description,
        }
    }
}

impl EditLoanArgs {
    fn is_empty(&self) -> bool {
        self.borrower.is_none()
            && self.amount.is_none()
            && self.rate.is_none()
            && self.term.is_none()
            && self.description.is_none()
    }

    /// Current values overlaid with whatever was given
    fn merge_onto(self, current: &Loan) -> LoanDetails {
        LoanDetails {
            borrower_name: self.borrower.unwrap_or_else(|| current.borrower_name.clone()),
            amount: self.amount.unwrap_or(current.amount),
            interest_rate: self.rate.unwrap_or(current.interest_rate),
            term: self.term.unwrap_or(current.term),
            description: self.description.unwrap_or_else(|| current.description.clone()),
        }
    }
}

pub async fn handle(cmd: LoanCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let env = load_environment_config()?;
    if env.token.is_none() {
        anyhow::bail!("Not signed in; run `loans auth login <email>`");
    }
    let client = ApiClient::from_environment(&env);

    match cmd {
        LoanCommands::List { status } => {
            let loans = client.list_loans(status).await?;
            if loans.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "loans",
                    "No loans found. Create your first loan with `loans loan create`.",
                );
            }
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "loans": loans }))?),
                OutputFormat::Text => print!("{}", render_loan_table(&loans)),
            }
            Ok(())
        }
        LoanCommands::Show { id } => {
            let loan = client.get_loan(&id).await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&loan)?),
                OutputFormat::Text => print!("{}", render_loan_detail(&loan)),
            }
            Ok(())
        }
        LoanCommands::Create { fields } => {
            let details = LoanDetails::from(fields);
            let id = client.create_loan(&details).await?;
            output_success(&output_format, &format!("Loan created ({})", id), Some(json!({ "id": id })))
        }
        LoanCommands::Update { id, fields } => {
            if fields.is_empty() {
                anyhow::bail!("Nothing to update; pass at least one of --borrower, --amount, --rate, --term, --description");
            }
            let current = client.get_loan(&id).await?;
            let details = fields.merge_onto(&current);
            client.update_loan(&id, &details).await?;
            output_success(&output_format, "Loan updated successfully", Some(serde_json::to_value(&details)?))
        }
        LoanCommands::Status { id, status } => {
            client.update_status(&id, status).await?;
            output_success(
                &output_format,
                &format!("Status updated to {}", status),
                Some(json!({ "id": id, "status": status })),
            )
        }
        LoanCommands::Delete { id, yes } => {
            if !yes {
                if output_format == OutputFormat::Json {
                    anyhow::bail!("Refusing to delete without confirmation; pass --yes with --json");
                }
                if !confirm("Are you sure you want to delete this loan?")? {
                    return output_success(&output_format, "Delete cancelled", None);
                }
            }
            client.delete_loan(&id).await?;
            output_success(&output_format, "Loan deleted successfully", Some(json!({ "id": id })))
        }
    }
}

/// y/N prompt on stderr. Anything but "y" or "yes" declines.
fn confirm(question: &str) -> anyhow::Result<bool> {
    eprint!("{} [y/N] ", question);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
