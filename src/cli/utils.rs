use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::database::models::Loan;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("✗ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// `$1,234,567.89` style, keeping whatever scale the amount has
pub fn format_amount(amount: Decimal) -> String {
    let text = amount.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    match fraction {
        Some(f) => format!("{}${}.{}", sign, grouped, f),
        None => format!("{}${}", sign, grouped),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn render_loan_table(loans: &[Loan]) -> String {
    let mut out = format!(
        "{:<24} {:>14} {:>8} {:>6}  {:<10} {}\n",
        "BORROWER", "AMOUNT", "RATE", "TERM", "STATUS", "ID"
    );
    for loan in loans {
        out.push_str(&format!(
            "{:<24} {:>14} {:>8} {:>6}  {:<10} {}\n",
            truncate(&loan.borrower_name, 24),
            format_amount(loan.amount),
            format!("{}%", loan.interest_rate),
            loan.term,
            loan.status,
            loan.id
        ));
    }
    out
}

pub fn render_loan_detail(loan: &Loan) -> String {
    let mut out = String::new();
    out.push_str(&format!("Loan         {}\n", loan.id));
    out.push_str(&format!("Borrower     {}\n", loan.borrower_name));
    out.push_str(&format!("Amount       {}\n", format_amount(loan.amount)));
    out.push_str(&format!("Interest     {}%\n", loan.interest_rate));
    out.push_str(&format!("Term         {} months\n", loan.term));
    out.push_str(&format!("Status       {}\n", loan.status));
    out.push_str(&format!("Started      {}\n", loan.start_date.format("%Y-%m-%d %H:%M UTC")));
    if !loan.description.is_empty() {
        out.push_str(&format!("Description  {}\n", loan.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::LoanDetails;
    use chrono::Utc;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn amounts_get_thousands_separators() {
        assert_eq!(format_amount(dec("1000")), "$1,000");
        assert_eq!(format_amount(dec("999")), "$999");
        assert_eq!(format_amount(dec("1234567.89")), "$1,234,567.89");
        assert_eq!(format_amount(dec("-2500.5")), "-$2,500.5");
        assert_eq!(format_amount(dec("0")), "$0");
    }

    #[test]
    fn table_lists_every_loan() {
        let loan = Loan::open(
            Uuid::new_v4(),
            LoanDetails {
                borrower_name: "A borrower with a remarkably long name".to_string(),
                amount: dec("1000"),
                interest_rate: dec("5"),
                term: 12,
                description: String::new(),
            },
            Utc::now(),
        );
        let table = render_loan_table(&[loan.clone()]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("BORROWER"));
        assert!(lines[1].contains("$1,000"));
        assert!(lines[1].contains("5%"));
        assert!(lines[1].contains("pending"));
        assert!(lines[1].contains('…'));
        assert!(lines[1].ends_with(&loan.id.to_string()));
    }
}
