//! Terminal output for run results and the bill ledger.

use dunning_core::{ErrorResponse, ProcessedBill, RunReport};

const MAX_URL_WIDTH: usize = 60;

/// JSON written to stdout when an upload is rejected.
pub fn rejection_json(response: &ErrorResponse) -> serde_json::Value {
    serde_json::json!({
        "status": response.status,
        "detail": response.body,
    })
}

pub fn print_rejection(response: &ErrorResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&rejection_json(response))?);
    Ok(())
}

pub fn print_report(report: &RunReport) {
    eprintln!(
        "  Loaded {} debts: {} already billed, {} billed now",
        report.loaded, report.skipped, report.billed
    );
}

/// Render the ledger as a fixed-width table.
pub fn format_history(bills: &[ProcessedBill]) -> String {
    let mut out = format!("{:>6}  {:<40} {}\n", "id", "reference_id", "bill_url");
    for bill in bills {
        out.push_str(&format!(
            "{:>6}  {:<40} {}\n",
            bill.id,
            bill.reference_id,
            truncate(&bill.bill_url, MAX_URL_WIDTH)
        ));
    }
    out.push_str(&format!("({} bills)\n", bills.len()));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
