use crate::core::errors::LedgerError;
use crate::core::models::{Expense, Group};

const HEADER: [&str; 6] = ["Date", "Description", "Category", "Amount", "Paid By", "Participants"];

/// Renders a group's expenses as CSV, one row per expense in the given order.
///
/// Participants are shown by roster name when known, joined with `"; "`.
pub fn expenses_to_csv(group: &Group, expenses: &[Expense]) -> Result<String, LedgerError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADER)?;

    let display = |id: &str| group.member_name(id).unwrap_or(id).to_string();
    for expense in expenses {
        let participants = expense
            .shares
            .iter()
            .map(|s| display(&s.participant_id))
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            expense.date.format("%Y-%m-%d").to_string(),
            expense.description.clone(),
            expense.category.to_string(),
            format!("{:.2}", expense.amount),
            display(&expense.paid_by),
            participants,
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| LedgerError::ReportError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| LedgerError::ReportError(e.to_string()))
}
