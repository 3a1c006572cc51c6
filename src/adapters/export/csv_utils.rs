//! CSV export for expenses. Uses the `csv` crate for safe serialization.

use crate::domain::Expense;

/// Header row written before the expense rows.
pub const EXPENSE_CSV_HEADER: [&str; 8] = [
    "Date",
    "Description",
    "Vendor",
    "Category",
    "Amount",
    "Tax",
    "Total",
    "Approved",
];

/// Convert expenses to a semicolon-delimited CSV string.
///
/// `Date` is the expense date when set, otherwise the creation date. Newlines in free text are
/// flattened to spaces; the csv crate handles quoting of everything else.
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(EXPENSE_CSV_HEADER)?;

    for expense in expenses {
        let date = expense
            .expense_date
            .unwrap_or_else(|| expense.created_at.date_naive())
            .format("%Y-%m-%d")
            .to_string();
        let description = flatten(&expense.description);
        let vendor = expense.vendor.as_deref().map(flatten).unwrap_or_default();

        wtr.write_record([
            date,
            description,
            vendor,
            expense.category.to_string(),
            expense.amount.to_string(),
            expense.tax.to_string(),
            expense.total().to_string(),
            if expense.approved { "yes" } else { "no" }.to_string(),
        ])?;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

fn flatten(text: &str) -> String {
    text.replace('\n', " ").replace('\r', "")
}
