// Loaders for exported data-layer rows.
//
// Malformed rows are skipped and counted in `LoadReport`; only I/O and
// top-level format errors fail the whole load.
use crate::error::{ReportError, Result};
use crate::normalize::RawTender;
use crate::types::{
    FinanceExtras, PaymentCalendarItem, PaymentStatus, PaymentType, RawCalendarRow,
    RawTransactionRow, Recurrence, Tender, Transaction, TransactionKind,
};
use crate::util::{parse_date_safe, parse_datetime_safe, parse_minor_safe};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// Zero-based positions of the skipped data rows.
    pub skipped_rows: Vec<usize>,
}

impl LoadReport {
    fn skip(&mut self, row: usize) {
        self.parse_errors += 1;
        self.skipped_rows.push(row);
    }
}

pub fn load_tenders(path: impl AsRef<Path>) -> Result<(Vec<Tender>, LoadReport)> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let out = parse_tenders(&text)?;
    info!(path = %path.display(), rows = out.1.loaded_rows, skipped = out.1.parse_errors, "tenders loaded");
    Ok(out)
}

/// Parse a JSON array of tender rows. Relations may be objects, arrays or null.
pub fn parse_tenders(json: &str) -> Result<(Vec<Tender>, LoadReport)> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..LoadReport::default()
    };
    let mut tenders = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<RawTender>(row) {
            Ok(raw) => tenders.push(raw.normalize()),
            Err(e) => {
                report.skip(idx);
                warn!(row = idx, error = %e, "skipping tender row");
            }
        }
    }
    report.loaded_rows = tenders.len();
    Ok((tenders, report))
}

pub fn load_transactions(path: impl AsRef<Path>) -> Result<(Vec<Transaction>, LoadReport)> {
    let path = path.as_ref();
    let out = read_transactions(std::fs::File::open(path)?)?;
    info!(path = %path.display(), rows = out.1.loaded_rows, skipped = out.1.parse_errors, "transactions loaded");
    Ok(out)
}

pub fn read_transactions<R: Read>(input: R) -> Result<(Vec<Transaction>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(input);
    let mut report = LoadReport::default();
    let mut out = Vec::new();

    for (idx, result) in rdr.deserialize::<RawTransactionRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                report.skip(idx);
                warn!(row = idx, error = %e, "skipping transaction row");
                continue;
            }
        };
        match clean_transaction(row) {
            Some(tx) => out.push(tx),
            None => {
                report.skip(idx);
                warn!(row = idx, "skipping transaction row: missing or malformed field");
            }
        }
    }
    report.loaded_rows = out.len();
    Ok((out, report))
}

fn clean_transaction(row: RawTransactionRow) -> Option<Transaction> {
    let amount = parse_minor_safe(row.amount.as_deref())?;
    let occurred_at = parse_datetime_safe(row.occurred_at.as_deref())?;
    let kind = match row.kind.as_deref()?.trim().to_lowercase().as_str() {
        "income" => TransactionKind::Income,
        "expense" => TransactionKind::Expense,
        "transfer" => TransactionKind::Transfer,
        _ => return None,
    };
    Some(Transaction {
        id: non_empty(row.id)?,
        company_id: non_empty(row.company_id)?,
        amount,
        kind,
        occurred_at,
        category: non_empty(row.category),
    })
}

pub fn load_calendar(path: impl AsRef<Path>) -> Result<(Vec<PaymentCalendarItem>, LoadReport)> {
    let path = path.as_ref();
    let out = read_calendar(std::fs::File::open(path)?)?;
    info!(path = %path.display(), rows = out.1.loaded_rows, skipped = out.1.parse_errors, "payment calendar loaded");
    Ok(out)
}

pub fn read_calendar<R: Read>(input: R) -> Result<(Vec<PaymentCalendarItem>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(input);
    let mut report = LoadReport::default();
    let mut out = Vec::new();

    for (idx, result) in rdr.deserialize::<RawCalendarRow>().enumerate() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                report.skip(idx);
                warn!(row = idx, error = %e, "skipping calendar row");
                continue;
            }
        };
        match clean_calendar_row(row) {
            Some(item) => out.push(item),
            None => {
                report.skip(idx);
                warn!(row = idx, "skipping calendar row: missing or malformed field");
            }
        }
    }
    report.loaded_rows = out.len();
    Ok((out, report))
}

fn clean_calendar_row(row: RawCalendarRow) -> Option<PaymentCalendarItem> {
    let planned_date = parse_date_safe(row.planned_date.as_deref())?;
    let amount = parse_minor_safe(row.amount.as_deref())?;
    let payment_type = match row.payment_type.as_deref()?.trim().to_lowercase().as_str() {
        "income" => PaymentType::Income,
        "expense" => PaymentType::Expense,
        _ => return None,
    };
    let status = match row.status.as_deref().map(|s| s.trim().to_lowercase()) {
        None => PaymentStatus::Planned,
        Some(s) => match s.as_str() {
            "" | "planned" => PaymentStatus::Planned,
            "confirmed" => PaymentStatus::Confirmed,
            "paid" => PaymentStatus::Paid,
            "cancelled" | "canceled" => PaymentStatus::Cancelled,
            "overdue" => PaymentStatus::Overdue,
            _ => return None,
        },
    };
    let recurrence = match row.recurrence.as_deref().map(|s| s.trim().to_lowercase()) {
        None => Recurrence::None,
        Some(s) => match s.as_str() {
            "" | "none" | "once" => Recurrence::None,
            "weekly" => Recurrence::Weekly,
            "monthly" => Recurrence::Monthly,
            "quarterly" => Recurrence::Quarterly,
            "yearly" | "annually" => Recurrence::Yearly,
            _ => return None,
        },
    };
    Some(PaymentCalendarItem {
        id: non_empty(row.id)?,
        company_id: non_empty(row.company_id)?,
        title: row.title.unwrap_or_default().trim().to_string(),
        planned_date,
        actual_date: parse_date_safe(row.actual_date.as_deref()),
        amount,
        payment_type,
        status,
        recurrence,
        recurrence_end: parse_date_safe(row.recurrence_end.as_deref()),
    })
}

/// Budgets, debts and goals. A missing file means none are defined.
pub fn load_finance_extras(path: impl AsRef<Path>) -> Result<FinanceExtras> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "finance extras not found, using empty set");
        return Ok(FinanceExtras::default());
    }
    let text = std::fs::read_to_string(path)?;
    let extras: FinanceExtras = serde_json::from_str(&text)?;
    if extras.budgets.iter().any(|b| b.limit < 0) {
        return Err(ReportError::Parse(format!(
            "{}: budget limits must not be negative",
            path.display()
        )));
    }
    Ok(extras)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
