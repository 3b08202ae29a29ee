use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money in minor currency units (kopecks).
pub type Minor = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderStatus {
    Draft,
    Active,
    Won,
    Lost,
    Cancelled,
    Completed,
    Overdue,
}

impl TenderStatus {
    /// Won or lost: the tender went through a full bidding cycle.
    pub fn is_processed(self) -> bool {
        matches!(self, TenderStatus::Won | TenderStatus::Lost)
    }

    /// Still being worked on by the department.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            TenderStatus::Draft | TenderStatus::Active | TenderStatus::Overdue
        )
    }
}

/// Stage categories. Declaration order is the list order: archive first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageCategory {
    Archive,
    TenderDept,
    Realization,
}

impl StageCategory {
    /// Stages that belong to the department report.
    pub fn is_department(self) -> bool {
        matches!(self, StageCategory::TenderDept | StageCategory::Archive)
    }
}

impl fmt::Display for StageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageCategory::Archive => "archive",
            StageCategory::TenderDept => "tender_dept",
            StageCategory::Realization => "realization",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderStage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub category: StageCategory,
    #[serde(default)]
    pub sort_order: i32,
}

/// A named reference to a dictionary row (tender type, platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub full_name: String,
}

/// A tender with every relation already flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Tender {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub status: TenderStatus,
    pub stage: Option<TenderStage>,
    pub tender_type: Option<NamedRef>,
    pub platform: Option<NamedRef>,
    pub manager: Option<Employee>,
    pub specialist: Option<Employee>,
    pub nmck: Minor,
    pub contract_price: Option<Minor>,
    pub submission_deadline: Option<DateTime<Utc>>,
    pub loss_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub company_id: String,
    /// Signed; sums use the absolute value and `kind` for direction.
    pub amount: Minor,
    pub kind: TransactionKind,
    pub occurred_at: DateTime<Utc>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Planned,
    Confirmed,
    Paid,
    Cancelled,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    None,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCalendarItem {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub planned_date: NaiveDate,
    pub actual_date: Option<NaiveDate>,
    pub amount: Minor,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub recurrence: Recurrence,
    pub recurrence_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    /// Monthly limit. Reports spanning several months compare against
    /// `limit * months_covered`.
    pub limit: Minor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub name: String,
    pub remaining: Minor,
    pub monthly_payment: Minor,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub name: String,
    pub target: Minor,
    #[serde(default)]
    pub current: Minor,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Budgets, debts and goals kept next to the transaction ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceExtras {
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub goals: Vec<SavingsGoal>,
}

/// Transaction row exactly as it comes out of the CSV export.
#[derive(Debug, Deserialize)]
pub struct RawTransactionRow {
    pub id: Option<String>,
    pub company_id: Option<String>,
    pub amount: Option<String>,
    #[serde(alias = "type", alias = "direction")]
    pub kind: Option<String>,
    #[serde(alias = "date", alias = "transaction_date")]
    pub occurred_at: Option<String>,
    #[serde(alias = "category_name")]
    pub category: Option<String>,
}

/// Payment calendar row exactly as it comes out of the CSV export.
#[derive(Debug, Deserialize)]
pub struct RawCalendarRow {
    pub id: Option<String>,
    pub company_id: Option<String>,
    pub title: Option<String>,
    pub planned_date: Option<String>,
    pub actual_date: Option<String>,
    pub amount: Option<String>,
    pub payment_type: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "recurrence_type")]
    pub recurrence: Option<String>,
    pub recurrence_end: Option<String>,
}
