// Writers and console previews. Money is turned into display strings here
// and nowhere else.
use crate::error::Result;
use crate::reports::calendar::CashFlowMonth;
use crate::reports::department::{SpecialistStat, StageStat};
use crate::reports::health::{CategoryScore, FinancialHealthReport};
use crate::reports::seasonality::MonthPattern;
use crate::util::{format_money, format_number};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Markdown table of the first `max_rows` rows.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_preview(rows, max_rows));
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SpecialistRow {
    #[tabled(rename = "Employee")]
    pub name: String,
    #[tabled(rename = "Tenders")]
    pub total: usize,
    #[tabled(rename = "Won")]
    pub won: usize,
    #[tabled(rename = "Lost")]
    pub lost: usize,
    #[tabled(rename = "WinRate")]
    pub win_rate: String,
    #[tabled(rename = "WonSum")]
    pub won_sum: String,
}

impl From<&SpecialistStat> for SpecialistRow {
    fn from(s: &SpecialistStat) -> Self {
        SpecialistRow {
            name: s.name.clone(),
            total: s.total,
            won: s.won,
            lost: s.lost,
            win_rate: format!("{}%", format_number(s.win_rate, 1)),
            won_sum: format_money(s.won_sum),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StageRow {
    #[tabled(rename = "Stage")]
    pub name: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Share")]
    pub percent: String,
    #[tabled(rename = "NMCK")]
    pub total_nmck: String,
}

impl From<&StageStat> for StageRow {
    fn from(s: &StageStat) -> Self {
        StageRow {
            name: s.name.clone(),
            category: s.category.to_string(),
            count: s.count,
            percent: format!("{}%", format_number(s.percent, 1)),
            total_nmck: format_money(s.total_nmck),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HealthCategoryRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Score")]
    pub score: u32,
    #[tabled(rename = "Weight")]
    pub weight: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Details")]
    pub details: String,
}

impl HealthCategoryRow {
    fn new(name: &str, c: &CategoryScore) -> Self {
        HealthCategoryRow {
            category: name.to_string(),
            score: c.score,
            weight: format!("{}%", format_number(c.weight * 100.0, 0)),
            status: c.status.as_str().to_string(),
            details: c.details.clone(),
        }
    }
}

pub fn health_rows(report: &FinancialHealthReport) -> Vec<HealthCategoryRow> {
    let c = &report.categories;
    vec![
        HealthCategoryRow::new("Savings", &c.savings),
        HealthCategoryRow::new("Budget compliance", &c.budget_compliance),
        HealthCategoryRow::new("Debt ratio", &c.debt_ratio),
        HealthCategoryRow::new("Stability", &c.stability),
    ]
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthPatternRow {
    #[tabled(rename = "Month")]
    pub name: String,
    #[tabled(rename = "Income")]
    pub income: String,
    #[tabled(rename = "Expense")]
    pub expense: String,
    #[tabled(rename = "AvgExpense")]
    pub avg_expense: String,
    #[tabled(rename = "VsAverage")]
    pub compared: String,
}

impl From<&MonthPattern> for MonthPatternRow {
    fn from(m: &MonthPattern) -> Self {
        MonthPatternRow {
            name: m.name.clone(),
            income: format_money(m.total_income),
            expense: format_money(m.total_expense),
            avg_expense: format_money(m.avg_expense),
            compared: format!("{}%", format_number(m.compared_to_average, 1)),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CashFlowRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "PlannedIncome")]
    #[tabled(rename = "PlannedIncome")]
    pub planned_income: String,
    #[serde(rename = "PlannedExpense")]
    #[tabled(rename = "PlannedExpense")]
    pub planned_expense: String,
    #[serde(rename = "Net")]
    #[tabled(rename = "Net")]
    pub net: String,
    #[serde(rename = "Overdue")]
    #[tabled(rename = "Overdue")]
    pub overdue: usize,
}

impl From<&CashFlowMonth> for CashFlowRow {
    fn from(m: &CashFlowMonth) -> Self {
        CashFlowRow {
            month: m.month.clone(),
            planned_income: format_money(m.planned_income),
            planned_expense: format_money(m.planned_expense),
            net: format_money(m.net_planned),
            overdue: m.overdue_count,
        }
    }
}
