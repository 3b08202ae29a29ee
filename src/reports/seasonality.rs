//! Seasonality of income and spending: calendar month, season, weekday and
//! day-of-month patterns, plus a category × month heatmap for expenses.

use crate::scope::ReportScope;
use crate::types::{Minor, Transaction, TransactionKind};
use crate::util::{average, percent, round_to};
use chrono::{Datelike, Weekday};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn of_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPattern {
    pub month: u32,
    pub name: String,
    pub total_income: Minor,
    pub total_expense: Minor,
    pub transaction_count: usize,
    /// Years in which this calendar month had any transaction.
    pub years_observed: usize,
    /// Expense per observed year.
    pub avg_expense: Minor,
    /// Percent above (positive) or below (negative) the average month.
    pub compared_to_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonPattern {
    pub season: Season,
    pub total_income: Minor,
    pub total_expense: Minor,
    pub share_of_expense: f64,
    pub compared_to_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayPattern {
    /// 0 = Monday.
    pub weekday: u32,
    pub name: String,
    pub transaction_count: usize,
    pub total_expense: Minor,
    pub avg_expense: Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfMonthPattern {
    pub day: u32,
    pub transaction_count: usize,
    pub total_expense: Minor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapData {
    pub categories: Vec<String>,
    pub months: Vec<String>,
    /// `values[category][month]`, expense in minor units.
    pub values: Vec<Vec<Minor>>,
    pub max_value: Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalityReport {
    pub monthly_patterns: Vec<MonthPattern>,
    pub seasonal_patterns: Vec<SeasonPattern>,
    pub weekday_patterns: Vec<WeekdayPattern>,
    pub day_of_month_patterns: Vec<DayOfMonthPattern>,
    pub heatmap: HeatmapData,
    pub insights: Vec<String>,
}

#[derive(Default, Clone)]
struct Bucket {
    income: Minor,
    expense: Minor,
    count: usize,
    expense_count: usize,
}

impl Bucket {
    fn add(&mut self, tx: &Transaction) {
        let amount = tx.amount.abs();
        self.count += 1;
        match tx.kind {
            TransactionKind::Income => self.income += amount,
            TransactionKind::Expense => {
                self.expense += amount;
                self.expense_count += 1;
            }
            TransactionKind::Transfer => {}
        }
    }
}

pub fn generate_seasonality(scope: &ReportScope, transactions: &[Transaction]) -> SeasonalityReport {
    let mut months = vec![Bucket::default(); 12];
    let mut years_by_month: Vec<BTreeSet<i32>> = vec![BTreeSet::new(); 12];
    let mut weekdays = vec![Bucket::default(); 7];
    let mut days = vec![Bucket::default(); 31];
    let mut heat: HashMap<&str, [Minor; 12]> = HashMap::new();

    let admitted = transactions
        .iter()
        .filter(|tx| scope.admits(&tx.company_id, tx.occurred_at.date_naive()));
    for tx in admitted {
        let date = tx.occurred_at.date_naive();
        let m = date.month0() as usize;
        months[m].add(tx);
        years_by_month[m].insert(date.year());
        weekdays[date.weekday().num_days_from_monday() as usize].add(tx);
        days[date.day0() as usize].add(tx);
        if tx.kind == TransactionKind::Expense {
            if let Some(cat) = tx.category.as_deref() {
                heat.entry(cat).or_insert([0; 12])[m] += tx.amount.abs();
            }
        }
    }

    let monthly_patterns = build_months(&months, &years_by_month);
    let seasonal_patterns = build_seasons(&months);
    let weekday_patterns = weekdays
        .iter()
        .enumerate()
        .map(|(i, b)| WeekdayPattern {
            weekday: i as u32,
            name: weekday_name(i),
            transaction_count: b.count,
            total_expense: b.expense,
            avg_expense: if b.expense_count == 0 {
                0
            } else {
                (b.expense as f64 / b.expense_count as f64).round() as Minor
            },
        })
        .collect();
    let day_of_month_patterns = days
        .iter()
        .enumerate()
        .map(|(i, b)| DayOfMonthPattern {
            day: i as u32 + 1,
            transaction_count: b.count,
            total_expense: b.expense,
        })
        .collect();
    let heatmap = build_heatmap(heat);
    let insights = build_insights(&monthly_patterns, &seasonal_patterns);

    debug!(
        company = %scope.company_id,
        input = transactions.len(),
        heatmap_rows = heatmap.categories.len(),
        "seasonality assembled"
    );

    SeasonalityReport {
        monthly_patterns,
        seasonal_patterns,
        weekday_patterns,
        day_of_month_patterns,
        heatmap,
        insights,
    }
}

fn weekday_name(i: usize) -> String {
    let day = match i {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    };
    format!("{:?}", day)
}

fn build_months(months: &[Bucket], years: &[BTreeSet<i32>]) -> Vec<MonthPattern> {
    let avg_expense: Vec<Minor> = months
        .iter()
        .zip(years)
        .map(|(b, y)| {
            if y.is_empty() {
                0
            } else {
                (b.expense as f64 / y.len() as f64).round() as Minor
            }
        })
        .collect();
    let observed: Vec<f64> = avg_expense
        .iter()
        .zip(years)
        .filter(|(_, y)| !y.is_empty())
        .map(|(a, _)| *a as f64)
        .collect();
    let baseline = average(&observed);

    months
        .iter()
        .enumerate()
        .map(|(i, b)| MonthPattern {
            month: i as u32 + 1,
            name: MONTH_NAMES[i].to_string(),
            total_income: b.income,
            total_expense: b.expense,
            transaction_count: b.count,
            years_observed: years[i].len(),
            avg_expense: avg_expense[i],
            compared_to_average: if years[i].is_empty() {
                0.0
            } else {
                round_to(percent(avg_expense[i] as f64 - baseline, baseline), 2)
            },
        })
        .collect()
}

fn build_seasons(months: &[Bucket]) -> Vec<SeasonPattern> {
    let mut totals = [(0 as Minor, 0 as Minor); 4];
    for (i, b) in months.iter().enumerate() {
        let s = Season::of_month(i as u32 + 1).index();
        totals[s].0 += b.income;
        totals[s].1 += b.expense;
    }
    let all_expense: Minor = totals.iter().map(|t| t.1).sum();
    let baseline = all_expense as f64 / 4.0;
    Season::ALL
        .iter()
        .map(|&season| {
            let (income, expense) = totals[season.index()];
            SeasonPattern {
                season,
                total_income: income,
                total_expense: expense,
                share_of_expense: round_to(percent(expense as f64, all_expense as f64), 2),
                compared_to_average: round_to(percent(expense as f64 - baseline, baseline), 2),
            }
        })
        .collect()
}

fn build_heatmap(heat: HashMap<&str, [Minor; 12]>) -> HeatmapData {
    let mut rows: Vec<(&str, [Minor; 12])> = heat.into_iter().collect();
    rows.sort_by(|a, b| {
        let ta: Minor = a.1.iter().sum();
        let tb: Minor = b.1.iter().sum();
        tb.cmp(&ta).then_with(|| a.0.cmp(b.0))
    });
    let max_value = rows
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .max()
        .unwrap_or(0);
    HeatmapData {
        categories: rows.iter().map(|(c, _)| c.to_string()).collect(),
        months: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
        values: rows.iter().map(|(_, v)| v.to_vec()).collect(),
        max_value,
    }
}

fn build_insights(months: &[MonthPattern], seasons: &[SeasonPattern]) -> Vec<String> {
    let mut out = Vec::new();
    let observed: Vec<&MonthPattern> = months.iter().filter(|m| m.years_observed > 0).collect();
    if observed.len() < 2 {
        return out;
    }
    if let Some(peak) = observed.iter().max_by_key(|m| m.avg_expense) {
        if peak.compared_to_average > 0.0 {
            out.push(format!(
                "Spending peaks in {} ({:+.1}% vs. average month)",
                peak.name, peak.compared_to_average
            ));
        }
    }
    if let Some(low) = observed.iter().min_by_key(|m| m.avg_expense) {
        if low.compared_to_average < 0.0 {
            out.push(format!(
                "Spending is lowest in {} ({:+.1}% vs. average month)",
                low.name, low.compared_to_average
            ));
        }
    }
    if let Some(top) = seasons.iter().max_by_key(|s| s.total_expense) {
        if top.share_of_expense > 25.0 {
            out.push(format!(
                "{:?} carries {:.1}% of yearly spending",
                top.season, top.share_of_expense
            ));
        }
    }
    out
}
