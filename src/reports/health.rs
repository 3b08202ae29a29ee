//! Financial health score: four banded category scores combined with fixed
//! weights into one 0-100 number.

use crate::scope::ReportScope;
use crate::types::{FinanceExtras, Minor, Transaction, TransactionKind};
use crate::util::{coefficient_of_variation, month_key, percent, round_to};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

// Category weights in percent; they add up to 100.
pub const SAVINGS_WEIGHT: u32 = 35;
pub const BUDGET_WEIGHT: u32 = 25;
pub const DEBT_WEIGHT: u32 = 20;
pub const STABILITY_WEIGHT: u32 = 20;
pub const GOALS_BONUS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Grade::Excellent
        } else if score >= 60 {
            Grade::Good
        } else if score >= 40 {
            Grade::Fair
        } else {
            Grade::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Fair => "fair",
            Grade::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub score: u32,
    pub weight: f64,
    pub status: Grade,
    /// The ratio the score was banded from (percent).
    pub value: f64,
    pub details: String,
}

impl CategoryScore {
    fn new(score: u32, weight_pct: u32, value: f64, details: String) -> Self {
        CategoryScore {
            score,
            weight: weight_pct as f64 / 100.0,
            status: Grade::from_score(score),
            value: round_to(value, 2),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCategories {
    pub savings: CategoryScore,
    pub budget_compliance: CategoryScore,
    pub debt_ratio: CategoryScore,
    pub stability: CategoryScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialHealthReport {
    pub overall_score: u32,
    pub grade: Grade,
    pub categories: HealthCategories,
    pub total_income: Minor,
    pub total_expense: Minor,
    pub months_covered: usize,
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Savings rate `(income - expense) / income` in percent.
pub fn savings_band(rate: f64) -> u32 {
    if rate >= 20.0 {
        100
    } else if rate >= 10.0 {
        75
    } else if rate >= 5.0 {
        50
    } else if rate > 0.0 {
        25
    } else {
        0
    }
}

/// Share of budgets kept within their limit, percent.
pub fn budget_band(compliance: f64) -> u32 {
    if compliance >= 100.0 {
        100
    } else if compliance >= 80.0 {
        75
    } else if compliance >= 60.0 {
        50
    } else if compliance >= 40.0 {
        25
    } else {
        0
    }
}

/// Monthly debt payments over average monthly income, percent.
pub fn debt_band(ratio: f64) -> u32 {
    if ratio <= 0.0 {
        100
    } else if ratio < 20.0 {
        75
    } else if ratio < 35.0 {
        50
    } else if ratio < 50.0 {
        25
    } else {
        0
    }
}

/// Coefficient of variation of monthly expenses, percent.
pub fn stability_band(cv: f64) -> u32 {
    if cv < 10.0 {
        100
    } else if cv < 20.0 {
        75
    } else if cv < 35.0 {
        50
    } else if cv < 50.0 {
        25
    } else {
        0
    }
}

pub fn generate_financial_health(
    scope: &ReportScope,
    transactions: &[Transaction],
    extras: &FinanceExtras,
) -> FinancialHealthReport {
    let mut income: Minor = 0;
    let mut expense: Minor = 0;
    let mut monthly: BTreeMap<String, (Minor, Minor)> = BTreeMap::new();
    let mut spent_by_category: HashMap<&str, Minor> = HashMap::new();

    for tx in transactions
        .iter()
        .filter(|tx| scope.admits(&tx.company_id, tx.occurred_at.date_naive()))
    {
        let amount = tx.amount.abs();
        let month = monthly
            .entry(month_key(tx.occurred_at.date_naive()))
            .or_insert((0, 0));
        match tx.kind {
            TransactionKind::Income => {
                income += amount;
                month.0 += amount;
            }
            TransactionKind::Expense => {
                expense += amount;
                month.1 += amount;
                if let Some(cat) = tx.category.as_deref() {
                    *spent_by_category.entry(cat).or_default() += amount;
                }
            }
            TransactionKind::Transfer => {}
        }
    }

    let has_goals = extras.goals.iter().any(|g| g.is_active);
    let savings = score_savings(income, expense, has_goals);
    let budget_compliance = score_budgets(extras, &spent_by_category, monthly.len());
    let avg_monthly_income = if monthly.is_empty() {
        0.0
    } else {
        income as f64 / monthly.len() as f64
    };
    let debt_ratio = score_debt(extras, avg_monthly_income);
    // months with income only carry no spending to compare
    let expenses: Vec<f64> = monthly
        .values()
        .filter(|(_, e)| *e > 0)
        .map(|(_, e)| *e as f64)
        .collect();
    let stability = score_stability(&expenses);

    let categories = HealthCategories {
        savings,
        budget_compliance,
        debt_ratio,
        stability,
    };
    let overall_score = overall(&categories);
    let grade = Grade::from_score(overall_score);
    let insights = build_insights(&categories, income, expense);
    let recommendations = build_recommendations(&categories, has_goals);

    debug!(
        company = %scope.company_id,
        months = monthly.len(),
        overall_score,
        grade = grade.as_str(),
        "financial health assembled"
    );

    FinancialHealthReport {
        overall_score,
        grade,
        categories,
        total_income: income,
        total_expense: expense,
        months_covered: monthly.len(),
        insights,
        recommendations,
    }
}

fn score_savings(income: Minor, expense: Minor, has_goals: bool) -> CategoryScore {
    let rate = percent((income - expense) as f64, income as f64);
    let mut score = savings_band(rate);
    let mut details = format!("Savings rate {:.1}%", rate);
    if has_goals {
        score = (score + GOALS_BONUS).min(100);
        details.push_str(", active savings goals");
    }
    CategoryScore::new(score, SAVINGS_WEIGHT, rate, details)
}

/// Budget limits are monthly, so each one is scaled to the months in the data.
fn score_budgets(
    extras: &FinanceExtras,
    spent: &HashMap<&str, Minor>,
    months: usize,
) -> CategoryScore {
    if extras.budgets.is_empty() {
        return CategoryScore::new(50, BUDGET_WEIGHT, 0.0, "No budgets defined".to_string());
    }
    let months = months.max(1) as Minor;
    let within = extras
        .budgets
        .iter()
        .filter(|b| {
            let used = spent.get(b.category.as_str()).copied().unwrap_or(0);
            used <= b.limit.saturating_mul(months)
        })
        .count();
    let compliance = percent(within as f64, extras.budgets.len() as f64);
    CategoryScore::new(
        budget_band(compliance),
        BUDGET_WEIGHT,
        compliance,
        format!("{} of {} budgets within limit", within, extras.budgets.len()),
    )
}

fn score_debt(extras: &FinanceExtras, avg_monthly_income: f64) -> CategoryScore {
    let monthly_payments: Minor = extras
        .debts
        .iter()
        .filter(|d| d.is_active)
        .map(|d| d.monthly_payment.abs())
        .sum();
    if monthly_payments == 0 {
        return CategoryScore::new(100, DEBT_WEIGHT, 0.0, "No active debt payments".to_string());
    }
    if avg_monthly_income <= 0.0 {
        return CategoryScore::new(
            0,
            DEBT_WEIGHT,
            0.0,
            "Debt payments with no recorded income".to_string(),
        );
    }
    let ratio = percent(monthly_payments as f64, avg_monthly_income);
    CategoryScore::new(
        debt_band(ratio),
        DEBT_WEIGHT,
        ratio,
        format!("Debt payments take {:.1}% of monthly income", ratio),
    )
}

fn score_stability(monthly_expenses: &[f64]) -> CategoryScore {
    if monthly_expenses.len() < 2 {
        return CategoryScore::new(
            50,
            STABILITY_WEIGHT,
            0.0,
            "Not enough history to measure".to_string(),
        );
    }
    let cv = coefficient_of_variation(monthly_expenses);
    CategoryScore::new(
        stability_band(cv),
        STABILITY_WEIGHT,
        cv,
        format!("Monthly expenses vary by {:.1}%", cv),
    )
}

fn overall(c: &HealthCategories) -> u32 {
    // integer percent weights keep x.5 results from drifting below the half
    let weighted: u32 = [
        (c.savings.score, SAVINGS_WEIGHT),
        (c.budget_compliance.score, BUDGET_WEIGHT),
        (c.debt_ratio.score, DEBT_WEIGHT),
        (c.stability.score, STABILITY_WEIGHT),
    ]
    .iter()
    .map(|(score, weight)| score * weight)
    .sum();
    ((weighted + 50) / 100).min(100)
}

fn build_insights(c: &HealthCategories, income: Minor, expense: Minor) -> Vec<String> {
    let mut out = Vec::new();
    if income == 0 && expense == 0 {
        out.push("No income or expense recorded for the period".to_string());
        return out;
    }
    if expense > income {
        out.push("Expenses exceeded income for the period".to_string());
    }
    match c.savings.status {
        Grade::Excellent => out.push(format!(
            "Strong savings: {:.1}% of income retained",
            c.savings.value
        )),
        Grade::Poor => out.push("Little or nothing of the income is being saved".to_string()),
        _ => {}
    }
    if c.budget_compliance.status == Grade::Poor {
        out.push("Most budgets were overspent".to_string());
    }
    if c.debt_ratio.status == Grade::Poor {
        out.push("Debt payments are a heavy share of income".to_string());
    }
    if c.stability.status == Grade::Excellent && c.stability.value > 0.0 {
        out.push("Spending is steady month to month".to_string());
    } else if c.stability.status == Grade::Poor {
        out.push("Spending swings sharply between months".to_string());
    }
    out
}

fn priority_for(status: Grade) -> Option<Priority> {
    match status {
        Grade::Poor => Some(Priority::High),
        Grade::Fair => Some(Priority::Medium),
        _ => None,
    }
}

fn build_recommendations(c: &HealthCategories, has_goals: bool) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if let Some(priority) = priority_for(c.savings.status) {
        out.push(Recommendation {
            priority,
            category: "savings".to_string(),
            title: "Raise the savings rate".to_string(),
            description: "Cut discretionary spending until at least 10% of income is kept"
                .to_string(),
            impact: "Builds a reserve against cash gaps".to_string(),
        });
    }
    if let Some(priority) = priority_for(c.budget_compliance.status) {
        out.push(Recommendation {
            priority,
            category: "budget_compliance".to_string(),
            title: "Review overspent budgets".to_string(),
            description: "Revisit limits or spending in categories that went over budget"
                .to_string(),
            impact: "Keeps planned and actual spending aligned".to_string(),
        });
    }
    if let Some(priority) = priority_for(c.debt_ratio.status) {
        out.push(Recommendation {
            priority,
            category: "debt_ratio".to_string(),
            title: "Reduce the debt load".to_string(),
            description: "Pay down the most expensive debt first and avoid new borrowing"
                .to_string(),
            impact: "Frees monthly cash flow".to_string(),
        });
    }
    if let Some(priority) = priority_for(c.stability.status) {
        out.push(Recommendation {
            priority,
            category: "stability".to_string(),
            title: "Smooth out monthly spending".to_string(),
            description: "Spread large purchases over several months where possible".to_string(),
            impact: "Makes cash flow easier to plan".to_string(),
        });
    }
    if !has_goals {
        out.push(Recommendation {
            priority: Priority::Low,
            category: "savings".to_string(),
            title: "Set a savings goal".to_string(),
            description: "An active goal earns a bonus on the savings score".to_string(),
            impact: format!("Up to +{} savings points", GOALS_BONUS),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Budget, Debt, SavingsGoal};
    use chrono::{TimeZone, Utc};

    fn tx(kind: TransactionKind, amount: Minor, month: u32, category: Option<&str>) -> Transaction {
        Transaction {
            id: format!("{:?}-{}-{}", kind, amount, month),
            company_id: "c1".to_string(),
            amount,
            kind,
            occurred_at: Utc.with_ymd_and_hms(2024, month, 10, 12, 0, 0).unwrap(),
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn bands_match_thresholds() {
        assert_eq!(savings_band(20.0), 100);
        assert_eq!(savings_band(19.9), 75);
        assert_eq!(savings_band(5.0), 50);
        assert_eq!(savings_band(0.1), 25);
        assert_eq!(savings_band(0.0), 0);
        assert_eq!(savings_band(-40.0), 0);
        assert_eq!(budget_band(100.0), 100);
        assert_eq!(budget_band(39.0), 0);
        assert_eq!(debt_band(0.0), 100);
        assert_eq!(debt_band(50.0), 0);
        assert_eq!(stability_band(9.9), 100);
        assert_eq!(stability_band(50.0), 0);
    }

    #[test]
    fn goals_bonus_is_capped() {
        let rows = vec![
            tx(TransactionKind::Income, 100_000, 1, None),
            tx(TransactionKind::Expense, 88_000, 1, None),
        ];
        let mut extras = FinanceExtras::default();
        let plain = generate_financial_health(&ReportScope::company("c1"), &rows, &extras);
        assert_eq!(plain.categories.savings.score, 75);

        extras.goals.push(SavingsGoal {
            name: "Reserve".to_string(),
            target: 1_000_000,
            current: 0,
            is_active: true,
        });
        let with_goal = generate_financial_health(&ReportScope::company("c1"), &rows, &extras);
        assert_eq!(with_goal.categories.savings.score, 85);

        let rich = vec![tx(TransactionKind::Income, 100_000, 1, None)];
        let capped = generate_financial_health(&ReportScope::company("c1"), &rich, &extras);
        assert_eq!(capped.categories.savings.score, 100);
    }

    #[test]
    fn budgets_and_debts_are_scored() {
        let rows = vec![
            tx(TransactionKind::Income, 100_000, 1, None),
            tx(TransactionKind::Expense, 30_000, 1, Some("Rent")),
            tx(TransactionKind::Expense, 5_000, 1, Some("Food")),
        ];
        let extras = FinanceExtras {
            budgets: vec![
                Budget { category: "Rent".to_string(), limit: 20_000 },
                Budget { category: "Food".to_string(), limit: 10_000 },
            ],
            debts: vec![
                Debt { name: "Loan".to_string(), remaining: 500_000, monthly_payment: 25_000, is_active: true },
                Debt { name: "Closed".to_string(), remaining: 0, monthly_payment: 90_000, is_active: false },
            ],
            goals: vec![],
        };
        let r = generate_financial_health(&ReportScope::company("c1"), &rows, &extras);
        assert_eq!(r.categories.budget_compliance.value, 50.0);
        assert_eq!(r.categories.budget_compliance.score, 25);
        assert_eq!(r.categories.debt_ratio.value, 25.0);
        assert_eq!(r.categories.debt_ratio.score, 50);
        assert!(r
            .recommendations
            .iter()
            .any(|rec| rec.category == "budget_compliance" && rec.priority == Priority::High));
    }

    #[test]
    fn stability_needs_two_months() {
        let one = vec![tx(TransactionKind::Expense, 10_000, 1, None)];
        let r = generate_financial_health(&ReportScope::company("c1"), &one, &FinanceExtras::default());
        assert_eq!(r.categories.stability.score, 50);

        let steady = vec![
            tx(TransactionKind::Expense, 10_000, 1, None),
            tx(TransactionKind::Expense, 10_000, 2, None),
            tx(TransactionKind::Expense, 10_000, 3, None),
        ];
        let r = generate_financial_health(&ReportScope::company("c1"), &steady, &FinanceExtras::default());
        assert_eq!(r.categories.stability.score, 100);
    }

    #[test]
    fn income_only_months_do_not_count_as_spending() {
        let rows = vec![
            tx(TransactionKind::Income, 100_000, 1, None),
            tx(TransactionKind::Expense, 10_000, 2, None),
        ];
        let r = generate_financial_health(&ReportScope::company("c1"), &rows, &FinanceExtras::default());
        assert_eq!(r.months_covered, 2);
        assert_eq!(r.categories.stability.score, 50);

        let gap = vec![
            tx(TransactionKind::Expense, 10_000, 1, None),
            tx(TransactionKind::Income, 50_000, 2, None),
            tx(TransactionKind::Expense, 10_000, 3, None),
        ];
        let r = generate_financial_health(&ReportScope::company("c1"), &gap, &FinanceExtras::default());
        assert_eq!(r.categories.stability.score, 100);
    }

    #[test]
    fn budget_limits_apply_per_month() {
        let rows = vec![
            tx(TransactionKind::Expense, 15_000, 1, Some("Rent")),
            tx(TransactionKind::Expense, 15_000, 2, Some("Rent")),
        ];
        let extras = FinanceExtras {
            budgets: vec![Budget { category: "Rent".to_string(), limit: 20_000 }],
            ..FinanceExtras::default()
        };
        let r = generate_financial_health(&ReportScope::company("c1"), &rows, &extras);
        assert_eq!(r.categories.budget_compliance.value, 100.0);
        assert_eq!(r.categories.budget_compliance.score, 100);

        let over = vec![
            tx(TransactionKind::Expense, 25_000, 1, Some("Rent")),
            tx(TransactionKind::Expense, 25_000, 2, Some("Rent")),
        ];
        let r = generate_financial_health(&ReportScope::company("c1"), &over, &extras);
        assert_eq!(r.categories.budget_compliance.value, 0.0);
    }

    #[test]
    fn overall_is_the_weighted_sum() {
        let rows = vec![
            tx(TransactionKind::Income, 200_000, 1, None),
            tx(TransactionKind::Expense, 150_000, 1, None),
        ];
        let r = generate_financial_health(&ReportScope::company("c1"), &rows, &FinanceExtras::default());
        // savings 100*0.35 + budgets 50*0.25 + debt 100*0.2 + stability 50*0.2
        assert_eq!(r.overall_score, 78);
        assert_eq!(r.grade, Grade::Good);
    }
}
