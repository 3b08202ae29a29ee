use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tender_reports::reports::{
    generate_department_report, generate_financial_health, generate_payment_calendar,
    generate_seasonality,
};
use tender_reports::types::{
    Employee, FinanceExtras, NamedRef, StageCategory, Tender, TenderStage, TenderStatus,
    Transaction, TransactionKind,
};
use tender_reports::ReportScope;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

fn stage(id: &str, category: StageCategory) -> TenderStage {
    TenderStage {
        id: id.to_string(),
        name: id.to_string(),
        color: Some("#3366ff".to_string()),
        category,
        sort_order: 0,
    }
}

fn tender(id: &str, status: TenderStatus, st: &TenderStage, days: i64) -> Tender {
    Tender {
        id: id.to_string(),
        company_id: "acme".to_string(),
        title: format!("Tender {}", id),
        status,
        stage: Some(st.clone()),
        tender_type: None,
        platform: None,
        manager: None,
        specialist: None,
        nmck: 500_000,
        contract_price: None,
        submission_deadline: None,
        loss_reason: None,
        created_at: base_time(),
        updated_at: base_time() + Duration::days(days),
    }
}

fn scope() -> ReportScope {
    ReportScope::company("acme")
}

#[test]
fn win_rate_scenario() {
    let dept = stage("bidding", StageCategory::TenderDept);
    let mut tenders = Vec::new();
    for i in 0..6 {
        tenders.push(tender(&format!("w{}", i), TenderStatus::Won, &dept, 3));
    }
    for i in 0..2 {
        tenders.push(tender(&format!("l{}", i), TenderStatus::Lost, &dept, 3));
    }
    for i in 0..2 {
        tenders.push(tender(&format!("a{}", i), TenderStatus::Active, &dept, 3));
    }
    let r = generate_department_report(&scope(), &tenders);
    assert_eq!(r.overview.total_tenders, 10);
    assert_eq!(r.overview.win_rate, 60.0);
    assert_eq!(r.overview.active_tenders, 2);
}

#[test]
fn stages_sorted_by_count_regardless_of_category() {
    let archive = stage("archive", StageCategory::Archive);
    let big = stage("big", StageCategory::TenderDept);
    let mid = stage("mid", StageCategory::TenderDept);
    let mut tenders = vec![tender("x0", TenderStatus::Lost, &archive, 1)];
    for i in 0..5 {
        tenders.push(tender(&format!("b{}", i), TenderStatus::Active, &big, 1));
    }
    for i in 0..3 {
        tenders.push(tender(&format!("m{}", i), TenderStatus::Draft, &mid, 1));
    }
    let r = generate_department_report(&scope(), &tenders);
    let counts: Vec<usize> = r.stages.iter().map(|s| s.count).collect();
    assert_eq!(counts, vec![5, 3, 1]);
    assert_eq!(r.stages[2].category, StageCategory::Archive);
}

#[test]
fn stage_counts_sum_to_department_tenders() {
    let dept = stage("bidding", StageCategory::TenderDept);
    let archive = stage("archive", StageCategory::Archive);
    let realization = stage("delivery", StageCategory::Realization);
    let tenders = vec![
        tender("1", TenderStatus::Won, &dept, 2),
        tender("2", TenderStatus::Lost, &archive, 2),
        tender("3", TenderStatus::Completed, &realization, 2),
        tender("4", TenderStatus::Active, &dept, 2),
    ];
    let r = generate_department_report(&scope(), &tenders);
    let sum: usize = r.stages.iter().map(|s| s.count).sum();
    assert_eq!(sum, 3);
    assert_eq!(sum, r.overview.total_tenders);
    assert!(r
        .stages
        .iter()
        .all(|s| (0.0..=100.0).contains(&s.percent)));
}

fn employee(id: &str) -> Employee {
    Employee {
        id: id.to_string(),
        full_name: format!("Employee {}", id),
    }
}

fn named(id: &str) -> NamedRef {
    NamedRef {
        id: id.to_string(),
        name: id.to_uppercase(),
    }
}

fn in_bounds(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}

#[test]
fn win_rates_and_percents_stay_within_bounds() {
    let dept = stage("bidding", StageCategory::TenderDept);
    let review = stage("review", StageCategory::TenderDept);
    let statuses = [
        TenderStatus::Won,
        TenderStatus::Lost,
        TenderStatus::Active,
        TenderStatus::Won,
        TenderStatus::Draft,
        TenderStatus::Lost,
    ];
    let mut tenders = Vec::new();
    for (i, status) in statuses.iter().cycle().take(18).enumerate() {
        let st = if i % 3 == 0 { &review } else { &dept };
        let mut t = tender(&format!("t{}", i), *status, st, (i % 7) as i64);
        t.manager = Some(employee("e1"));
        t.specialist = match i % 3 {
            0 => Some(employee("e2")),
            // same person in both roles
            1 => Some(employee("e1")),
            _ => None,
        };
        t.tender_type = Some(named(if i % 2 == 0 { "44fz" } else { "223fz" }));
        t.platform = (i % 4 != 0).then(|| named("eis"));
        if *status == TenderStatus::Won {
            t.contract_price = Some(450_000);
        }
        if *status == TenderStatus::Lost && i % 2 == 1 {
            t.loss_reason = Some("price".to_string());
        }
        tenders.push(t);
    }

    let r = generate_department_report(&scope(), &tenders);
    assert_eq!(r.overview.total_tenders, 18);
    assert!(in_bounds(r.overview.win_rate));

    let e1 = r.specialists.iter().find(|s| s.employee_id == "e1").unwrap();
    assert_eq!(e1.total, 18);
    assert_eq!(e1.won, 6);
    let e2 = r.specialists.iter().find(|s| s.employee_id == "e2").unwrap();
    assert_eq!(e2.total, 6);
    for s in &r.specialists {
        assert!(in_bounds(s.win_rate), "{} {}", s.employee_id, s.win_rate);
        assert!(s.won <= s.total);
    }
    for d in r.by_type.iter().chain(&r.by_platform) {
        assert!(in_bounds(d.win_rate), "{} {}", d.id, d.win_rate);
    }
    for st in &r.stages {
        assert!(in_bounds(st.percent), "{} {}", st.stage_id, st.percent);
    }
    for lr in &r.loss_reasons {
        assert!(in_bounds(lr.percent), "{} {}", lr.reason, lr.percent);
    }
    let stage_share: f64 = r.stages.iter().map(|s| s.percent).sum();
    assert!((stage_share - 100.0).abs() < 0.1);
}

#[test]
fn avg_processing_days_ignores_unfinished_tenders() {
    let dept = stage("bidding", StageCategory::TenderDept);
    let tenders = vec![
        tender("a", TenderStatus::Active, &dept, 30),
        tender("w1", TenderStatus::Won, &dept, 4),
        tender("w2", TenderStatus::Won, &dept, 6),
    ];
    let r = generate_department_report(&scope(), &tenders);
    assert_eq!(r.overview.avg_processing_days, 5);
}

#[test]
fn empty_input_gives_zeroed_reports_without_nan() {
    let r = generate_department_report(&scope(), &[]);
    assert_eq!(r.overview.total_tenders, 0);
    assert!(r.specialists.is_empty());
    assert_eq!(r.overview.win_rate, 0.0);

    let health = generate_financial_health(&scope(), &[], &FinanceExtras::default());
    let season = generate_seasonality(&scope(), &[]);
    let calendar = generate_payment_calendar(
        &scope(),
        &[],
        &[],
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );

    for json in [
        serde_json::to_string(&r).unwrap(),
        serde_json::to_string(&health).unwrap(),
        serde_json::to_string(&season).unwrap(),
        serde_json::to_string(&calendar).unwrap(),
    ] {
        // serde_json writes non-finite floats as null
        assert!(!json.contains("null"), "{}", json);
    }
    let value = serde_json::to_value(&r).unwrap();
    assert_eq!(value["overview"]["totalTenders"], 0);
}

#[test]
fn savings_band_uses_minor_units() {
    let at = base_time();
    let rows = vec![
        Transaction {
            id: "in".to_string(),
            company_id: "acme".to_string(),
            amount: 200_000,
            kind: TransactionKind::Income,
            occurred_at: at,
            category: None,
        },
        Transaction {
            id: "out".to_string(),
            company_id: "acme".to_string(),
            amount: -150_000,
            kind: TransactionKind::Expense,
            occurred_at: at,
            category: Some("Office".to_string()),
        },
    ];
    let r = generate_financial_health(&scope(), &rows, &FinanceExtras::default());
    assert_eq!(r.categories.savings.score, 100);
    assert_eq!(r.categories.savings.weight, 0.35);
    assert_eq!(r.categories.savings.value, 25.0);
    assert_eq!(r.total_income, 200_000);
    assert_eq!(r.total_expense, 150_000);
}

#[test]
fn reports_are_idempotent() {
    let dept = stage("bidding", StageCategory::TenderDept);
    let tenders = vec![
        tender("1", TenderStatus::Won, &dept, 2),
        tender("2", TenderStatus::Lost, &dept, 9),
    ];
    let first = generate_department_report(&scope(), &tenders);
    let second = generate_department_report(&scope(), &tenders);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
