//! Tender department performance report.
//!
//! Only tenders sitting in a `tender_dept` or `archive` stage take part; rows
//! without a stage, or in realization stages, are left out of every section.

use crate::scope::ReportScope;
use crate::types::{Employee, Minor, NamedRef, StageCategory, Tender, TenderStatus};
use crate::util::{elapsed_days, month_key, percent, round_to, rounded_average};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentReportData {
    pub overview: Overview,
    pub specialists: Vec<SpecialistStat>,
    pub stages: Vec<StageStat>,
    pub by_type: Vec<DimensionStat>,
    pub by_platform: Vec<DimensionStat>,
    pub monthly: Vec<MonthlyStat>,
    pub processing_times: Vec<StageProcessingTime>,
    pub workload: Workload,
    pub loss_reasons: Vec<LossReasonStat>,
    /// Lost tenders for which nobody recorded a reason.
    pub unrecorded_loss_reasons: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_tenders: usize,
    pub active_tenders: usize,
    pub won_tenders: usize,
    pub lost_tenders: usize,
    pub cancelled_tenders: usize,
    pub win_rate: f64,
    pub total_nmck: Minor,
    pub won_contract_sum: Minor,
    /// NMCK minus contract price over won tenders that have a price.
    pub total_savings: Minor,
    pub avg_processing_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistStat {
    pub employee_id: String,
    pub name: String,
    pub total: usize,
    pub won: usize,
    pub lost: usize,
    pub active: usize,
    pub win_rate: f64,
    pub total_nmck: Minor,
    pub won_sum: Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStat {
    pub stage_id: String,
    pub name: String,
    pub color: Option<String>,
    pub category: StageCategory,
    pub count: usize,
    pub percent: f64,
    pub total_nmck: Minor,
}

/// Breakdown row for tender type and trading platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionStat {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub won: usize,
    pub win_rate: f64,
    pub total_nmck: Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: String,
    pub created: usize,
    pub won: usize,
    pub lost: usize,
    pub total_nmck: Minor,
    pub won_sum: Minor,
}

/// How long tenders currently in a stage have been in the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProcessingTime {
    pub stage_id: String,
    pub name: String,
    pub count: usize,
    pub avg_days: i64,
    pub min_days: i64,
    pub max_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub in_flight: usize,
    pub unassigned: usize,
    pub avg_per_employee: f64,
    pub max_per_employee: usize,
    pub employees: Vec<EmployeeLoad>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeLoad {
    pub employee_id: String,
    pub name: String,
    pub in_flight: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LossReasonStat {
    pub reason: String,
    pub count: usize,
    /// Share of all lost tenders, recorded reason or not.
    pub percent: f64,
}

pub fn generate_department_report(scope: &ReportScope, tenders: &[Tender]) -> DepartmentReportData {
    let dept: Vec<&Tender> = tenders
        .iter()
        .filter(|t| scope.admits(&t.company_id, t.created_at.date_naive()))
        .filter(|t| t.stage.as_ref().map_or(false, |s| s.category.is_department()))
        .collect();

    let report = DepartmentReportData {
        overview: build_overview(&dept),
        specialists: build_specialists(&dept),
        stages: build_stages(&dept),
        by_type: build_dimension(&dept, |t| t.tender_type.as_ref()),
        by_platform: build_dimension(&dept, |t| t.platform.as_ref()),
        monthly: build_monthly(&dept),
        processing_times: build_processing_times(&dept),
        workload: build_workload(&dept),
        loss_reasons: build_loss_reasons(&dept),
        unrecorded_loss_reasons: dept
            .iter()
            .filter(|t| t.status == TenderStatus::Lost && t.loss_reason.is_none())
            .count(),
    };
    debug!(
        company = %scope.company_id,
        input = tenders.len(),
        counted = dept.len(),
        specialists = report.specialists.len(),
        stages = report.stages.len(),
        "department report assembled"
    );
    report
}

fn win_rate(won: usize, total: usize) -> f64 {
    round_to(percent(won as f64, total as f64), 2)
}

fn processing_days(t: &Tender) -> i64 {
    elapsed_days(t.created_at, t.updated_at)
}

fn build_overview(dept: &[&Tender]) -> Overview {
    let mut o = Overview {
        total_tenders: dept.len(),
        ..Overview::default()
    };
    let mut processed_days = 0i64;
    let mut processed = 0usize;
    for &t in dept {
        o.total_nmck += t.nmck;
        match t.status {
            TenderStatus::Active => o.active_tenders += 1,
            TenderStatus::Won => {
                o.won_tenders += 1;
                if let Some(price) = t.contract_price {
                    o.won_contract_sum += price;
                    o.total_savings += t.nmck - price;
                }
            }
            TenderStatus::Lost => o.lost_tenders += 1,
            TenderStatus::Cancelled => o.cancelled_tenders += 1,
            _ => {}
        }
        if t.status.is_processed() {
            processed += 1;
            processed_days += processing_days(t);
        }
    }
    o.win_rate = win_rate(o.won_tenders, o.total_tenders);
    o.avg_processing_days = rounded_average(processed_days, processed);
    o
}

/// Manager and specialist of a tender, the same person counted once.
fn assignees(t: &Tender) -> Vec<&Employee> {
    let mut out: Vec<&Employee> = Vec::with_capacity(2);
    for e in [t.manager.as_ref(), t.specialist.as_ref()].into_iter().flatten() {
        if !out.iter().any(|seen| seen.id == e.id) {
            out.push(e);
        }
    }
    out
}

fn build_specialists(dept: &[&Tender]) -> Vec<SpecialistStat> {
    #[derive(Default)]
    struct Acc {
        name: String,
        total: usize,
        won: usize,
        lost: usize,
        active: usize,
        nmck: Minor,
        won_sum: Minor,
    }

    let mut map: HashMap<&str, Acc> = HashMap::new();
    for &t in dept {
        for e in assignees(t) {
            let acc = map.entry(e.id.as_str()).or_insert_with(|| Acc {
                name: e.full_name.clone(),
                ..Acc::default()
            });
            acc.total += 1;
            acc.nmck += t.nmck;
            match t.status {
                TenderStatus::Won => {
                    acc.won += 1;
                    acc.won_sum += t.contract_price.unwrap_or(0);
                }
                TenderStatus::Lost => acc.lost += 1,
                TenderStatus::Active => acc.active += 1,
                _ => {}
            }
        }
    }

    let mut rows: Vec<SpecialistStat> = map
        .into_iter()
        .map(|(id, acc)| SpecialistStat {
            employee_id: id.to_string(),
            win_rate: win_rate(acc.won, acc.total),
            name: acc.name,
            total: acc.total,
            won: acc.won,
            lost: acc.lost,
            active: acc.active,
            total_nmck: acc.nmck,
            won_sum: acc.won_sum,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.won
            .cmp(&a.won)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    rows
}

fn build_stages(dept: &[&Tender]) -> Vec<StageStat> {
    let mut map: HashMap<&str, StageStat> = HashMap::new();
    for &t in dept {
        let Some(stage) = t.stage.as_ref() else { continue };
        let row = map.entry(stage.id.as_str()).or_insert_with(|| StageStat {
            stage_id: stage.id.clone(),
            name: stage.name.clone(),
            color: stage.color.clone(),
            category: stage.category,
            count: 0,
            percent: 0.0,
            total_nmck: 0,
        });
        row.count += 1;
        row.total_nmck += t.nmck;
    }

    let grand_total = dept.len();
    let mut rows: Vec<StageStat> = map
        .into_values()
        .map(|mut row| {
            row.percent = round_to(percent(row.count as f64, grand_total as f64), 2);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.stage_id.cmp(&b.stage_id))
    });
    rows
}

fn build_dimension<F>(dept: &[&Tender], key: F) -> Vec<DimensionStat>
where
    F: Fn(&Tender) -> Option<&NamedRef>,
{
    let mut map: HashMap<&str, DimensionStat> = HashMap::new();
    for &t in dept {
        let Some(dim) = key(t) else { continue };
        let row = map.entry(dim.id.as_str()).or_insert_with(|| DimensionStat {
            id: dim.id.clone(),
            name: dim.name.clone(),
            count: 0,
            won: 0,
            win_rate: 0.0,
            total_nmck: 0,
        });
        row.count += 1;
        row.total_nmck += t.nmck;
        if t.status == TenderStatus::Won {
            row.won += 1;
        }
    }
    let mut rows: Vec<DimensionStat> = map
        .into_values()
        .map(|mut row| {
            row.win_rate = win_rate(row.won, row.count);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    rows
}

fn build_monthly(dept: &[&Tender]) -> Vec<MonthlyStat> {
    let mut map: BTreeMap<String, MonthlyStat> = BTreeMap::new();
    for &t in dept {
        let month = month_key(t.created_at.date_naive());
        let row = map.entry(month.clone()).or_insert_with(|| MonthlyStat {
            month,
            created: 0,
            won: 0,
            lost: 0,
            total_nmck: 0,
            won_sum: 0,
        });
        row.created += 1;
        row.total_nmck += t.nmck;
        match t.status {
            TenderStatus::Won => {
                row.won += 1;
                row.won_sum += t.contract_price.unwrap_or(0);
            }
            TenderStatus::Lost => row.lost += 1,
            _ => {}
        }
    }
    map.into_values().collect()
}

fn build_processing_times(dept: &[&Tender]) -> Vec<StageProcessingTime> {
    struct Acc {
        name: String,
        category: StageCategory,
        sort_order: i32,
        days: Vec<i64>,
    }

    let mut map: HashMap<&str, Acc> = HashMap::new();
    for &t in dept {
        let Some(stage) = t.stage.as_ref() else { continue };
        map.entry(stage.id.as_str())
            .or_insert_with(|| Acc {
                name: stage.name.clone(),
                category: stage.category,
                sort_order: stage.sort_order,
                days: Vec::new(),
            })
            .days
            .push(processing_days(t));
    }

    let mut rows: Vec<(StageCategory, i32, StageProcessingTime)> = map
        .into_iter()
        .map(|(id, acc)| {
            let total: i64 = acc.days.iter().sum();
            let row = StageProcessingTime {
                stage_id: id.to_string(),
                name: acc.name,
                count: acc.days.len(),
                avg_days: rounded_average(total, acc.days.len()),
                min_days: acc.days.iter().copied().min().unwrap_or(0),
                max_days: acc.days.iter().copied().max().unwrap_or(0),
            };
            (acc.category, acc.sort_order, row)
        })
        .collect();
    rows.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.name.cmp(&b.2.name))
            .then_with(|| a.2.stage_id.cmp(&b.2.stage_id))
    });
    rows.into_iter().map(|(_, _, row)| row).collect()
}

fn build_workload(dept: &[&Tender]) -> Workload {
    let mut map: HashMap<&str, EmployeeLoad> = HashMap::new();
    let mut w = Workload::default();
    for t in dept.iter().copied().filter(|t| t.status.is_in_flight()) {
        w.in_flight += 1;
        let people = assignees(t);
        if people.is_empty() {
            w.unassigned += 1;
        }
        for e in people {
            let load = map.entry(e.id.as_str()).or_insert_with(|| EmployeeLoad {
                employee_id: e.id.clone(),
                name: e.full_name.clone(),
                in_flight: 0,
                overdue: 0,
            });
            load.in_flight += 1;
            if t.status == TenderStatus::Overdue {
                load.overdue += 1;
            }
        }
    }

    let mut employees: Vec<EmployeeLoad> = map.into_values().collect();
    employees.sort_by(|a, b| {
        b.in_flight
            .cmp(&a.in_flight)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    let assigned: usize = employees.iter().map(|e| e.in_flight).sum();
    w.avg_per_employee = if employees.is_empty() {
        0.0
    } else {
        round_to(assigned as f64 / employees.len() as f64, 1)
    };
    w.max_per_employee = employees.iter().map(|e| e.in_flight).max().unwrap_or(0);
    w.employees = employees;
    w
}

fn build_loss_reasons(dept: &[&Tender]) -> Vec<LossReasonStat> {
    let lost: Vec<&Tender> = dept
        .iter()
        .copied()
        .filter(|t| t.status == TenderStatus::Lost)
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in lost.iter().copied() {
        if let Some(reason) = t.loss_reason.as_deref() {
            *counts.entry(reason).or_default() += 1;
        }
    }
    let mut rows: Vec<LossReasonStat> = counts
        .into_iter()
        .map(|(reason, count)| LossReasonStat {
            reason: reason.to_string(),
            count,
            percent: round_to(percent(count as f64, lost.len() as f64), 2),
        })
        .collect();
    rows.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.reason.cmp(&b.reason),
        other => other,
    });
    rows
}
