//! Payment calendar: recurring items expanded into dated events, tender
//! submission deadlines merged in, and a monthly cash-flow summary.

use crate::scope::ReportScope;
use crate::types::{
    Minor, PaymentCalendarItem, PaymentStatus, PaymentType, Recurrence, Tender,
};
use crate::util::month_key;
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Horizon used for open-ended recurrences when the scope has no end date.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;
/// Upper bound on occurrences produced for one calendar item.
pub const MAX_OCCURRENCES: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Payment,
    TenderDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Planned,
    Confirmed,
    Paid,
    Cancelled,
    Overdue,
    Deadline,
}

impl From<PaymentStatus> for EventStatus {
    fn from(s: PaymentStatus) -> Self {
        match s {
            PaymentStatus::Planned => EventStatus::Planned,
            PaymentStatus::Confirmed => EventStatus::Confirmed,
            PaymentStatus::Paid => EventStatus::Paid,
            PaymentStatus::Cancelled => EventStatus::Cancelled,
            PaymentStatus::Overdue => EventStatus::Overdue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    pub title: String,
    pub kind: EventKind,
    pub payment_type: Option<PaymentType>,
    pub amount: Minor,
    pub status: EventStatus,
    pub source_id: String,
    /// 0 for the item's own date, n for the n-th repetition.
    pub occurrence: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CashFlowMonth {
    pub month: String,
    pub planned_income: Minor,
    pub planned_expense: Minor,
    pub paid_income: Minor,
    pub paid_expense: Minor,
    pub net_planned: Minor,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalendarTotals {
    pub events: usize,
    pub tender_deadlines: usize,
    pub planned_income: Minor,
    pub planned_expense: Minor,
    pub paid_income: Minor,
    pub paid_expense: Minor,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentCalendarReport {
    pub as_of: Option<NaiveDate>,
    pub events: Vec<CalendarEvent>,
    pub monthly: Vec<CashFlowMonth>,
    pub totals: CalendarTotals,
}

/// Dates an item falls on inside `[from, until]`.
pub fn occurrences(
    item: &PaymentCalendarItem,
    from: Option<NaiveDate>,
    until: NaiveDate,
) -> Vec<(usize, NaiveDate)> {
    let last = item.recurrence_end.map_or(until, |end| end.min(until));
    let in_range = |d: NaiveDate| from.map_or(true, |f| d >= f) && d <= last;

    if item.recurrence == Recurrence::None {
        let d = item.planned_date;
        return if in_range(d) { vec![(0, d)] } else { Vec::new() };
    }

    let mut out = Vec::new();
    let mut n = from.map_or(0, |f| first_index(item.planned_date, item.recurrence, f));
    while let Some(d) = nth_date(item.planned_date, item.recurrence, n) {
        if d > last {
            break;
        }
        if out.len() == MAX_OCCURRENCES {
            warn!(item = %item.id, "recurrence truncated at {} occurrences", MAX_OCCURRENCES);
            break;
        }
        if in_range(d) {
            out.push((n, d));
        }
        n += 1;
    }
    out
}

/// Index of the last repetition that can still fall before `from`; nothing
/// earlier can land in range.
fn first_index(start: NaiveDate, recurrence: Recurrence, from: NaiveDate) -> usize {
    if from <= start {
        return 0;
    }
    let step_months = match recurrence {
        Recurrence::None => return 0,
        Recurrence::Weekly => return ((from - start).num_days() / 7) as usize,
        Recurrence::Monthly => 1,
        Recurrence::Quarterly => 3,
        Recurrence::Yearly => 12,
    };
    let months = (from.year() - start.year()) * 12 + from.month() as i32 - start.month() as i32;
    (months.max(0) / step_months) as usize
}

/// Offsets are taken from the original date so month-end days do not drift
/// (Jan 31 -> Feb 29 -> Mar 31).
fn nth_date(start: NaiveDate, recurrence: Recurrence, n: usize) -> Option<NaiveDate> {
    let n32 = u32::try_from(n).ok()?;
    match recurrence {
        Recurrence::None => (n == 0).then_some(start),
        Recurrence::Weekly => start.checked_add_signed(Duration::weeks(n as i64)),
        Recurrence::Monthly => start.checked_add_months(Months::new(n32)),
        Recurrence::Quarterly => start.checked_add_months(Months::new(n32.checked_mul(3)?)),
        Recurrence::Yearly => start.checked_add_months(Months::new(n32.checked_mul(12)?)),
    }
}

fn occurrence_status(item: &PaymentCalendarItem, n: usize, date: NaiveDate, as_of: NaiveDate) -> EventStatus {
    // settlement status belongs to the dated item, repetitions start out planned
    let base = if n == 0 { item.status } else { PaymentStatus::Planned };
    match base {
        PaymentStatus::Planned | PaymentStatus::Confirmed if date < as_of => EventStatus::Overdue,
        other => other.into(),
    }
}

pub fn generate_payment_calendar(
    scope: &ReportScope,
    items: &[PaymentCalendarItem],
    tenders: &[Tender],
    as_of: NaiveDate,
) -> PaymentCalendarReport {
    let until = scope
        .to
        .unwrap_or_else(|| as_of + Duration::days(DEFAULT_HORIZON_DAYS));

    let mut events: Vec<CalendarEvent> = Vec::new();
    for item in items.iter().filter(|i| scope.owns(&i.company_id)) {
        for (n, date) in occurrences(item, scope.from, until) {
            events.push(CalendarEvent {
                date,
                title: item.title.clone(),
                kind: EventKind::Payment,
                payment_type: Some(item.payment_type),
                amount: item.amount.abs(),
                status: occurrence_status(item, n, date, as_of),
                source_id: item.id.clone(),
                occurrence: n,
            });
        }
    }

    for t in tenders.iter().filter(|t| scope.owns(&t.company_id)) {
        if !t.status.is_in_flight() {
            continue;
        }
        let Some(deadline) = t.submission_deadline.map(|d| d.date_naive()) else { continue };
        if !scope.covers(deadline) || deadline > until {
            continue;
        }
        events.push(CalendarEvent {
            date: deadline,
            title: t.title.clone(),
            kind: EventKind::TenderDeadline,
            payment_type: None,
            amount: t.nmck,
            status: if deadline < as_of {
                EventStatus::Overdue
            } else {
                EventStatus::Deadline
            },
            source_id: t.id.clone(),
            occurrence: 0,
        });
    }

    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.occurrence.cmp(&b.occurrence))
    });

    let monthly = build_cash_flow(&events);
    let totals = build_totals(&events, &monthly);
    debug!(
        company = %scope.company_id,
        items = items.len(),
        events = events.len(),
        months = monthly.len(),
        "payment calendar assembled"
    );

    PaymentCalendarReport {
        as_of: Some(as_of),
        events,
        monthly,
        totals,
    }
}

fn build_cash_flow(events: &[CalendarEvent]) -> Vec<CashFlowMonth> {
    let mut map: BTreeMap<String, CashFlowMonth> = BTreeMap::new();
    for e in events {
        if e.kind != EventKind::Payment || e.status == EventStatus::Cancelled {
            continue;
        }
        let month = month_key(e.date);
        let row = map.entry(month.clone()).or_insert_with(|| CashFlowMonth {
            month,
            ..CashFlowMonth::default()
        });
        let paid = e.status == EventStatus::Paid;
        match e.payment_type {
            Some(PaymentType::Income) => {
                row.planned_income += e.amount;
                if paid {
                    row.paid_income += e.amount;
                }
            }
            Some(PaymentType::Expense) => {
                row.planned_expense += e.amount;
                if paid {
                    row.paid_expense += e.amount;
                }
            }
            None => {}
        }
        if e.status == EventStatus::Overdue {
            row.overdue_count += 1;
        }
    }
    map.into_values()
        .map(|mut row| {
            row.net_planned = row.planned_income - row.planned_expense;
            row
        })
        .collect()
}

fn build_totals(events: &[CalendarEvent], monthly: &[CashFlowMonth]) -> CalendarTotals {
    let mut t = CalendarTotals {
        events: events.len(),
        tender_deadlines: events
            .iter()
            .filter(|e| e.kind == EventKind::TenderDeadline)
            .count(),
        ..CalendarTotals::default()
    };
    for m in monthly {
        t.planned_income += m.planned_income;
        t.planned_expense += m.planned_expense;
        t.paid_income += m.paid_income;
        t.paid_expense += m.paid_expense;
        t.overdue_count += m.overdue_count;
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn item(id: &str, date: NaiveDate, recurrence: Recurrence, status: PaymentStatus) -> PaymentCalendarItem {
        PaymentCalendarItem {
            id: id.to_string(),
            company_id: "c1".to_string(),
            title: format!("Item {}", id),
            planned_date: date,
            actual_date: None,
            amount: 10_000,
            payment_type: PaymentType::Expense,
            status,
            recurrence,
            recurrence_end: None,
        }
    }

    #[test]
    fn monthly_recurrence_clamps_to_month_end() {
        let it = item("rent", d(2024, 1, 31), Recurrence::Monthly, PaymentStatus::Planned);
        let dates: Vec<NaiveDate> = occurrences(&it, None, d(2024, 4, 30))
            .into_iter()
            .map(|(_, date)| date)
            .collect();
        assert_eq!(dates, vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]);
    }

    #[test]
    fn recurrence_end_and_range_start_bound_occurrences() {
        let mut it = item("w", d(2024, 1, 1), Recurrence::Weekly, PaymentStatus::Planned);
        it.recurrence_end = Some(d(2024, 1, 29));
        let got = occurrences(&it, Some(d(2024, 1, 10)), d(2024, 12, 31));
        let dates: Vec<NaiveDate> = got.iter().map(|(_, date)| *date).collect();
        assert_eq!(dates, vec![d(2024, 1, 15), d(2024, 1, 22), d(2024, 1, 29)]);
        assert_eq!(got[0].0, 2);
    }

    #[test]
    fn old_open_ended_items_still_reach_the_range() {
        let it = item("fee", d(2004, 1, 5), Recurrence::Weekly, PaymentStatus::Paid);
        let got = occurrences(&it, Some(d(2024, 1, 1)), d(2024, 3, 31));
        assert_eq!(got.len(), 13);
        assert_eq!(got[0], (1043, d(2024, 1, 1)));
        assert_eq!(got[12].1, d(2024, 3, 25));

        let yearly = item("tax", d(1990, 3, 31), Recurrence::Yearly, PaymentStatus::Planned);
        let got = occurrences(&yearly, Some(d(2024, 1, 1)), d(2024, 12, 31));
        assert_eq!(got, vec![(34, d(2024, 3, 31))]);

        let scope = ReportScope::company("c1").between(d(2024, 1, 1), d(2024, 3, 31));
        let r = generate_payment_calendar(&scope, &[it], &[], d(2024, 1, 1));
        assert_eq!(r.totals.events, 13);
    }

    #[test]
    fn occurrence_cap_counts_only_kept_dates() {
        let it = item("w", d(2000, 1, 3), Recurrence::Weekly, PaymentStatus::Planned);
        let got = occurrences(&it, None, d(2030, 12, 31));
        assert_eq!(got.len(), MAX_OCCURRENCES);
        assert_eq!(got[0].1, d(2000, 1, 3));
    }

    #[test]
    fn overdue_and_cash_flow() {
        let scope = ReportScope::company("c1").between(d(2024, 1, 1), d(2024, 3, 31));
        let mut salary = item("in", d(2024, 1, 10), Recurrence::Quarterly, PaymentStatus::Paid);
        salary.payment_type = PaymentType::Income;
        salary.amount = 50_000;
        let items = vec![
            item("a", d(2024, 1, 5), Recurrence::Monthly, PaymentStatus::Paid),
            item("b", d(2024, 2, 1), Recurrence::None, PaymentStatus::Cancelled),
            salary,
        ];
        let r = generate_payment_calendar(&scope, &items, &[], d(2024, 2, 15));
        // a: Jan paid, Feb overdue, Mar planned; b cancelled; salary Jan paid
        assert_eq!(r.events.len(), 5);
        let feb = r.monthly.iter().find(|m| m.month == "2024-02").unwrap();
        assert_eq!(feb.overdue_count, 1);
        assert_eq!(feb.planned_expense, 10_000);
        let jan = &r.monthly[0];
        assert_eq!(jan.paid_income, 50_000);
        assert_eq!(jan.net_planned, 40_000);
        assert_eq!(r.totals.planned_expense, 30_000);
        assert_eq!(r.totals.paid_expense, 10_000);
    }

    #[test]
    fn empty_calendar() {
        let r = generate_payment_calendar(&ReportScope::company("c1"), &[], &[], d(2024, 1, 1));
        assert!(r.events.is_empty());
        assert!(r.monthly.is_empty());
        assert_eq!(r.totals, CalendarTotals::default());
    }
}
