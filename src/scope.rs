// Tenant and period a report is computed for. Every report entry point takes
// one explicitly, so rows from other companies never leak into a result.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl CompanyId {
    pub fn new(id: impl Into<String>) -> Self {
        CompanyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScope {
    pub company_id: CompanyId,
    /// Inclusive lower bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDate>,
}

impl ReportScope {
    pub fn company(company_id: impl Into<String>) -> Self {
        ReportScope {
            company_id: CompanyId::new(company_id),
            from: None,
            to: None,
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn owns(&self, company_id: &str) -> bool {
        self.company_id.as_str() == company_id
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// Row belongs to this company and falls inside the period.
    pub fn admits(&self, company_id: &str, date: NaiveDate) -> bool {
        self.owns(company_id) && self.covers(date)
    }
}
