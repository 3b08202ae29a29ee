//! Report builders. Each takes an explicit `ReportScope` and already-loaded
//! rows, and always returns a complete report; empty input gives zeros.

pub mod calendar;
pub mod department;
pub mod health;
pub mod seasonality;

pub use calendar::{generate_payment_calendar, PaymentCalendarReport};
pub use department::{generate_department_report, DepartmentReportData};
pub use health::{generate_financial_health, FinancialHealthReport};
pub use seasonality::{generate_seasonality, SeasonalityReport};
