//! Tender department analytics, financial health and payment calendar
//! reports over rows exported from the business platform's data layer.

pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod scope;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
pub use scope::{CompanyId, ReportScope};
