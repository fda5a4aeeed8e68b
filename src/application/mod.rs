//! Use cases over the domain: load from the store, run the pure domain
//! logic, persist the result.

mod error;
pub mod reporting;
mod service;
mod suggestion;

pub use error::*;
pub use reporting::{CategoryShare, MonthReport, MonthTotals, MonthlySummary};
pub use service::*;
pub use suggestion::*;
