//! Sales and purchase reports for a date range, on screen and as downloads.

mod delete;
mod document;
mod export;
mod grouping;
mod ledger;
mod page;
mod query;
mod spreadsheet;

pub use delete::delete_transaction_endpoint;
pub use export::{get_report_document, get_report_spreadsheet};
pub use grouping::{UNKNOWN_CONTACT, UNKNOWN_PRODUCT};
pub use ledger::ReportLedger;
pub use page::get_reports_page;
pub use query::{ReportFilter, ReportQuery, ReportRow};
