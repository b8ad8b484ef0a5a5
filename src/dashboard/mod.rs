//! The overview page users land on after signing in.

mod handlers;
mod stats;

pub use handlers::get_dashboard_page;
pub use stats::{MonthlyStats, get_monthly_stats};
