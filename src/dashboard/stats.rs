//! Month-to-date totals for the dashboard.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    date_range::{first_of_month, first_of_next_month},
    transaction::TransactionKind,
    user::UserID,
};

/// The user's totals for the month containing a given day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyStats {
    pub total_sales: f64,
    pub total_purchases: f64,
}

/// Sum the user's sales and purchases dated in the same month as `today`.
pub fn get_monthly_stats(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<MonthlyStats, Error> {
    let mut statement = connection.prepare(
        "SELECT kind, COALESCE(SUM(value), 0.0)
        FROM \"transaction\"
        WHERE user_id = ?1 AND date >= ?2 AND date < ?3
        GROUP BY kind",
    )?;
    let totals = statement.query_map(
        (
            user_id.as_i64(),
            first_of_month(today),
            first_of_next_month(today),
        ),
        |row| Ok((row.get::<_, TransactionKind>(0)?, row.get::<_, f64>(1)?)),
    )?;

    let mut stats = MonthlyStats::default();
    for total in totals {
        match total? {
            (TransactionKind::Sale, value) => stats.total_sales = value,
            (TransactionKind::Purchase, value) => stats.total_purchases = value,
        }
    }

    Ok(stats)
}
