//! Fetching the transactions that make up a report.

use rusqlite::{Connection, Row};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    date_range::{DateRange, DateRangeQuery},
    entity::EntityId,
    product::ProductId,
    transaction::{TransactionId, TransactionKind},
    user::UserID,
};

/// The raw `start`, `end` and `kind` query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub kind: Option<String>,
}

/// Which transactions a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFilter {
    pub range: DateRange,
    pub kind: TransactionKind,
}

impl ReportFilter {
    /// Missing or invalid parameters fall back to sales for the current
    /// month to date.
    pub fn from_query(query: &ReportQuery, today: Date) -> Self {
        let range = DateRange::from_query(
            &DateRangeQuery {
                start: query.start.clone(),
                end: query.end.clone(),
            },
            today,
        );
        let kind = query
            .kind
            .as_deref()
            .and_then(|kind| kind.parse().ok())
            .unwrap_or(TransactionKind::Sale);

        Self { range, kind }
    }

    /// The query string that reproduces this filter, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        format!(
            "start={}&end={}&kind={}",
            self.range.start, self.range.end, self.kind
        )
    }
}

/// A transaction with the names of its product and counterparty.
///
/// The ids and names are `None` when the product or counterparty has been
/// deleted since.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: TransactionId,
    pub date: Date,
    pub kind: TransactionKind,
    pub value: f64,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub entity_id: Option<EntityId>,
    pub entity_name: Option<String>,
}

/// The user's sales and purchases dated within `range`, oldest first.
///
/// An empty range gives no rows.
pub fn get_report_rows(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<ReportRow>, Error> {
    if range.is_empty() {
        return Ok(Vec::new());
    }

    connection
        .prepare(
            "SELECT t.id, t.date, t.kind, t.value, p.id, p.name, e.id, e.name
            FROM \"transaction\" t
            LEFT JOIN product p ON p.id = t.product_id AND p.user_id = t.user_id
            LEFT JOIN entity e ON e.id = t.entity_id AND e.user_id = t.user_id
            WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
            ORDER BY t.date ASC, t.id ASC",
        )?
        .query_map((user_id.as_i64(), range.start, range.end), map_report_row)?
        .collect::<Result<_, _>>()
        .map_err(Error::from)
}

fn map_report_row(row: &Row) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        date: row.get(1)?,
        kind: row.get(2)?,
        value: row.get(3)?,
        product_id: row.get(4)?,
        product_name: row.get(5)?,
        entity_id: row.get(6)?,
        entity_name: row.get(7)?,
    })
}
