//! Form data for recording entries, and its validation.

use serde::Deserialize;
use time::{Date, Month};

use crate::{
    Error,
    date_range::parse_date,
    entity::EntityName,
    product::ProductName,
    transaction::{Amount, NewEntry, TransactionKind},
};

/// A single sale or purchase as submitted by the entry form.
///
/// `entity` and `product` hold the name picked from the suggestions. When
/// nothing was picked they are empty and the text typed into the matching
/// `*_search` box is used instead.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub entity_search: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub product_search: String,
    #[serde(default)]
    pub value: String,
}

impl EntryForm {
    /// Check every field before anything touches the database.
    ///
    /// An empty date means `today`.
    pub fn validate(&self, kind: TransactionKind, today: Date) -> Result<NewEntry, Error> {
        let date = match self.date.trim() {
            "" => today,
            text => parse_date(text).ok_or_else(|| Error::InvalidDate(text.to_owned()))?,
        };

        Ok(NewEntry {
            date,
            entity_name: EntityName::new(chosen_name(&self.entity, &self.entity_search))?,
            product_name: ProductName::new(chosen_name(&self.product, &self.product_search))?,
            amount: Amount::parse(&self.value)?,
            kind,
        })
    }
}

fn chosen_name<'a>(selected: &'a str, typed: &'a str) -> &'a str {
    if selected.trim().is_empty() {
        typed
    } else {
        selected
    }
}

/// Many entries for one month, as submitted by the bulk entry form.
///
/// The row fields are repeated once per row, so they must be parsed with
/// `axum_extra`'s `Form`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BulkEntryForm {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub entity: Vec<String>,
    #[serde(default)]
    pub product: Vec<String>,
    #[serde(default)]
    pub value: Vec<String>,
}

impl BulkEntryForm {
    /// The complete rows, each dated the first day of the period.
    ///
    /// Rows with a missing name or an invalid amount are skipped. The period
    /// and kind apply to every row so they must be valid.
    pub fn valid_entries(&self) -> Result<Vec<NewEntry>, Error> {
        let date = parse_period(&self.period)?;
        let kind: TransactionKind = self.kind.trim().parse()?;

        let row_count = self
            .entity
            .len()
            .max(self.product.len())
            .max(self.value.len());
        let field = |column: &[String], row: usize| column.get(row).cloned().unwrap_or_default();

        let entries = (0..row_count)
            .filter_map(|row| {
                let entry = EntryForm {
                    date: String::new(),
                    entity: field(&self.entity, row),
                    entity_search: String::new(),
                    product: field(&self.product, row),
                    product_search: String::new(),
                    value: field(&self.value, row),
                };

                entry.validate(kind, date).ok()
            })
            .collect();

        Ok(entries)
    }
}

/// Parse a "YYYY-MM" month into its first day.
pub fn parse_period(text: &str) -> Result<Date, Error> {
    let text = text.trim();
    let invalid = || Error::InvalidPeriod(text.to_owned());

    let (year, month) = text.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())
}
