use crate::{
    report::ReportRow,
    transaction::{TransactionId, TransactionKind},
};

/// The rows fetched for a report, also split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLedger {
    all: Vec<ReportRow>,
    sales: Vec<ReportRow>,
    purchases: Vec<ReportRow>,
}

impl ReportLedger {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        let (sales, purchases): (Vec<_>, Vec<_>) = rows
            .iter()
            .cloned()
            .partition(|row| row.kind == TransactionKind::Sale);

        Self {
            all: rows,
            sales,
            purchases,
        }
    }

    pub fn all(&self) -> &[ReportRow] {
        &self.all
    }

    pub fn of_kind(&self, kind: TransactionKind) -> &[ReportRow] {
        match kind {
            TransactionKind::Sale => &self.sales,
            TransactionKind::Purchase => &self.purchases,
        }
    }

    /// Drop the transaction `id` from every collection at once. Returns
    /// whether it was present.
    pub fn remove(&mut self, id: TransactionId) -> bool {
        let before = self.all.len();

        self.all.retain(|row| row.id != id);
        self.sales.retain(|row| row.id != id);
        self.purchases.retain(|row| row.id != id);

        self.all.len() != before
    }
}
