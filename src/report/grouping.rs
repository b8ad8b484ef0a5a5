//! Grouping report rows by product, then by counterparty within each product.

use std::collections::HashMap;

use crate::report::ReportRow;

pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const UNKNOWN_CONTACT: &str = "Unknown contact";

/// What rows are grouped on: the id when the record still exists, otherwise
/// the name, otherwise everything unknown lands in one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Id(i64),
    Name(String),
    Unknown,
}

impl GroupKey {
    fn new(id: Option<i64>, name: Option<&str>) -> Self {
        match (id, name) {
            (Some(id), _) => GroupKey::Id(id),
            (None, Some(name)) => GroupKey::Name(name.to_owned()),
            (None, None) => GroupKey::Unknown,
        }
    }
}

/// A counterparty's share of a product's total.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductTotal {
    pub name: String,
    pub total: f64,
    pub counterparties: Vec<CounterpartyTotal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedReport {
    pub products: Vec<ProductTotal>,
    pub grand_total: f64,
}

/// Accumulates groups in the order their keys are first seen.
struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<V>,
}

impl<K: Eq + std::hash::Hash, V> OrderedGroups<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn entry(&mut self, key: K, create: impl FnOnce() -> V) -> &mut V {
        let position = *self.index.entry(key).or_insert_with(|| {
            self.groups.push(create());
            self.groups.len() - 1
        });

        &mut self.groups[position]
    }
}

/// Group `rows` by product and counterparty, largest totals first.
///
/// Groups with equal totals keep the order in which they first appear in
/// `rows`.
pub fn group_rows(rows: &[ReportRow]) -> GroupedReport {
    let mut products: OrderedGroups<GroupKey, (ProductTotal, OrderedGroups<GroupKey, CounterpartyTotal>)> =
        OrderedGroups::new();
    let mut grand_total = 0.0;

    for row in rows {
        let product_key = GroupKey::new(row.product_id, row.product_name.as_deref());
        let (product, counterparties) = products.entry(product_key, || {
            (
                ProductTotal {
                    name: row
                        .product_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_owned()),
                    total: 0.0,
                    counterparties: Vec::new(),
                },
                OrderedGroups::new(),
            )
        });
        product.total += row.value;

        let counterparty_key = GroupKey::new(row.entity_id, row.entity_name.as_deref());
        let counterparty = counterparties.entry(counterparty_key, || CounterpartyTotal {
            name: row
                .entity_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_CONTACT.to_owned()),
            total: 0.0,
            count: 0,
        });
        counterparty.total += row.value;
        counterparty.count += 1;

        grand_total += row.value;
    }

    let mut products: Vec<ProductTotal> = products
        .groups
        .into_iter()
        .map(|(mut product, counterparties)| {
            product.counterparties = counterparties.groups;
            product
                .counterparties
                .sort_by(|a, b| b.total.total_cmp(&a.total));
            product
        })
        .collect();
    products.sort_by(|a, b| b.total.total_cmp(&a.total));

    GroupedReport {
        products,
        grand_total,
    }
}

/// A counterparty's subtotal, with the number of transactions when there
/// is more than one.
pub fn format_subtotal(amount: &str, count: usize) -> String {
    if count > 1 {
        format!("{amount} (×{count})")
    } else {
        amount.to_owned()
    }
}

#[cfg(test)]
mod grouping_tests {
    use time::macros::date;

    use crate::{report::ReportRow, transaction::TransactionKind};

    use super::{UNKNOWN_CONTACT, UNKNOWN_PRODUCT, format_subtotal, group_rows};

    fn row(
        id: i64,
        product: Option<(i64, &str)>,
        entity: Option<(i64, &str)>,
        value: f64,
    ) -> ReportRow {
        ReportRow {
            id,
            date: date!(2025 - 01 - 01),
            kind: TransactionKind::Sale,
            value,
            product_id: product.map(|(id, _)| id),
            product_name: product.map(|(_, name)| name.to_owned()),
            entity_id: entity.map(|(id, _)| id),
            entity_name: entity.map(|(_, name)| name.to_owned()),
        }
    }

    #[test]
    fn groups_and_sorts_by_total() {
        let sugar = Some((1, "Sugar"));
        let rice = Some((2, "Rice"));
        let ravi = Some((1, "Ravi Stores"));
        let anand = Some((2, "Anand & Co"));
        let rows = vec![
            row(1, sugar, ravi, 40.0),
            row(2, rice, ravi, 250.0),
            row(3, sugar, anand, 60.0),
            row(4, sugar, ravi, 30.0),
        ];

        let report = group_rows(&rows);

        assert_eq!(report.grand_total, 380.0);
        let names: Vec<&str> = report.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Rice", "Sugar"]);
        let sugar_group = &report.products[1];
        assert_eq!(sugar_group.total, 130.0);
        let counterparties: Vec<(&str, f64, usize)> = sugar_group
            .counterparties
            .iter()
            .map(|c| (c.name.as_str(), c.total, c.count))
            .collect();
        assert_eq!(
            counterparties,
            vec![("Ravi Stores", 70.0, 2), ("Anand & Co", 60.0, 1)]
        );
    }

    #[test]
    fn totals_add_up_at_every_level() {
        let a = Some((1, "A"));
        let b = Some((2, "B"));
        let x = Some((1, "X"));
        let y = Some((2, "Y"));
        let rows = vec![
            row(1, a, x, 100.0),
            row(2, a, x, 50.0),
            row(3, a, y, 30.0),
            row(4, b, x, 10.0),
        ];

        let report = group_rows(&rows);

        let summary: Vec<(&str, f64, Vec<(&str, f64, usize)>)> = report
            .products
            .iter()
            .map(|product| {
                (
                    product.name.as_str(),
                    product.total,
                    product
                        .counterparties
                        .iter()
                        .map(|c| (c.name.as_str(), c.total, c.count))
                        .collect(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A", 180.0, vec![("X", 150.0, 2), ("Y", 30.0, 1)]),
                ("B", 10.0, vec![("X", 10.0, 1)]),
            ]
        );
        assert_eq!(report.grand_total, 190.0);
        let product_sum: f64 = report.products.iter().map(|p| p.total).sum();
        assert_eq!(product_sum, report.grand_total);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let rows = vec![
            row(1, Some((5, "Tea")), Some((1, "B")), 10.0),
            row(2, Some((3, "Dal")), Some((2, "A")), 10.0),
        ];

        let report = group_rows(&rows);

        let names: Vec<&str> = report.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Tea", "Dal"]);
    }

    #[test]
    fn missing_records_share_unknown_groups() {
        let rows = vec![
            row(1, None, None, 10.0),
            row(2, None, Some((1, "Ravi Stores")), 5.0),
            row(3, None, None, 2.5),
        ];

        let report = group_rows(&rows);

        assert_eq!(report.products.len(), 1);
        let unknown = &report.products[0];
        assert_eq!(unknown.name, UNKNOWN_PRODUCT);
        assert_eq!(unknown.total, 17.5);
        assert_eq!(unknown.counterparties[0].name, UNKNOWN_CONTACT);
        assert_eq!(unknown.counterparties[0].count, 2);
    }

    #[test]
    fn empty_rows_give_empty_report() {
        let report = group_rows(&[]);

        assert!(report.products.is_empty());
        assert_eq!(report.grand_total, 0.0);
    }

    #[test]
    fn count_shown_only_for_repeats() {
        assert_eq!(format_subtotal("₹70.00", 2), "₹70.00 (×2)");
        assert_eq!(format_subtotal("₹60.00", 1), "₹60.00");
    }
}
