//! The report as a CSV spreadsheet.

use crate::{
    Error,
    html::format_amount,
    report::grouping::GroupedReport,
};

const HEADER: [&str; 4] = ["Product", "Contact", "Count", "Amount"];

/// Write `report` as CSV: one row per product followed by a row per
/// counterparty, then the grand total.
pub fn render_spreadsheet(report: &GroupedReport) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(HEADER).map_err(export_error)?;

    for product in &report.products {
        let count: usize = product
            .counterparties
            .iter()
            .map(|counterparty| counterparty.count)
            .sum();
        writer
            .write_record([
                product.name.as_str(),
                "",
                count.to_string().as_str(),
                format_amount(product.total).as_str(),
            ])
            .map_err(export_error)?;

        for counterparty in &product.counterparties {
            writer
                .write_record([
                    "",
                    counterparty.name.as_str(),
                    counterparty.count.to_string().as_str(),
                    format_amount(counterparty.total).as_str(),
                ])
                .map_err(export_error)?;
        }
    }

    writer
        .write_record(["Total", "", "", format_amount(report.grand_total).as_str()])
        .map_err(export_error)?;

    writer
        .into_inner()
        .map_err(|error| export_error(error.into_error()))
}

fn export_error(error: impl std::fmt::Display) -> Error {
    tracing::error!("Could not write report spreadsheet: {error}");
    Error::ExportError(error.to_string())
}
