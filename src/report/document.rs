//! The report as a printable PDF document.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::{
    Error,
    html::format_amount,
    report::{ReportFilter, grouping::GroupedReport},
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 7.0;
const AMOUNT_X: f32 = 160.0;

/// Writes lines top to bottom, starting a new page when one fills up.
struct PageWriter {
    document: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, Error> {
        let (document, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = document
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(export_error)?;
        let bold = document
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(export_error)?;
        let layer = document.get_page(page).get_layer(layer);

        Ok(Self {
            document,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn next_line(&mut self) {
        self.y -= LINE_HEIGHT;

        if self.y < MARGIN {
            let (page, layer) =
                self.document
                    .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.document.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn write(&mut self, indent: f32, text: &str, amount: Option<&str>, is_bold: bool) {
        let font = if is_bold { &self.bold } else { &self.regular };

        self.layer
            .use_text(text, 11.0, Mm(MARGIN + indent), Mm(self.y), font);
        if let Some(amount) = amount {
            self.layer
                .use_text(amount, 11.0, Mm(AMOUNT_X), Mm(self.y), font);
        }

        self.next_line();
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        self.document.save_to_bytes().map_err(export_error)
    }
}

/// Render `report` as a PDF with a title, a line per product and
/// counterparty, and the grand total.
pub fn render_document(filter: &ReportFilter, report: &GroupedReport) -> Result<Vec<u8>, Error> {
    let title = format!(
        "{} report: {} to {}",
        filter.kind.plural(),
        filter.range.start,
        filter.range.end
    );
    let mut writer = PageWriter::new(&title)?;

    writer.write(0.0, &title, None, true);
    writer.next_line();

    if report.products.is_empty() {
        writer.write(
            0.0,
            &format!("No {} in this period.", filter.kind.plural().to_lowercase()),
            None,
            false,
        );
    }

    for product in &report.products {
        writer.write(0.0, &product.name, Some(&rupees(product.total)), true);

        for counterparty in &product.counterparties {
            let mut amount = rupees(counterparty.total);
            if counterparty.count > 1 {
                amount.push_str(&format!(" (x{})", counterparty.count));
            }
            writer.write(8.0, &counterparty.name, Some(&amount), false);
        }
    }

    writer.next_line();
    writer.write(0.0, "Total", Some(&rupees(report.grand_total)), true);

    writer.finish()
}

// The builtin fonts have no rupee sign.
fn rupees(amount: f64) -> String {
    format!("Rs. {}", format_amount(amount))
}

fn export_error(error: impl std::fmt::Display) -> Error {
    tracing::error!("Could not write report document: {error}");
    Error::ExportError(error.to_string())
}
