//! Downloading the current report as a spreadsheet or PDF.

use axum::{
    Extension,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    report::{
        ReportFilter, ReportQuery, document::render_document, grouping::group_rows,
        page::ReportState, spreadsheet::render_spreadsheet,
    },
    user::UserID,
};

/// The download name, e.g. "Sales_Report_2025-01-01_to_2025-01-31.csv".
fn report_file_name(filter: &ReportFilter, extension: &str) -> String {
    format!(
        "{}_Report_{}_to_{}.{extension}",
        filter.kind.plural(),
        filter.range.start,
        filter.range.end
    )
}

fn attachment(
    filter: &ReportFilter,
    content_type: &'static str,
    extension: &str,
    bytes: Vec<u8>,
) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        report_file_name(filter, extension)
    );

    (
        [
            (CONTENT_TYPE, content_type.to_owned()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

pub async fn get_report_spreadsheet(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let (filter, ledger) = state.load(user_id, &query)?;
    let bytes = render_spreadsheet(&group_rows(ledger.of_kind(filter.kind)))?;

    Ok(attachment(&filter, "text/csv; charset=utf-8", "csv", bytes))
}

pub async fn get_report_document(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let (filter, ledger) = state.load(user_id, &query)?;
    let bytes = render_document(&filter, &group_rows(ledger.of_kind(filter.kind)))?;

    Ok(attachment(&filter, "application/pdf", "pdf", bytes))
}
