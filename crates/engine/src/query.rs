//! Request parameters for the ledger endpoints.

use api_types::ledger::CsvStyle;
use chrono::NaiveDate;

use crate::FilterState;

/// Ordered query parameters.
pub type QueryParams = Vec<(&'static str, String)>;

/// Which rows a server-side CSV export covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsvScope {
    /// Only the page currently on screen.
    Page,
    /// Every row matching the filters.
    All,
}

impl CsvScope {
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Page => "extrato_pagina",
            Self::All => "extrato_tudo",
        }
    }
}

/// Parameters for `GET /api/v1/ledger/{id}`.
///
/// `page`, `page_size`, `order_by` and `order_dir` are always sent; `tipo`,
/// `start` and `end` only when set.
pub fn build_params(filters: &FilterState) -> QueryParams {
    let mut params = vec![
        ("page", filters.page.max(1).to_string()),
        ("page_size", filters.page_size.max(1).to_string()),
        ("order_by", filters.sort_field.clone()),
        ("order_dir", filters.sort_dir.as_str().to_string()),
    ];
    push_optional_filters(&mut params, filters);
    params
}

/// Parameters for `GET /api/v1/ledger/{id}/csv`.
pub fn build_csv_params(filters: &FilterState, scope: CsvScope, style: CsvStyle) -> QueryParams {
    let mut params = vec![
        ("order_by", filters.sort_field.clone()),
        ("order_dir", filters.sort_dir.as_str().to_string()),
        ("csv_sep", style.separator().to_string()),
        ("csv_decimal", style.decimal_param().to_string()),
    ];
    push_optional_filters(&mut params, filters);
    if scope == CsvScope::Page {
        params.push(("page", filters.page.max(1).to_string()));
        params.push(("page_size", filters.page_size.max(1).to_string()));
    }
    params
}

/// A bare date becomes the start of that day.
pub fn widen_start(bound: &str) -> String {
    widen(bound, "T00:00:00")
}

/// A bare date becomes the end of that day.
pub fn widen_end(bound: &str) -> String {
    widen(bound, "T23:59:59")
}

/// Date-times typed with a space are sent with the ISO `T` separator.
fn widen(bound: &str, time: &str) -> String {
    let bound = bound.trim();
    if NaiveDate::parse_from_str(bound, "%Y-%m-%d").is_ok() {
        format!("{bound}{time}")
    } else {
        bound.replacen(' ', "T", 1)
    }
}

fn push_optional_filters(params: &mut QueryParams, filters: &FilterState) {
    if !filters.kind.is_empty() {
        params.push(("tipo", filters.kind.clone()));
    }
    let start = widen_start(&filters.start);
    if !start.is_empty() {
        params.push(("start", start));
    }
    let end = widen_end(&filters.end);
    if !end.is_empty() {
        params.push(("end", end));
    }
}
