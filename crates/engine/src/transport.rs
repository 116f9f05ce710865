//! Out-of-band metadata carried by ledger response headers.

use api_types::ledger::{
    HEADER_PAGE, HEADER_PAGE_SIZE, HEADER_TOTAL, HEADER_TOTAL_BALANCE,
    HEADER_TOTAL_BALANCE_PERIOD, HEADER_TOTAL_COUNT, HEADER_TOTAL_CREDIT, HEADER_TOTAL_DEBIT,
    HEADER_TOTAL_PAGES,
};

use crate::{MoneyCents, PageMeta, TransportTotals};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportMeta {
    pub totals: TransportTotals,
    pub page: PageMeta,
}

impl TransportMeta {
    /// Reads the `X-*` headers. Names match case-insensitively; values that
    /// do not parse count as absent.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let headers: Vec<(&str, &str)> = headers.into_iter().collect();
        let money = |name: &str| lookup(&headers, name).and_then(MoneyCents::parse_lenient);
        let small = |name: &str| lookup(&headers, name).and_then(parse_small);
        let total = lookup(&headers, HEADER_TOTAL)
            .and_then(parse_count)
            .or_else(|| lookup(&headers, HEADER_TOTAL_COUNT).and_then(parse_count));

        Self {
            totals: TransportTotals {
                credit: money(HEADER_TOTAL_CREDIT),
                debit: money(HEADER_TOTAL_DEBIT),
                balance: money(HEADER_TOTAL_BALANCE)
                    .or_else(|| money(HEADER_TOTAL_BALANCE_PERIOD)),
                count: total,
            },
            page: PageMeta {
                total,
                page: small(HEADER_PAGE),
                page_size: small(HEADER_PAGE_SIZE),
                total_pages: small(HEADER_TOTAL_PAGES),
            },
        }
    }
}

fn lookup<'a>(headers: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|&(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_count(value: &str) -> Option<u64> {
    if let Ok(count) = value.parse::<u64>() {
        return Some(count);
    }
    let float = value.parse::<f64>().ok()?;
    (float.is_finite() && float >= 0.0).then_some(float as u64)
}

fn parse_small(value: &str) -> Option<u32> {
    parse_count(value).and_then(|count| u32::try_from(count).ok())
}
