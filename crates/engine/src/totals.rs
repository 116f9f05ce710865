//! Statement totals.
//!
//! The backend may report credit/debit/balance for the whole filtered
//! result set in response headers. When it does not, totals are rebuilt
//! from the rows of the loaded page only and flagged as partial.

use serde::Serialize;

use crate::{MoneyCents, NormalizedRow};

/// Totals as reported by the transport; every field is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportTotals {
    pub credit: Option<MoneyCents>,
    pub debit: Option<MoneyCents>,
    pub balance: Option<MoneyCents>,
    pub count: Option<u64>,
}

impl TransportTotals {
    /// Transport totals are trusted only when at least one figure is non-zero.
    pub fn is_meaningful(&self) -> bool {
        [self.credit, self.debit, self.balance]
            .into_iter()
            .flatten()
            .any(|amount| !amount.is_zero())
            || self.count.is_some_and(|count| count != 0)
    }
}

/// Where a [`TotalsSummary`] came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TotalsSource {
    /// Reported by the backend for the whole result set.
    Transport,
    /// Aggregated from the currently loaded page.
    #[default]
    Page,
}

/// Credit/debit/balance summary.
///
/// `debit` is always a positive magnitude and `balance = credit - debit`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TotalsSummary {
    pub credit: MoneyCents,
    pub debit: MoneyCents,
    pub balance: MoneyCents,
    pub count: u64,
    pub source: TotalsSource,
}

impl TotalsSummary {
    /// Page-scoped totals only describe the rows on screen.
    pub fn is_partial(&self) -> bool {
        self.source == TotalsSource::Page
    }
}

/// Picks transport totals when meaningful, otherwise aggregates `rows`.
///
/// Debit rows contribute their absolute value, so a backend that sends
/// debits as positive amounts and a row whose sign was normalized negative
/// add up the same way. Rows with an unknown kind are counted but are
/// neither credit nor debit.
pub fn reconcile(transport: Option<&TransportTotals>, rows: &[NormalizedRow]) -> TotalsSummary {
    if let Some(totals) = transport.filter(|totals| totals.is_meaningful()) {
        let credit = totals.credit.unwrap_or_default();
        let debit = totals.debit.unwrap_or_default();
        return TotalsSummary {
            credit,
            debit,
            balance: totals.balance.unwrap_or(credit - debit),
            count: totals.count.unwrap_or(rows.len() as u64),
            source: TotalsSource::Transport,
        };
    }

    let credit: MoneyCents = rows
        .iter()
        .filter(|row| row.is_credit())
        .map(|row| row.amount)
        .sum();
    let debit: MoneyCents = rows
        .iter()
        .filter(|row| row.is_debit())
        .map(|row| row.amount.abs())
        .sum();

    TotalsSummary {
        credit,
        debit,
        balance: credit - debit,
        count: rows.len() as u64,
        source: TotalsSource::Page,
    }
}
