use serde::Serialize;
use serde_json::Value;

use crate::{
    FilterState, NormalizedRow, PageInfo, TotalsSummary, TransportMeta, normalize::normalize_all,
    pagination::paginate, totals::reconcile,
};

/// One loaded page of the statement, ready to render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub rows: Vec<NormalizedRow>,
    pub totals: TotalsSummary,
    pub page: PageInfo,
}

impl Statement {
    /// Runs the response pipeline: normalize every row, then resolve totals
    /// and pagination from the transport metadata with local fallbacks.
    pub fn assemble(body: &Value, meta: &TransportMeta, filters: &FilterState) -> Self {
        let rows = normalize_all(body);
        let totals = reconcile(Some(&meta.totals), &rows);
        let page = paginate(
            Some(&meta.page),
            rows.len() as u64,
            filters.page.max(1),
            filters.page_size.max(1),
        );
        Self { rows, totals, page }
    }

    /// Empty state shown after an error or a logout.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
