//! Statement filters.
//!
//! A [`FilterState`] lives for the whole process: it is restored from
//! local storage at startup, mutated by the user and written back after
//! every change. All mutations except explicit paging go back to page 1.

use api_types::ledger::SortDir;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, PageInfo, ResultEngine, normalize::parse_timestamp};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SORT_FIELD: &str = "data";
/// Columns the backend knows how to sort by.
pub const SORT_FIELDS: [&str; 5] = ["id", "data", "tipo", "valor", "descricao"];
/// Kind filter value meaning "no filter".
const ALL_KINDS: &str = "TODOS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    Today,
    Last7Days,
    Last30Days,
    CurrentMonth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Start bound as typed: a date (`YYYY-MM-DD`) or a full date-time.
    pub start: String,
    pub end: String,
    /// Upper-cased backend kind (`CREDITO`, `DEBITO`), empty for all.
    pub kind: String,
    pub page: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_dir: SortDir,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            start: String::new(),
            end: String::new(),
            kind: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_dir: SortDir::Desc,
        }
    }
}

impl FilterState {
    /// Repairs values restored from storage.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.page = self.page.max(1);
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.sort_field.trim().is_empty() {
            self.sort_field = DEFAULT_SORT_FIELD.to_string();
        }
        self.kind = clean_kind(&self.kind);
        self
    }

    pub fn set_kind(&mut self, kind: &str) {
        self.kind = clean_kind(kind);
        self.page = 1;
    }

    /// Sets the date range. Each bound must be empty, a date or a date-time.
    pub fn set_range(&mut self, start: &str, end: &str) -> ResultEngine<()> {
        let start = validate_bound(start)?;
        let end = validate_bound(end)?;
        self.start = start;
        self.end = end;
        self.page = 1;
        Ok(())
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self.page = 1;
    }

    /// Clicking the active column flips the direction; a new column starts
    /// ascending.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.sort_dir = self.sort_dir.flipped();
        } else {
            self.sort_field = field.to_string();
            self.sort_dir = SortDir::Asc;
        }
        self.page = 1;
    }

    /// Moves to the next sortable column.
    pub fn cycle_sort_field(&mut self) {
        let next = SORT_FIELDS
            .iter()
            .position(|field| *field == self.sort_field)
            .map(|idx| SORT_FIELDS[(idx + 1) % SORT_FIELDS.len()])
            .unwrap_or(DEFAULT_SORT_FIELD);
        self.toggle_sort(next);
    }

    pub fn flip_sort_dir(&mut self) {
        self.sort_dir = self.sort_dir.flipped();
        self.page = 1;
    }

    /// Drops dates and kind and restores the default page size.
    pub fn clear(&mut self) {
        self.start.clear();
        self.end.clear();
        self.kind.clear();
        self.page_size = DEFAULT_PAGE_SIZE;
        self.page = 1;
    }

    pub fn apply_preset(&mut self, preset: Preset, today: NaiveDate) {
        let (start, end) = match preset {
            Preset::Today => (today, today),
            Preset::Last7Days => (today - Duration::days(6), today),
            Preset::Last30Days => (today - Duration::days(29), today),
            Preset::CurrentMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (first, last_day_of_month(first).unwrap_or(today))
            }
        };
        self.start = start.format("%Y-%m-%d").to_string();
        self.end = end.format("%Y-%m-%d").to_string();
        self.page = 1;
    }

    /// Advances one page unless `info` says this is the last one.
    pub fn next_page(&mut self, info: &PageInfo) -> bool {
        if !info.has_next() {
            return false;
        }
        self.page = info.page + 1;
        true
    }

    pub fn prev_page(&mut self, info: &PageInfo) -> bool {
        if !info.has_prev() {
            return false;
        }
        self.page = info.page - 1;
        true
    }
}

fn clean_kind(kind: &str) -> String {
    let upper = kind.trim().to_uppercase();
    if upper == ALL_KINDS {
        String::new()
    } else {
        upper
    }
}

fn validate_bound(bound: &str) -> ResultEngine<String> {
    let bound = bound.trim();
    if bound.is_empty() || parse_timestamp(bound).is_some() {
        return Ok(bound.to_string());
    }
    Err(EngineError::InvalidDate(bound.to_string()))
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
