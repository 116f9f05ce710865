//! Domain logic of the ledger statement viewer.
//!
//! Everything here is pure: the HTTP client and the terminal front end
//! live in the `extrato_tui` crate and feed raw bodies and headers in.
//!
//! A loaded page goes through [`Statement::assemble`]: rows are normalized,
//! totals reconciled against the transport and pagination resolved.

pub use error::EngineError;
pub use export::rows_to_csv;
pub use filters::{FilterState, Preset};
pub use money::{DecimalMark, MoneyCents};
pub use normalize::{NormalizedRow, RowKind, normalize, normalize_all};
pub use pagination::{PageInfo, PageMeta, paginate};
pub use query::{CsvScope, QueryParams, build_csv_params, build_params};
pub use session::Session;
pub use statement::Statement;
pub use totals::{TotalsSource, TotalsSummary, TransportTotals, reconcile};
pub use transport::TransportMeta;

mod error;
mod export;
pub mod filters;
mod money;
pub mod normalize;
mod pagination;
pub mod query;
mod session;
mod statement;
pub mod token;
mod totals;
mod transport;

pub type ResultEngine<T> = Result<T, EngineError>;
