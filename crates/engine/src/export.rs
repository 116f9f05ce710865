//! Local CSV rendering of the rows already on screen.

use api_types::ledger::CsvStyle;
use csv::{QuoteStyle, WriterBuilder};

use crate::{NormalizedRow, ResultEngine, money::DecimalMark};

const HEADER: [&str; 5] = ["id", "data", "tipo", "valor", "descricao"];

/// Renders `rows` as CSV, quoting every field.
///
/// The Brazilian style uses `;` and a decimal comma, the US style `,` and
/// a decimal dot. Line breaks inside descriptions are flattened.
pub fn rows_to_csv(rows: &[NormalizedRow], style: CsvStyle) -> ResultEngine<String> {
    let mark = match style {
        CsvStyle::Br => DecimalMark::Comma,
        CsvStyle::Us => DecimalMark::Dot,
    };

    let mut writer = WriterBuilder::new()
        .delimiter(style.separator() as u8)
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for row in rows {
        let description = row.description.replace(['\r', '\n'], " ");
        writer.write_record([
            row.id.as_str(),
            row.timestamp.as_str(),
            row.kind_label(),
            row.amount.format_decimal(mark).as_str(),
            description.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| crate::EngineError::Csv(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| crate::EngineError::Csv(err.to_string()))
}
