use api_types::ledger::CsvStyle;
use engine::{
    CsvScope, FilterState, MoneyCents, PageInfo, RowKind, Statement, TotalsSource, TransportMeta,
    build_csv_params, build_params, normalize, rows_to_csv, token,
};
use serde_json::{Value, json};

fn page_body() -> Value {
    json!([
        {"id": 1, "data": "2025-08-14 03:05:39", "tipo": "CREDITO", "valor": 1500.0, "descricao": "Salário"},
        {"tx_id": "b-2", "created_at": "2025-08-15T10:00:00Z", "tipo": "DEBITO", "valor": "250,50", "memo": "Mercado"},
        {"numero": 3, "amount": "45,90", "debito": true},
        {"seq": 4, "valor_centavos": 12345},
        null,
    ])
}

#[test]
fn page_without_headers_uses_local_totals() {
    let filters = FilterState::default();
    let statement = Statement::assemble(&page_body(), &TransportMeta::default(), &filters);

    assert_eq!(statement.rows.len(), 5);
    assert_eq!(statement.rows[1].kind, Some(RowKind::Debit));
    assert_eq!(statement.rows[2].amount, MoneyCents::new(-4590));
    assert_eq!(statement.rows[3].amount, MoneyCents::new(12345));
    assert_eq!(statement.rows[4].kind, None);

    let totals = statement.totals;
    assert_eq!(totals.source, TotalsSource::Page);
    assert!(totals.is_partial());
    assert_eq!(totals.credit, MoneyCents::new(150_000 + 12_345));
    assert_eq!(totals.debit, MoneyCents::new(25_050 + 4_590));
    assert_eq!(totals.balance, totals.credit - totals.debit);
    assert_eq!(totals.count, 5);

    assert_eq!(
        statement.page,
        PageInfo {
            page: 1,
            page_size: 10,
            total_pages: 1,
            total: 5,
        }
    );
}

#[test]
fn headers_take_precedence_over_rows() {
    let meta = TransportMeta::from_headers([
        ("x-total", "95"),
        ("x-total-credito", "10000.00"),
        ("x-total-debito", "2500.00"),
        ("x-page", "3"),
        ("x-page-size", "10"),
    ]);
    let filters = FilterState {
        page: 3,
        ..FilterState::default()
    };
    let statement = Statement::assemble(&page_body(), &meta, &filters);

    assert_eq!(statement.totals.source, TotalsSource::Transport);
    assert_eq!(statement.totals.balance, MoneyCents::new(750_000));
    assert_eq!(statement.totals.count, 95);
    assert_eq!(statement.page.total_pages, 10);
    assert!(statement.page.has_prev());
    assert!(statement.page.has_next());
}

#[test]
fn all_zero_headers_are_ignored() {
    let meta = TransportMeta::from_headers([
        ("X-Total-Credito", "0"),
        ("X-Total-Debito", "0.00"),
        ("X-Total-Saldo", "0"),
    ]);
    let statement = Statement::assemble(&page_body(), &meta, &FilterState::default());
    assert_eq!(statement.totals.source, TotalsSource::Page);
}

#[test]
fn non_array_body_is_an_empty_page() {
    let statement = Statement::assemble(
        &json!({"detail": "oops"}),
        &TransportMeta::default(),
        &FilterState::default(),
    );
    assert!(statement.is_empty());
    assert_eq!(statement.totals.count, 0);
    assert_eq!(statement.page.total_pages, 1);
    assert!(!statement.page.has_next());
}

#[test]
fn normalize_is_pure() {
    let raw = json!({"uuid": "u", "date": "not a date", "type": "estorno", "value": "1,5"});
    let first = normalize(&raw);
    let second = normalize(&raw);
    assert_eq!(first, second);
    assert_eq!(first.timestamp, "not a date");
    assert_eq!(first.kind_label(), "ESTORNO");
    assert_eq!(first.amount, MoneyCents::new(150));
}

#[test]
fn explicit_credit_with_negative_amount_stays_credit() {
    let row = normalize(&json!({"tipo": "CREDITO", "valor": -5}));
    assert_eq!(row.kind, Some(RowKind::Credit));
    assert_eq!(row.amount, MoneyCents::new(-500));
}

#[test]
fn query_and_export_share_filters() {
    let mut filters = FilterState::default();
    filters.set_kind("debito");
    filters.set_range("2025-08-01", "2025-08-31").unwrap();

    let params = build_params(&filters);
    assert!(params.contains(&("tipo", "DEBITO".to_string())));
    assert!(params.contains(&("end", "2025-08-31T23:59:59".to_string())));

    let csv = build_csv_params(&filters, CsvScope::All, CsvStyle::Br);
    assert!(csv.contains(&("start", "2025-08-01T00:00:00".to_string())));
    assert!(!csv.iter().any(|(key, _)| *key == "page"));

    let statement = Statement::assemble(&page_body(), &TransportMeta::default(), &filters);
    let local = rows_to_csv(&statement.rows, CsvStyle::Br).unwrap();
    assert_eq!(local.lines().count(), 6);
}

#[test]
fn token_schedule_is_floored() {
    let now = 1_700_000_000_000;
    assert_eq!(
        token::renewal_delay(now + 60_000, now),
        std::time::Duration::from_millis(5_000)
    );
    assert_eq!(token::minutes_remaining(now + 600_000, now), 10);
    assert_eq!(token::decode_expiry("abc.###.def"), None);
}
