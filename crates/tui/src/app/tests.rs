use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::{Value, json};

use super::*;
use crate::local_state::{KEY_REFRESH_TOKEN, KEY_TOKEN, MemoryStore};

async fn spawn_api() -> String {
    let router = Router::new()
        .route("/api/v1/health", get(|| async { "ok" }))
        .route(
            "/api/v1/wallets",
            get(|| async {
                Json(json!([
                    {"id": 7, "user_id": 1, "saldo": "69,50"},
                    {"ledger_id": 9, "balance": -12.5},
                ]))
            }),
        )
        .route(
            "/api/v1/login",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "secret" {
                    Json(json!({"access_token": "a.b.c", "refresh_token": "r-1"})).into_response()
                } else {
                    StatusCode::UNAUTHORIZED.into_response()
                }
            }),
        )
        .route(
            "/api/v1/ledger/{id}",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                let page = query.get("page").cloned().unwrap_or_else(|| "1".to_string());
                (
                    [
                        ("x-total", "42".to_string()),
                        ("x-page", page),
                        ("x-page-size", "10".to_string()),
                    ],
                    Json(json!([
                        {"id": 1, "data": "2025-08-14T10:00:00Z", "tipo": "CREDITO", "valor": "10,00"},
                        {"id": 2, "data": "2025-08-14T11:00:00Z", "tipo": "DEBITO", "valor": -2.5},
                    ])),
                )
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn app_with(base_url: &str, store: MemoryStore) -> App<MemoryStore> {
    let config = AppConfig {
        base_url: base_url.to_string(),
        username: "ana".to_string(),
        download_dir: std::env::temp_dir().display().to_string(),
        ..AppConfig::default()
    };
    App::new(config, LocalState::new(store)).unwrap()
}

fn logged_in_store() -> MemoryStore {
    let mut store = MemoryStore::default();
    store.set(KEY_TOKEN, "stored".to_string()).unwrap();
    store.set(KEY_REFRESH_TOKEN, "r-0".to_string()).unwrap();
    store
}

fn press(app: &mut App<MemoryStore>, ch: char) {
    app.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
}

fn press_code(app: &mut App<MemoryStore>, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

async fn settle(app: &mut App<MemoryStore>) {
    let (generation, outcome) =
        tokio::time::timeout(Duration::from_secs(5), app.outcomes_rx.recv())
            .await
            .unwrap()
            .unwrap();
    app.receive(generation, outcome);
}

fn banner(app: &App<MemoryStore>) -> &str {
    app.state
        .banner
        .as_ref()
        .map(|banner| banner.message.as_str())
        .unwrap_or_default()
}

#[tokio::test]
async fn login_loads_the_first_ledger() {
    let base_url = spawn_api().await;
    let mut app = app_with(&base_url, MemoryStore::default());
    assert_eq!(app.state.screen, Screen::Login);

    for ch in "secret".chars() {
        press(&mut app, ch);
    }
    press_code(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.state.screen, Screen::Dashboard);
    assert_eq!(app.local.token().as_deref(), Some("a.b.c"));
    assert_eq!(app.local.refresh_token().as_deref(), Some("r-1"));
    assert!(app.state.login.password.is_empty());

    settle(&mut app).await;
    assert_eq!(app.state.healthy, Some(true));
    let ids: Vec<String> = app.state.ledgers.iter().map(|w| w.id.to_string()).collect();
    assert_eq!(ids, vec!["7".to_string(), "9".to_string()]);
    assert_eq!(app.local.ledger_id().as_deref(), Some("7"));
    let selected = app.state.selected_wallet().unwrap();
    assert_eq!(wallet_summary(selected), "#7  user 1  saldo R$ 69,50");

    settle(&mut app).await;
    assert!(!app.state.loading);
    assert_eq!(app.state.statement.rows.len(), 2);
    assert_eq!(app.state.statement.page.total_pages, 5);
    assert_eq!(app.state.statement.totals.count, 42);
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let base_url = spawn_api().await;
    let mut app = app_with(&base_url, MemoryStore::default());

    press(&mut app, 'x');
    press_code(&mut app, KeyCode::Enter);
    settle(&mut app).await;

    assert_eq!(app.state.screen, Screen::Login);
    assert_eq!(
        app.state.login.message.as_deref(),
        Some("Credenciais inválidas ou expiradas.")
    );
    assert_eq!(app.local.token(), None);
}

#[tokio::test]
async fn empty_credentials_are_not_sent() {
    let mut app = app_with("http://127.0.0.1:9", MemoryStore::default());
    press_code(&mut app, KeyCode::Enter);
    assert!(!app.state.loading);
    assert_eq!(
        app.state.login.message.as_deref(),
        Some("Preencha usuário e senha.")
    );
}

#[tokio::test]
async fn fetch_keys_are_ignored_while_loading() {
    let base_url = spawn_api().await;
    let mut store = logged_in_store();
    store.set(crate::local_state::KEY_LEDGER_ID, "7".to_string()).unwrap();
    let mut app = app_with(&base_url, store);

    press(&mut app, 'r');
    settle(&mut app).await;
    assert_eq!(app.state.statement.page.page, 1);

    press(&mut app, 'n');
    assert!(app.state.loading);
    assert_eq!(app.state.filters.page, 2);
    press(&mut app, 'n');
    press(&mut app, 's');
    assert_eq!(app.state.filters.page, 2);
    assert_eq!(app.state.filters.sort_field, FilterState::default().sort_field);

    settle(&mut app).await;
    assert_eq!(app.state.statement.page.page, 2);
    assert!(app.outcomes_rx.try_recv().is_err());
}

#[tokio::test]
async fn stored_tokens_open_the_dashboard() {
    let app = app_with("http://127.0.0.1:9", logged_in_store());
    assert_eq!(app.state.screen, Screen::Dashboard);
    assert_eq!(app.state.session.access_token, "stored");
    assert_eq!(app.state.session.refresh_token, "r-0");
}

#[tokio::test]
async fn presets_and_toggles_are_persisted() {
    let mut app = app_with("http://127.0.0.1:9", logged_in_store());

    press(&mut app, '2');
    let stored = app.local.filters().unwrap();
    assert!(!stored.start.is_empty());
    assert_eq!(stored, app.state.filters);
    assert_eq!(banner(&app), "Nenhum ledger selecionado (tecla l).");

    press(&mut app, 'm');
    assert_eq!(app.local.csv_style(), Some(CsvStyle::Us));

    press(&mut app, 'i');
    assert!(!app.local.ui_flags().show_id);
}

#[tokio::test]
async fn logout_wipes_tokens() {
    let mut app = app_with("http://127.0.0.1:9", logged_in_store());

    press(&mut app, 'L');

    assert_eq!(app.state.screen, Screen::Login);
    assert_eq!(app.local.token(), None);
    assert_eq!(app.local.refresh_token(), None);
    assert!(!app.state.session.is_authenticated());
    assert!(!app.client.has_token());
    assert_eq!(banner(&app), "Sessão encerrada.");
}

#[tokio::test]
async fn logout_discards_requests_in_flight() {
    let base_url = spawn_api().await;
    let mut store = logged_in_store();
    store.set(crate::local_state::KEY_LEDGER_ID, "7".to_string()).unwrap();
    let mut app = app_with(&base_url, store);

    press(&mut app, 'r');
    assert!(app.state.loading);
    press(&mut app, 'L');
    assert!(!app.state.loading);

    settle(&mut app).await;
    assert_eq!(app.state.screen, Screen::Login);
    assert!(app.state.statement.rows.is_empty());
    assert_eq!(app.state.statement.totals.count, 0);
    assert_eq!(banner(&app), "Sessão encerrada.");

    for ch in "secret".chars() {
        press(&mut app, ch);
    }
    press_code(&mut app, KeyCode::Enter);
    assert!(app.state.loading);
    settle(&mut app).await;
    assert_eq!(app.state.screen, Screen::Dashboard);
}

#[tokio::test]
async fn cycling_ledgers_follows_the_wallet_list() {
    let base_url = spawn_api().await;
    let mut app = app_with(&base_url, logged_in_store());
    app.start_session();
    settle(&mut app).await;
    settle(&mut app).await;
    assert_eq!(app.state.ledger_id.as_deref(), Some("7"));

    press(&mut app, 'l');
    assert_eq!(app.state.ledger_id.as_deref(), Some("9"));
    assert_eq!(app.local.ledger_id().as_deref(), Some("9"));
    let selected = app.state.selected_wallet().unwrap();
    assert_eq!(wallet_summary(selected), "#9  saldo -R$ 12,50");
    settle(&mut app).await;
}

#[test]
fn wallet_balances_accept_numbers_and_text() {
    assert_eq!(
        wallet_balance(&Numeric::Number(10.5)),
        Some(MoneyCents::new(1050))
    );
    assert_eq!(
        wallet_balance(&Numeric::Text("69,50".to_string())),
        Some(MoneyCents::new(6950))
    );
    assert_eq!(wallet_balance(&Numeric::Text("n/a".to_string())), None);
}

#[tokio::test]
async fn local_export_needs_rows() {
    let mut app = app_with("http://127.0.0.1:9", logged_in_store());
    press(&mut app, 'x');
    assert_eq!(banner(&app), "Nenhum dado para exportar!");
}

#[tokio::test]
async fn manual_renewal_needs_a_refresh_token() {
    let mut store = MemoryStore::default();
    store.set(KEY_TOKEN, "stored".to_string()).unwrap();
    let mut app = app_with("http://127.0.0.1:9", store);

    press(&mut app, 't');
    assert!(!app.state.loading);
    assert_eq!(
        banner(&app),
        "Sem refresh_token salvo. Faça login novamente."
    );
}

#[tokio::test]
async fn background_renewal_updates_the_stored_token() {
    let mut app = app_with("http://127.0.0.1:9", logged_in_store());

    app.apply_renewal_event(RenewalEvent::Renewed("fresh".to_string()));
    assert_eq!(app.state.session.access_token, "fresh");
    assert_eq!(app.state.session.refresh_token, "r-0");
    assert_eq!(app.local.token().as_deref(), Some("fresh"));

    app.apply_renewal_event(RenewalEvent::Failed("Servidor fora".to_string()));
    assert_eq!(banner(&app), "Renovação automática falhou: Servidor fora");
}
