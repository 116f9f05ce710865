use std::{future::Future, path::PathBuf, time::Duration};

use api_types::{Numeric, ledger::CsvStyle, wallet::WalletView};
use chrono::Utc;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::{CsvScope, FilterState, MoneyCents, Preset, Session, Statement, rows_to_csv};
use tokio::{sync::mpsc, time::Instant};

use crate::{
    client::{Client, ClientError, normalize_base_url},
    config::AppConfig,
    error::{AppError, Result},
    local_state::{KeyValueStore, LocalState},
    session::{RenewalEvent, RenewalScheduler},
    ui::{
        self,
        keymap::{AppAction, is_fetch_key, map_key},
    },
};

mod state;

pub use state::{
    AppState, BANNER_TTL, Banner, BannerLevel, FilterField, FilterForm, LoginField, LoginState,
    Mode, Screen,
};

const LOCAL_CSV_NAME: &str = "extrato_local.csv";

type ClientResult<T> = std::result::Result<T, ClientError>;

/// Result of a background request, applied on the UI loop.
#[derive(Debug)]
enum Outcome {
    Bootstrap {
        healthy: bool,
        ledgers: ClientResult<Vec<WalletView>>,
    },
    Page(ClientResult<Statement>),
    Csv(ClientResult<(PathBuf, usize)>),
    Login(ClientResult<Session>),
    DevLogin(ClientResult<String>),
    Renewed(ClientResult<String>),
}

pub struct App<S> {
    config: AppConfig,
    client: Client,
    local: LocalState<S>,
    renewal: RenewalScheduler<Client>,
    renewal_events: mpsc::UnboundedReceiver<RenewalEvent>,
    outcomes_tx: mpsc::UnboundedSender<(u64, Outcome)>,
    outcomes_rx: mpsc::UnboundedReceiver<(u64, Outcome)>,
    /// Bumped on logout; outcomes tagged with an older value are dropped.
    generation: u64,
    pub state: AppState,
    should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(config: AppConfig, local: LocalState<S>) -> Result<Self> {
        let base_url = normalize_base_url(
            &local
                .base_url()
                .unwrap_or_else(|| config.base_url.clone()),
        );
        let mut client = Client::new(&base_url)?;
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();

        let filters = local.filters().unwrap_or_else(|| {
            let mut filters = FilterState::default();
            filters.set_page_size(config.page_size);
            filters
        });
        let session = local
            .token()
            .map(|token| Session::from_tokens(token, local.refresh_token().unwrap_or_default()))
            .unwrap_or_default();
        let screen = if session.is_authenticated() {
            client.set_token(Some(session.access_token.clone()));
            Screen::Dashboard
        } else {
            Screen::Login
        };

        let state = AppState {
            screen,
            mode: Mode::Browse,
            login: LoginState::new(&base_url, &config.username),
            base_url,
            ledger_id: local.ledger_id().or_else(|| config.ledger_id.clone()),
            ledgers: Vec::new(),
            healthy: None,
            session,
            filters,
            statement: Statement::empty(),
            csv_style: local.csv_style().unwrap_or(config.csv_style),
            ui_flags: local.ui_flags(),
            banner: None,
            loading: false,
            timezone: config.tz()?,
        };
        let (renewal, renewal_events) = RenewalScheduler::new(client.clone());

        Ok(Self {
            config,
            client,
            local,
            renewal,
            renewal_events,
            outcomes_tx,
            outcomes_rx,
            generation: 0,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.state.screen == Screen::Dashboard {
            self.start_session();
        }
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        self.renewal.cancel();
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.drain_background();
            self.state.expire_banner(Instant::now());

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key);
            }
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    fn drain_background(&mut self) {
        while let Ok((generation, outcome)) = self.outcomes_rx.try_recv() {
            self.receive(generation, outcome);
        }
        while let Ok(event) = self.renewal_events.try_recv() {
            self.apply_renewal_event(event);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match map_key(key) {
            AppAction::Quit => self.should_quit = true,
            AppAction::DevLogin => self.dev_login(),
            action => match self.state.screen {
                Screen::Login => self.handle_login_action(action),
                Screen::Dashboard => self.handle_dashboard_action(action),
            },
        }
    }

    fn handle_login_action(&mut self, action: AppAction) {
        let login = &mut self.state.login;
        match action {
            AppAction::Input(ch) => login.active_field_mut().push(ch),
            AppAction::Backspace => {
                login.active_field_mut().pop();
            }
            AppAction::NextField => login.advance_focus(),
            AppAction::Cancel => login.message = None,
            AppAction::Submit => self.attempt_login(),
            _ => {}
        }
    }

    fn handle_dashboard_action(&mut self, action: AppAction) {
        if matches!(self.state.mode, Mode::EditFilters(_)) {
            self.handle_filter_form(action);
            return;
        }
        if let AppAction::Input(ch) = action {
            self.handle_dashboard_key(ch);
        }
    }

    fn handle_filter_form(&mut self, action: AppAction) {
        let Mode::EditFilters(form) = &mut self.state.mode else {
            return;
        };
        match action {
            AppAction::Input(ch) => form.active_field_mut().push(ch),
            AppAction::Backspace => {
                form.active_field_mut().pop();
            }
            AppAction::NextField => form.advance_focus(),
            AppAction::Cancel => self.state.mode = Mode::Browse,
            AppAction::Submit if self.state.loading => {
                form.error = Some("Aguarde a requisição em andamento.".to_string());
            }
            AppAction::Submit => match form.apply_to(&self.state.filters) {
                Ok(filters) => {
                    self.state.mode = Mode::Browse;
                    self.state.filters = filters;
                    self.filters_changed();
                }
                Err(message) => form.error = Some(message),
            },
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, ch: char) {
        if self.state.loading && is_fetch_key(ch) {
            tracing::debug!("ignoring '{ch}' while a request is in flight");
            return;
        }

        match ch {
            'q' => self.should_quit = true,
            'n' => {
                if self.state.filters.next_page(&self.state.statement.page) {
                    self.filters_changed();
                }
            }
            'p' => {
                if self.state.filters.prev_page(&self.state.statement.page) {
                    self.filters_changed();
                }
            }
            'r' => self.fetch_page(),
            '/' => {
                self.state.mode = Mode::EditFilters(FilterForm::from_filters(&self.state.filters));
            }
            's' => {
                self.state.filters.cycle_sort_field();
                self.filters_changed();
            }
            'o' => {
                self.state.filters.flip_sort_dir();
                self.filters_changed();
            }
            '1' => self.apply_preset(Preset::Today),
            '2' => self.apply_preset(Preset::Last7Days),
            '3' => self.apply_preset(Preset::Last30Days),
            '4' => self.apply_preset(Preset::CurrentMonth),
            'c' => {
                self.state.filters.clear();
                self.filters_changed();
            }
            'l' => self.cycle_ledger(),
            'x' => self.export_local(),
            'e' => self.download(CsvScope::Page),
            'E' => self.download(CsvScope::All),
            'm' => self.toggle_csv_style(),
            't' => self.renew_token(),
            'i' => {
                self.state.ui_flags.show_id = !self.state.ui_flags.show_id;
                let flags = self.state.ui_flags;
                log_persist(self.local.set_ui_flags(flags));
            }
            'L' => self.logout(),
            _ => {}
        }
    }

    fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.state.loading = true;
        let tx = self.outcomes_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let _ = tx.send((generation, request.await));
        });
    }

    fn attempt_login(&mut self) {
        if self.state.loading {
            return;
        }
        let username = self.state.login.username.trim().to_string();
        let password = self.state.login.password.clone();
        if username.is_empty() || password.is_empty() {
            self.state.login.message = Some("Preencha usuário e senha.".to_string());
            return;
        }
        if let Err(err) = self.use_base_url(&self.state.login.base_url.clone()) {
            self.state.login.message = Some(err.user_message());
            return;
        }

        self.state.login.message = Some("Entrando...".to_string());
        let client = self.client.clone();
        self.spawn(async move { Outcome::Login(client.login(&username, &password).await) });
    }

    fn dev_login(&mut self) {
        if self.state.loading {
            return;
        }
        if self.state.screen == Screen::Login
            && let Err(err) = self.use_base_url(&self.state.login.base_url.clone())
        {
            self.state.login.message = Some(err.user_message());
            return;
        }
        let client = self.client.clone();
        self.spawn(async move { Outcome::DevLogin(client.login_dev().await) });
    }

    /// Points the client at `base_url`, rebuilding it only when it changed.
    fn use_base_url(&mut self, base_url: &str) -> ClientResult<()> {
        let base_url = normalize_base_url(base_url);
        if base_url == self.client.base_url() {
            return Ok(());
        }
        let client = Client::new(&base_url)?;
        let (renewal, renewal_events) = RenewalScheduler::new(client.clone());
        self.client = client;
        self.renewal = renewal;
        self.renewal_events = renewal_events;
        self.state.base_url = base_url.clone();
        self.state.login.base_url = base_url.clone();
        self.state.healthy = None;
        log_persist(self.local.set_base_url(&base_url));
        tracing::info!("base url set to {base_url}");
        Ok(())
    }

    /// Arms the client and the renewal task, then loads the dashboard.
    fn start_session(&mut self) {
        let session = &self.state.session;
        self.client.set_token(Some(session.access_token.clone()));
        self.renewal
            .schedule(&session.access_token, &session.refresh_token);

        let client = self.client.clone();
        self.spawn(async move {
            let healthy = client.health().await.is_ok();
            let ledgers = client.wallets().await;
            Outcome::Bootstrap { healthy, ledgers }
        });
    }

    fn fetch_page(&mut self) {
        let Some(ledger_id) = self.state.ledger_id.clone() else {
            self.state
                .show_banner(BannerLevel::Info, "Nenhum ledger selecionado (tecla l).");
            return;
        };
        let client = self.client.clone();
        let filters = self.state.filters.clone();
        self.spawn(async move { Outcome::Page(client.ledger_page(&ledger_id, &filters).await) });
    }

    fn filters_changed(&mut self) {
        log_persist(self.local.set_filters(&self.state.filters));
        self.fetch_page();
    }

    fn apply_preset(&mut self, preset: Preset) {
        let today = Utc::now().with_timezone(&self.state.timezone).date_naive();
        self.state.filters.apply_preset(preset, today);
        self.filters_changed();
    }

    fn cycle_ledger(&mut self) {
        if self.state.ledgers.is_empty() {
            self.state
                .show_banner(BannerLevel::Info, "Nenhum ledger disponível.");
            return;
        }
        let next = self
            .state
            .ledger_id
            .as_ref()
            .and_then(|current| {
                self.state
                    .ledgers
                    .iter()
                    .position(|wallet| wallet.id.to_string() == *current)
            })
            .map_or(0, |idx| (idx + 1) % self.state.ledgers.len());
        let ledger_id = self.state.ledgers[next].id.to_string();
        log_persist(self.local.set_ledger_id(&ledger_id));
        self.state.ledger_id = Some(ledger_id);
        self.state.filters.page = 1;
        self.filters_changed();
    }

    fn export_local(&mut self) {
        if self.state.statement.is_empty() {
            self.state
                .show_banner(BannerLevel::Error, "Nenhum dado para exportar!");
            return;
        }
        let path = self.config.download_path(LOCAL_CSV_NAME);
        let written = rows_to_csv(&self.state.statement.rows, self.state.csv_style)
            .map_err(AppError::from)
            .and_then(|csv| std::fs::write(&path, csv).map_err(AppError::from));
        match written {
            Ok(()) => self.state.show_banner(
                BannerLevel::Success,
                format!("CSV salvo em {}", path.display()),
            ),
            Err(err) => {
                tracing::warn!("local csv export failed: {err}");
                self.state
                    .show_banner(BannerLevel::Error, format!("Falha ao exportar CSV: {err}"));
            }
        }
    }

    fn download(&mut self, scope: CsvScope) {
        let Some(ledger_id) = self.state.ledger_id.clone() else {
            self.state
                .show_banner(BannerLevel::Info, "Nenhum ledger selecionado (tecla l).");
            return;
        };
        let dest = self
            .config
            .download_path(&format!("{}.csv", scope.file_stem()));
        let client = self.client.clone();
        let filters = self.state.filters.clone();
        let style = self.state.csv_style;
        self.spawn(async move {
            let result = client
                .download_csv(&ledger_id, &filters, scope, style, &dest)
                .await
                .map(|bytes| (dest, bytes));
            Outcome::Csv(result)
        });
    }

    fn toggle_csv_style(&mut self) {
        self.state.csv_style = self.state.csv_style.toggled();
        log_persist(self.local.set_csv_style(self.state.csv_style));
        self.state.show_banner(
            BannerLevel::Info,
            format!("Formato CSV: {}", csv_style_label(self.state.csv_style)),
        );
    }

    fn renew_token(&mut self) {
        if !self.state.session.has_refresh_token() {
            self.state.show_banner(
                BannerLevel::Error,
                "Sem refresh_token salvo. Faça login novamente.",
            );
            return;
        }
        let client = self.client.clone();
        let refresh_token = self.state.session.refresh_token.clone();
        self.spawn(async move { Outcome::Renewed(client.refresh(&refresh_token).await) });
    }

    fn logout(&mut self) {
        self.generation += 1;
        self.state.loading = false;
        self.renewal.cancel();
        log_persist(self.local.clear_tokens());
        self.state.session.clear();
        self.client.set_token(None);
        self.state.clear_statement();
        self.state.mode = Mode::Browse;
        self.state.screen = Screen::Login;
        self.state.login.password.clear();
        self.state.login.message = None;
        self.state.show_banner(BannerLevel::Info, "Sessão encerrada.");
        tracing::info!("logged out");
    }

    /// Installs a new access token, keeping the refresh token.
    fn accept_access_token(&mut self, access_token: String, reschedule: bool) {
        self.state.session.replace_access_token(access_token);
        let session = &self.state.session;
        self.client.set_token(Some(session.access_token.clone()));
        log_persist(self.local.set_access_token(&session.access_token));
        if reschedule {
            self.renewal
                .schedule(&session.access_token, &session.refresh_token);
        }
    }

    /// Applies an outcome unless a logout happened since it was spawned.
    fn receive(&mut self, generation: u64, outcome: Outcome) {
        if generation != self.generation {
            tracing::debug!("dropping outcome from a closed session");
            return;
        }
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        self.state.loading = false;
        match outcome {
            Outcome::Bootstrap { healthy, ledgers } => {
                self.state.healthy = Some(healthy);
                match ledgers {
                    Ok(ledgers) => {
                        if self.state.ledger_id.is_none()
                            && let Some(first) = ledgers.first()
                        {
                            let first = first.id.to_string();
                            log_persist(self.local.set_ledger_id(&first));
                            self.state.ledger_id = Some(first);
                        }
                        self.state.ledgers = ledgers;
                    }
                    Err(err) => {
                        tracing::warn!("wallet list failed: {err}");
                        self.state
                            .show_banner(BannerLevel::Error, err.user_message());
                    }
                }
                if self.state.ledger_id.is_some() {
                    self.fetch_page();
                }
            }
            Outcome::Page(Ok(statement)) => {
                self.state.filters.page = statement.page.page;
                self.state.statement = statement;
            }
            Outcome::Page(Err(err)) => {
                self.state
                    .show_banner(BannerLevel::Error, err.user_message());
                self.state.clear_statement();
            }
            Outcome::Csv(Ok((path, bytes))) => self.state.show_banner(
                BannerLevel::Success,
                format!("CSV salvo em {} ({bytes} bytes)", path.display()),
            ),
            Outcome::Csv(Err(err)) => self.state.show_banner(
                BannerLevel::Error,
                format!("Falha no download do CSV: {}", err.user_message()),
            ),
            Outcome::Login(Ok(session)) => {
                log_persist(
                    self.local
                        .set_tokens(&session.access_token, &session.refresh_token),
                );
                self.state.session = session;
                self.enter_dashboard("Login realizado com sucesso.");
            }
            Outcome::Login(Err(err)) => {
                self.state.login.message = Some(err.user_message());
            }
            Outcome::DevLogin(Ok(access_token)) => {
                let refresh_token = self.local.refresh_token().unwrap_or_default();
                log_persist(self.local.set_access_token(&access_token));
                if self.state.screen == Screen::Login {
                    self.state.session = Session::from_tokens(access_token, refresh_token);
                    self.enter_dashboard("Token DEV gerado.");
                } else {
                    self.accept_access_token(access_token, true);
                    self.state
                        .show_banner(BannerLevel::Success, "Token DEV gerado.");
                }
            }
            Outcome::DevLogin(Err(err)) | Outcome::Renewed(Err(err))
                if self.state.screen == Screen::Login =>
            {
                self.state.login.message = Some(err.user_message());
            }
            Outcome::DevLogin(Err(err)) | Outcome::Renewed(Err(err)) => {
                self.state.show_banner(
                    BannerLevel::Error,
                    format!("Falha ao renovar token: {}", err.user_message()),
                );
            }
            Outcome::Renewed(Ok(access_token)) => {
                self.accept_access_token(access_token, true);
                self.state
                    .show_banner(BannerLevel::Success, "Token renovado.");
            }
        }
    }

    fn enter_dashboard(&mut self, message: &str) {
        self.state.login.password.clear();
        self.state.login.message = None;
        self.state.screen = Screen::Dashboard;
        self.state.show_banner(BannerLevel::Success, message);
        self.start_session();
    }

    fn apply_renewal_event(&mut self, event: RenewalEvent) {
        match event {
            RenewalEvent::Renewed(access_token) => {
                self.accept_access_token(access_token, false);
            }
            RenewalEvent::Failed(message) => {
                self.state.show_banner(
                    BannerLevel::Error,
                    format!("Renovação automática falhou: {message}"),
                );
            }
        }
    }
}

pub fn csv_style_label(style: CsvStyle) -> &'static str {
    match style {
        CsvStyle::Br => "BR (; e vírgula)",
        CsvStyle::Us => "US (, e ponto)",
    }
}

/// Wallet balance in cents; text that does not parse as money is dropped.
pub fn wallet_balance(saldo: &Numeric) -> Option<MoneyCents> {
    match saldo {
        Numeric::Number(value) => Some(MoneyCents::from_major_lossy(*value)),
        Numeric::Text(text) => MoneyCents::parse_lenient(text),
    }
}

/// One-line description of a wallet: id, owner and balance when known.
pub fn wallet_summary(wallet: &WalletView) -> String {
    let mut summary = format!("#{}", wallet.id);
    if let Some(owner) = &wallet.user_id {
        summary.push_str(&format!("  user {owner}"));
    }
    if let Some(balance) = wallet.saldo.as_ref().and_then(wallet_balance) {
        summary.push_str(&format!("  saldo {}", balance.format_brl()));
    }
    summary
}

fn log_persist(result: Result<()>) {
    if let Err(err) = result {
        tracing::warn!("failed to persist local state: {err}");
    }
}

#[cfg(test)]
mod tests;
