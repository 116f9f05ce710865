use std::time::Duration;

use api_types::{ledger::CsvStyle, wallet::WalletView};
use chrono_tz::Tz;
use engine::{FilterState, Session, Statement};
use tokio::time::Instant;

use crate::local_state::UiFlags;

/// How long a banner stays on screen.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    BaseUrl,
    Username,
    Password,
}

#[derive(Debug)]
pub struct LoginState {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub message: Option<String>,
}

impl LoginState {
    pub fn new(base_url: &str, username: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: String::new(),
            focus: if username.is_empty() {
                LoginField::Username
            } else {
                LoginField::Password
            },
            message: None,
        }
    }

    pub fn advance_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::BaseUrl => LoginField::Username,
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::BaseUrl,
        };
    }

    pub fn active_field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::BaseUrl => &mut self.base_url,
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub message: String,
    pub level: BannerLevel,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Start,
    End,
    Kind,
    PageSize,
}

impl FilterField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Início",
            Self::End => "Fim",
            Self::Kind => "Tipo",
            Self::PageSize => "Por página",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Kind,
            Self::Kind => Self::PageSize,
            Self::PageSize => Self::Start,
        }
    }
}

/// Text fields of the filter editor, applied on submit.
#[derive(Debug, Clone)]
pub struct FilterForm {
    pub start: String,
    pub end: String,
    pub kind: String,
    pub page_size: String,
    pub focus: FilterField,
    pub error: Option<String>,
}

impl FilterForm {
    pub fn from_filters(filters: &FilterState) -> Self {
        Self {
            start: filters.start.clone(),
            end: filters.end.clone(),
            kind: filters.kind.clone(),
            page_size: filters.page_size.to_string(),
            focus: FilterField::Start,
            error: None,
        }
    }

    pub fn advance_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn field(&self, field: FilterField) -> &str {
        match field {
            FilterField::Start => &self.start,
            FilterField::End => &self.end,
            FilterField::Kind => &self.kind,
            FilterField::PageSize => &self.page_size,
        }
    }

    pub fn active_field_mut(&mut self) -> &mut String {
        match self.focus {
            FilterField::Start => &mut self.start,
            FilterField::End => &mut self.end,
            FilterField::Kind => &mut self.kind,
            FilterField::PageSize => &mut self.page_size,
        }
    }

    /// Validates the form into a copy of `filters`, back on page 1.
    pub fn apply_to(&self, filters: &FilterState) -> Result<FilterState, String> {
        let mut next = filters.clone();
        next.set_range(&self.start, &self.end)
            .map_err(|err| err.to_string())?;
        next.set_kind(&self.kind);
        let page_size = match self.page_size.trim() {
            "" => 0,
            raw => raw
                .parse::<u32>()
                .map_err(|_| format!("Tamanho de página inválido: {raw}"))?,
        };
        next.set_page_size(page_size);
        Ok(next)
    }
}

#[derive(Debug)]
pub enum Mode {
    Browse,
    EditFilters(FilterForm),
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub mode: Mode,
    pub login: LoginState,
    pub base_url: String,
    pub ledger_id: Option<String>,
    pub ledgers: Vec<WalletView>,
    pub healthy: Option<bool>,
    pub session: Session,
    pub filters: FilterState,
    pub statement: Statement,
    pub csv_style: CsvStyle,
    pub ui_flags: UiFlags,
    pub banner: Option<Banner>,
    /// A network action is pending; fetch keys are ignored meanwhile.
    pub loading: bool,
    pub timezone: Tz,
}

impl AppState {
    /// Wallet entry of the selected ledger, once the wallet list loaded.
    pub fn selected_wallet(&self) -> Option<&WalletView> {
        let ledger_id = self.ledger_id.as_deref()?;
        self.ledgers
            .iter()
            .find(|wallet| wallet.id.to_string() == ledger_id)
    }

    pub fn show_banner(&mut self, level: BannerLevel, message: impl Into<String>) {
        self.banner = Some(Banner {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    pub fn expire_banner(&mut self, now: Instant) {
        if self
            .banner
            .as_ref()
            .is_some_and(|banner| now.duration_since(banner.shown_at) >= BANNER_TTL)
        {
            self.banner = None;
        }
    }

    /// Empty table and totals, pagination back to 1 of 1.
    pub fn clear_statement(&mut self) {
        self.statement = Statement::empty();
        self.filters.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_form_validates_and_resets_page() {
        let filters = FilterState {
            page: 5,
            ..FilterState::default()
        };
        let mut form = FilterForm::from_filters(&filters);
        form.start = "2025-08-01".to_string();
        form.kind = "credito".to_string();
        form.page_size = "25".to_string();

        let next = form.apply_to(&filters).unwrap();
        assert_eq!(next.page, 1);
        assert_eq!(next.kind, "CREDITO");
        assert_eq!(next.page_size, 25);

        form.page_size = "dez".to_string();
        assert!(form.apply_to(&filters).is_err());

        form.page_size.clear();
        form.end = "ontem".to_string();
        assert_eq!(
            form.apply_to(&filters).unwrap_err(),
            "Invalid date: ontem"
        );
    }

    #[test]
    fn focus_cycles_through_fields() {
        let mut form = FilterForm::from_filters(&FilterState::default());
        for expected in [
            FilterField::End,
            FilterField::Kind,
            FilterField::PageSize,
            FilterField::Start,
        ] {
            form.advance_focus();
            assert_eq!(form.focus, expected);
        }
    }

    #[test]
    fn login_focus_starts_on_password_with_known_user() {
        let mut login = LoginState::new("http://api.local", "ana");
        assert_eq!(login.focus, LoginField::Password);
        login.advance_focus();
        assert_eq!(login.focus, LoginField::BaseUrl);
        assert_eq!(LoginState::new("", "").focus, LoginField::Username);
    }
}
