use std::path::{Path, PathBuf};

use api_types::{
    auth::{LoginRequest, RefreshRequest, TokenResponse},
    ledger::CsvStyle,
    wallet::WalletView,
};
use engine::{
    CsvScope, FilterState, QueryParams, Session, Statement, TransportMeta, build_csv_params,
    build_params,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

mod pipeline;

pub use pipeline::normalize_base_url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("missing endpoint")]
    MissingEndpoint,
    #[error("http {status}: {message}")]
    Server { status: u16, message: String },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("empty token in response")]
    EmptyToken,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Text shown in the dashboard banner or on the login screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Credenciais inválidas ou expiradas.".to_string(),
            Self::Forbidden => "Acesso negado para este ledger.".to_string(),
            Self::NotFound => "Recurso não encontrado.".to_string(),
            Self::MissingEndpoint => "Endpoint ausente no servidor.".to_string(),
            Self::Server { status, message } => format!("Erro HTTP {status}: {message}"),
            Self::Transport(err) => format!("Servidor inacessível: {err}"),
            Self::EmptyToken => "Resposta sem token.".to_string(),
            Self::InvalidUrl(message) => format!("BASE_URL inválida: {message}"),
            Self::Io(err) => format!("Falha ao gravar arquivo: {err}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error", alias = "message")]
    detail: Value,
}

/// HTTP wrapper around the ledger API.
///
/// Every request goes through the same pipeline: the target is resolved
/// against the base URL, legacy hosts and stray commas are fixed, then the
/// bearer token is attached when one is set. Token refresh is the one
/// request sent without it.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url);
        Url::parse(&base_url).map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|token| !token.trim().is_empty());
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        self.send(self.request(Method::GET, "api/v1/health")?)
            .await?;
        Ok(())
    }

    pub async fn wallets(&self) -> Result<Vec<WalletView>, ClientError> {
        let res = self
            .send(self.request(Method::GET, "api/v1/wallets")?)
            .await?;
        Ok(res.json::<Vec<WalletView>>().await?)
    }

    /// Password login. The refresh token is optional in the response.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let res = self
            .send(self.request(Method::POST, "api/v1/login")?.json(&payload))
            .await?;
        let tokens = tokens_from_body(&res.text().await?);
        let access_token = tokens
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::EmptyToken)?;
        tracing::info!("login succeeded for {username}");
        Ok(Session::from_tokens(
            access_token,
            tokens.refresh_token.unwrap_or_default(),
        ))
    }

    /// Exchanges a refresh token for a new access token. The request carries
    /// no bearer, the access token it replaces may already be expired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, ClientError> {
        let payload = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let url = self.resolve("api/v1/refresh")?;
        let res = self.send(self.http.post(url).json(&payload)).await?;
        extract_token(res).await
    }

    /// Development token. Older backends expose it as `/login_dev`.
    pub async fn login_dev(&self) -> Result<String, ClientError> {
        match self
            .send(self.request(Method::POST, "api/v1/login/dev")?)
            .await
        {
            Ok(res) => extract_token(res).await,
            Err(ClientError::NotFound | ClientError::MissingEndpoint) => {
                tracing::debug!("login/dev missing, trying login_dev");
                let res = self
                    .send(self.request(Method::POST, "api/v1/login_dev")?)
                    .await?;
                extract_token(res).await
            }
            Err(err) => Err(err),
        }
    }

    /// Loads one statement page and runs it through the engine.
    pub async fn ledger_page(
        &self,
        ledger_id: &str,
        filters: &FilterState,
    ) -> Result<Statement, ClientError> {
        let params = build_params(filters);
        let res = self
            .send(self.ledger_request(ledger_id, None)?.query(&params))
            .await?;

        let headers: Vec<(String, String)> = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let meta =
            TransportMeta::from_headers(headers.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let text = res.text().await?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|err| {
            tracing::warn!("ledger body is not JSON: {err}");
            Value::Null
        });

        let statement = Statement::assemble(&body, &meta, filters);
        tracing::debug!(
            "ledger {ledger_id} page {}/{}: {} rows",
            statement.page.page,
            statement.page.total_pages,
            statement.rows.len()
        );
        Ok(statement)
    }

    /// Server-side CSV rendering of the filtered statement.
    pub async fn ledger_csv(
        &self,
        ledger_id: &str,
        filters: &FilterState,
        scope: CsvScope,
        style: CsvStyle,
    ) -> Result<Vec<u8>, ClientError> {
        let params: QueryParams = build_csv_params(filters, scope, style);
        let res = self
            .send(self.ledger_request(ledger_id, Some("csv"))?.query(&params))
            .await?;
        Ok(res.bytes().await?.to_vec())
    }

    /// Downloads the CSV into `dest` through a `.part` file, so a failed
    /// download never leaves a truncated file behind.
    pub async fn download_csv(
        &self,
        ledger_id: &str,
        filters: &FilterState,
        scope: CsvScope,
        style: CsvStyle,
        dest: &Path,
    ) -> Result<usize, ClientError> {
        let part = part_path(dest);
        let result = async {
            let bytes = self.ledger_csv(ledger_id, filters, scope, style).await?;
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&part, &bytes).await?;
            tokio::fs::rename(&part, dest).await?;
            Ok::<_, ClientError>(bytes.len())
        }
        .await;

        if let Err(err) = &result {
            tracing::warn!("csv download to {} failed: {err}", dest.display());
            if let Err(rm_err) = tokio::fs::remove_file(&part).await
                && rm_err.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!("failed to remove {}: {rm_err}", part.display());
            }
        }
        result
    }

    fn ledger_request(
        &self,
        ledger_id: &str,
        suffix: Option<&str>,
    ) -> Result<RequestBuilder, ClientError> {
        let mut url = self.resolve("api/v1/ledger")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?;
            segments.push(ledger_id.trim());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(self.authorize(self.http.get(url)))
    }

    fn resolve(&self, target: &str) -> Result<Url, ClientError> {
        let url = pipeline::apply(target, &self.base_url);
        Url::parse(&url).map_err(|err| ClientError::InvalidUrl(format!("{url}: {err}")))
    }

    fn request(&self, method: Method, target: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.resolve(target)?;
        Ok(self.authorize(self.http.request(method, url)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let res = builder.send().await.map_err(|err| {
            tracing::warn!("request failed: {err}");
            ClientError::Transport(err)
        })?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = error_message(res).await;
        tracing::warn!("request answered {status}: {message}");
        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => ClientError::MissingEndpoint,
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}

async fn error_message(res: Response) -> String {
    let text = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(ErrorResponse {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) if !text.trim().is_empty() => text.trim().to_string(),
        Err(_) => "erro desconhecido".to_string(),
    }
}

async fn extract_token(res: Response) -> Result<String, ClientError> {
    tokens_from_body(&res.text().await?)
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(ClientError::EmptyToken)
}

/// Accepts `{access_token}`, `{token}`, a JSON string or plain text.
fn tokens_from_body(body: &str) -> TokenResponse {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(token)) => TokenResponse {
            access_token: Some(token.trim().to_string()),
            refresh_token: None,
        },
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        Ok(_) => TokenResponse::default(),
        Err(_) => TokenResponse {
            access_token: Some(body.trim().to_string()),
            refresh_token: None,
        },
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
