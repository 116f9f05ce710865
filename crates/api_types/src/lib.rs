use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier as the backend sends it: sometimes a number, sometimes a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// A numeric field that may arrive as a JSON number or as a decimal string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefreshRequest {
        pub refresh_token: String,
    }

    /// Body returned by `/login`, `/refresh` and `/login/dev`.
    ///
    /// Older deployments answer with `token` instead of `access_token`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TokenResponse {
        #[serde(default, alias = "token")]
        pub access_token: Option<String>,
        #[serde(default)]
        pub refresh_token: Option<String>,
    }
}

pub mod wallet {
    use super::*;

    /// Wallet/ledger descriptor returned by `GET /api/v1/wallets`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct WalletView {
        #[serde(alias = "wallet_id", alias = "ledger_id")]
        pub id: Identifier,
        #[serde(default, alias = "owner")]
        pub user_id: Option<Identifier>,
        #[serde(default, alias = "balance")]
        pub saldo: Option<Numeric>,
    }
}

pub mod ledger {
    use super::*;

    pub const HEADER_TOTAL: &str = "X-Total";
    pub const HEADER_TOTAL_COUNT: &str = "X-Total-Count";
    pub const HEADER_TOTAL_CREDIT: &str = "X-Total-Credito";
    pub const HEADER_TOTAL_DEBIT: &str = "X-Total-Debito";
    pub const HEADER_TOTAL_BALANCE: &str = "X-Total-Saldo";
    pub const HEADER_TOTAL_BALANCE_PERIOD: &str = "X-Total-Saldo-Periodo";
    pub const HEADER_PAGE: &str = "X-Page";
    pub const HEADER_PAGE_SIZE: &str = "X-Page-Size";
    pub const HEADER_TOTAL_PAGES: &str = "X-Total-Pages";

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum SortDir {
        Asc,
        #[default]
        Desc,
    }

    impl SortDir {
        /// Returns the value expected by the `order_dir` query parameter.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Asc => "asc",
                Self::Desc => "desc",
            }
        }

        #[must_use]
        pub fn flipped(self) -> Self {
            match self {
                Self::Asc => Self::Desc,
                Self::Desc => Self::Asc,
            }
        }
    }

    /// Number formatting used by CSV exports.
    ///
    /// - `br`: `;` separator, decimal comma.
    /// - `us`: `,` separator, decimal dot.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CsvStyle {
        #[default]
        Br,
        Us,
    }

    impl CsvStyle {
        pub fn separator(self) -> char {
            match self {
                Self::Br => ';',
                Self::Us => ',',
            }
        }

        /// Returns the value expected by the `csv_decimal` query parameter.
        pub fn decimal_param(self) -> &'static str {
            match self {
                Self::Br => "comma",
                Self::Us => "dot",
            }
        }

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Br => "br",
                Self::Us => "us",
            }
        }

        #[must_use]
        pub fn toggled(self) -> Self {
            match self {
                Self::Br => Self::Us,
                Self::Us => Self::Br,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_accepts_numeric_and_aliased_fields() {
        let wallets: Vec<wallet::WalletView> = serde_json::from_str(
            r#"[{"id": 1, "user_id": 7, "saldo": 10.5},
                {"ledger_id": "abc", "owner": "bob", "balance": "3,20"}]"#,
        )
        .unwrap();

        assert_eq!(wallets[0].id, Identifier::Int(1));
        assert_eq!(wallets[0].saldo, Some(Numeric::Number(10.5)));
        assert_eq!(wallets[1].id.to_string(), "abc");
        assert_eq!(wallets[1].user_id, Some(Identifier::Text("bob".to_string())));
        assert_eq!(wallets[1].saldo, Some(Numeric::Text("3,20".to_string())));
    }

    #[test]
    fn token_response_accepts_legacy_token_field() {
        let body: auth::TokenResponse = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(body.access_token.as_deref(), Some("abc"));
        assert!(body.refresh_token.is_none());
    }

    #[test]
    fn csv_style_params() {
        assert_eq!(ledger::CsvStyle::Br.separator(), ';');
        assert_eq!(ledger::CsvStyle::Br.decimal_param(), "comma");
        assert_eq!(ledger::CsvStyle::Us.separator(), ',');
        assert_eq!(ledger::CsvStyle::Us.decimal_param(), "dot");
    }
}
