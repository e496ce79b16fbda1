//! # Notify Service 設定
//!
//! 環境変数から Notify Service の設定を読み込む。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|------------|------|
//! | `HOST` | No | `0.0.0.0` | バインドアドレス |
//! | `PORT` | No | `3000` | ポート番号 |
//! | `APP_ENV`（なければ `NODE_ENV`） | No | `development` | 実行環境。DB ファイルの配置先だけが変わる |
//! | `DATABASE_URL` | No | 実行環境から決定 | SQLite 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `SENDGRID_API_KEY` があれば `sendgrid`、なければ `noop` | 送信バックエンド |
//! | `SENDGRID_API_KEY` | backend=sendgrid のとき | - | SendGrid API キー |
//! | `SENDGRID_BASE_URL` | No | `https://api.sendgrid.com` | SendGrid API のベース URL |
//! | `FROM_EMAIL` | No | `noreply@bci.example.com` | 送信元メールアドレス |
//! | `SMTP_HOST` / `SMTP_PORT` | No | `localhost` / `1025` | backend=smtp の送信先 |
//! | `TEST_EMAIL_RECIPIENT` | No | `test@example.com` | `/api/test-emails` の宛先 |
//!
//! 空文字列の環境変数は未設定として扱う。

use std::{env, path::PathBuf};

use bcimail_infra::notification::SendGridNotificationSender;
use thiserror::Error;

/// 本番環境の SQLite ファイル（コンテナ内で書き込み可能な場所）
const PRODUCTION_DATABASE_URL: &str = "sqlite:///tmp/bci_email.db";
/// 開発環境の SQLite ファイル（作業ディレクトリからの相対パス）
const DEVELOPMENT_DATABASE_URL: &str = "sqlite://data/bci_email.db";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} は有効なポート番号である必要があります: {value}")]
    InvalidPort { name: &'static str, value: String },

    #[error("NOTIFICATION_BACKEND が不正です: {0}（sendgrid / smtp / ses / noop のいずれか）")]
    UnknownBackend(String),

    #[error("NOTIFICATION_BACKEND=sendgrid には SENDGRID_API_KEY が必要です")]
    MissingSendGridApiKey,
}

/// 実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// `production` 以外は全て開発環境とみなす
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// 実行環境ごとの既定の DB 接続 URL
    pub fn default_database_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_DATABASE_URL,
            Self::Development => DEVELOPMENT_DATABASE_URL,
        }
    }
}

/// 送信バックエンド
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
    SendGrid,
    Smtp,
    Ses,
    Noop,
}

/// Notify Service サーバーの設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// バインドアドレス
    pub host:                 String,
    /// ポート番号
    pub port:                 u16,
    /// 実行環境
    pub environment:          AppEnvironment,
    /// SQLite 接続 URL
    pub database_url:         String,
    /// `/api/test-emails` の宛先
    pub test_email_recipient: String,
    /// 通知設定
    pub notification:         NotificationConfig,
}

/// 通知機能の設定
#[derive(Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド
    pub backend:           NotificationBackend,
    /// 送信元メールアドレス
    pub from_address:      String,
    /// SendGrid API キー（backend=sendgrid の場合に使用）
    pub sendgrid_api_key:  Option<String>,
    /// SendGrid API のベース URL
    pub sendgrid_base_url: String,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:         String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:         u16,
}

// API キーをログに出さない
impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("backend", &self.backend)
            .field("from_address", &self.from_address)
            .field(
                "sendgrid_api_key",
                &self.sendgrid_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sendgrid_base_url", &self.sendgrid_base_url)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

impl ServiceConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を読み込む
    ///
    /// テストではプロセスの環境変数を書き換えずに設定を組み立てるために使う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment =
            AppEnvironment::parse(get("APP_ENV").or_else(|| get("NODE_ENV")).as_deref());

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_port("PORT", get("PORT"), 3000)?,
            environment,
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| environment.default_database_url().to_string()),
            test_email_recipient: get("TEST_EMAIL_RECIPIENT")
                .unwrap_or_else(|| "test@example.com".to_string()),
            notification: NotificationConfig::from_lookup(&get)?,
        })
    }

    /// DB ファイルのパス（インメモリ DB の場合は `None`）
    ///
    /// 起動時に親ディレクトリを作成するために使う。
    pub fn database_file(&self) -> Option<PathBuf> {
        sqlite_file_path(&self.database_url)
    }
}

impl NotificationConfig {
    fn from_lookup<F>(get: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sendgrid_api_key = get("SENDGRID_API_KEY");

        let backend = match get("NOTIFICATION_BACKEND") {
            Some(value) => value
                .parse::<NotificationBackend>()
                .map_err(|_| ConfigError::UnknownBackend(value))?,
            None if sendgrid_api_key.is_some() => NotificationBackend::SendGrid,
            None => NotificationBackend::Noop,
        };

        if backend == NotificationBackend::SendGrid && sendgrid_api_key.is_none() {
            return Err(ConfigError::MissingSendGridApiKey);
        }

        Ok(Self {
            backend,
            from_address: get("FROM_EMAIL")
                .unwrap_or_else(|| "noreply@bci.example.com".to_string()),
            sendgrid_api_key,
            sendgrid_base_url: get("SENDGRID_BASE_URL")
                .unwrap_or_else(|| SendGridNotificationSender::DEFAULT_BASE_URL.to_string()),
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
            smtp_port: parse_port("SMTP_PORT", get("SMTP_PORT"), 1025)?,
        })
    }
}

fn parse_port(name: &'static str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort { name, value }),
    }
}

/// `sqlite://path` / `sqlite:path` 形式の URL からファイルパスを取り出す
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
