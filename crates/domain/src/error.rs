//! # ドメイン層エラー定義
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 必須フィールド欠落、形式不正、未知のイベント種別 |
//!
//! メッセージは API レスポンスの `message` としてそのまま返すため、
//! 既存クライアントとの互換を保つ英語で記述する。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 保持するメッセージは呼び出し元にそのまま返される。
    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    /// バリデーションメッセージを取得する
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
        }
    }
}
