//! # 値オブジェクト
//!
//! 顧客ディレクトリと通知イベントで共有する値オブジェクト。

use serde::{Deserialize, Serialize};

use crate::DomainError;

define_validated_string! {
    /// 表示名（顧客名・受信者名）
    ///
    /// 前後の空白を除去した上で空でないこと、255 文字以内であること。
    pub struct DisplayName {
        label: "Display name",
        max_length: 255,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 顧客の自然キー。比較は入力された文字列そのままで行う
/// （大文字小文字の正規化はしない）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白を除去した上で空文字列ではない
    /// - `local@domain` の形式（両側が空でない）
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("Email is required".to_string()));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(format!(
                "Invalid email address: {value}"
            )));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(format!(
                "Invalid email address: {value}"
            )));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "Email must be at most 255 characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
