//! # API レスポンスエンベロープ
//!
//! notify-service が返す 2 種類のレスポンス形状を提供する。
//!
//! - [`ApiResponse`]: 運用向け参照 API（`/api/metrics`）の `{ "data": T }`
//! - [`ActionResponse`]: 送信・登録などの操作系の `{ "success": bool, "message": String }`
//!
//! 操作系の形状は既存のフロントエンド（予約フォーム、管理画面）が前提としているため維持する。

use serde::{Deserialize, Serialize};

/// 参照系 API の統一レスポンス型
///
/// ```
/// use bcimail_shared::ApiResponse;
///
/// let response = ApiResponse::new(vec!["registration", "counseling"]);
/// assert_eq!(response.data.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// 操作系 API のレスポンス型
///
/// エラー時も同じ形状で `success: false` を返す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    /// 成功レスポンスを作成する
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// 失敗レスポンスを作成する
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
