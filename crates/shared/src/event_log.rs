//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` でログを調査しやすいよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。呼び出し側のクレートは `tracing` に依存していること。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: [`event::entity_type`] の定数
/// - `event.entity_id`: エンティティ ID（顧客 ID など）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
        pub const CUSTOMER: &str = "customer";
    }

    pub mod action {
        // 通知
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";

        // 顧客
        pub const CUSTOMER_CREATED: &str = "customer.created";
    }

    pub mod entity_type {
        pub const CUSTOMER: &str = "customer";
    }

    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    pub mod category {
        /// インフラストラクチャ（SQLite）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（メール送信プロバイダ）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const DISPATCH_LOG: &str = "dispatch_log";
        pub const EMAIL_PROVIDER: &str = "email_provider";
        pub const TEMPLATE: &str = "template";
        pub const INTERNAL: &str = "internal";
    }
}

#[cfg(test)]
mod tests {
    use super::event;

    #[test]
    fn test_log_business_eventはsubscriber未設定でも呼び出せる() {
        log_business_event!(
            event.category = event::category::CUSTOMER,
            event.action = event::action::CUSTOMER_CREATED,
            event.entity_type = event::entity_type::CUSTOMER,
            event.entity_id = 1000,
            event.result = event::result::SUCCESS,
            "顧客を作成"
        );
    }

    #[test]
    fn test_アクション名はカテゴリを接頭辞に持つ() {
        assert!(event::action::NOTIFICATION_SENT.starts_with(event::category::NOTIFICATION));
        assert!(event::action::NOTIFICATION_FAILED.starts_with(event::category::NOTIFICATION));
        assert!(event::action::CUSTOMER_CREATED.starts_with(event::category::CUSTOMER));
    }
}
