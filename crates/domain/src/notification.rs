//! # 通知
//!
//! 外部の評価ワークフローで発生したイベントをメール通知に変換するためのドメインモデル。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`EmailType`] | イベント種別（6 種類の閉じた集合） |
//! | [`NotificationEvent`] | 検証済みの通知イベント。種別ごとに必須フィールドを持つ |
//! | [`CounselingAction`] | カウンセリング通知の操作（予約・変更・キャンセル） |
//! | [`EmailMessage`] | レンダリング済みのメール |
//! | [`DispatchResult`] | 送信結果（呼び出し元に返す `{success, message}`） |
//!
//! ## 設計方針
//!
//! - **閉じた enum**: 種別の追加はコンパイラが全 match の更新を要求する
//! - **検証と生成の一体化**: [`NotificationEvent::from_payload`] を通らないと
//!   イベントを作れないため、以降の処理は欠落フィールドを考慮しなくてよい
//! - **テンプレート分離**: 件名・本文の生成は notify-service の TemplateRenderer が担う

mod payload;

pub use payload::field;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::value_objects::{DisplayName, Email};

/// 送信失敗時に呼び出し元へ返すメッセージ
pub const SEND_FAILURE_MESSAGE: &str = "Failed to send email";

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// イベント種別
///
/// `email_logs.email_type` カラムと API パス（`/api/email/{kind}`）に使う値。
/// kebab-case でシリアライズされる。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoStaticStr,
    EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmailType {
    /// 予約受付
    Appointment,
    /// 受検登録完了
    Registration,
    /// 受検開始案内
    TestStart,
    /// 受検完了・結果通知
    TestCompletion,
    /// DMIT スキャン受領
    DmitScans,
    /// カウンセリング予約・変更・キャンセル
    Counseling,
}

impl EmailType {
    /// 送信成功時に呼び出し元へ返すメッセージ
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Appointment => "Appointment email sent successfully",
            Self::Registration => "Registration email sent successfully",
            Self::TestStart => "Test start email sent successfully",
            Self::TestCompletion => "Test completion email sent successfully",
            Self::DmitScans => "DMIT scans collected email sent successfully",
            Self::Counseling => "Counseling session email sent successfully",
        }
    }
}

/// カウンセリング通知の操作
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CounselingAction {
    Schedule,
    Reschedule,
    Cancel,
}

impl CounselingAction {
    /// 先頭を大文字にした表示ラベル（件名に使う）
    pub fn label(self) -> &'static str {
        match self {
            Self::Schedule => "Schedule",
            Self::Reschedule => "Reschedule",
            Self::Cancel => "Cancel",
        }
    }

    /// ミーティングリンクが必須かどうか
    ///
    /// キャンセル通知にはリンクを載せないため不要。
    pub fn requires_meeting_link(self) -> bool {
        !matches!(self, Self::Cancel)
    }
}

/// 受信者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name:  DisplayName,
    pub email: Email,
}

/// カウンセリングのセッション情報
///
/// `meeting_link` はキャンセル時に `None`、それ以外では必ず `Some`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDetails {
    pub date:         String,
    pub time:         String,
    pub counselor:    String,
    pub meeting_link: Option<String>,
}

/// 検証済みの通知イベント
///
/// 各バリアントがイベント種別 1 つに対応し、その種別の必須フィールドだけを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Appointment {
        recipient: Recipient,
    },
    Registration {
        recipient: Recipient,
        user_code: String,
        test_type: String,
    },
    TestStart {
        recipient:  Recipient,
        test_type:  String,
        start_url:  String,
        resume_url: String,
    },
    TestCompletion {
        recipient:  Recipient,
        test_type:  String,
        report_url: String,
    },
    DmitScans {
        recipient: Recipient,
    },
    Counseling {
        recipient: Recipient,
        action:    CounselingAction,
        session:   SessionDetails,
    },
}

impl NotificationEvent {
    pub fn email_type(&self) -> EmailType {
        match self {
            Self::Appointment { .. } => EmailType::Appointment,
            Self::Registration { .. } => EmailType::Registration,
            Self::TestStart { .. } => EmailType::TestStart,
            Self::TestCompletion { .. } => EmailType::TestCompletion,
            Self::DmitScans { .. } => EmailType::DmitScans,
            Self::Counseling { .. } => EmailType::Counseling,
        }
    }

    pub fn recipient(&self) -> &Recipient {
        match self {
            Self::Appointment { recipient }
            | Self::Registration { recipient, .. }
            | Self::TestStart { recipient, .. }
            | Self::TestCompletion { recipient, .. }
            | Self::DmitScans { recipient }
            | Self::Counseling { recipient, .. } => recipient,
        }
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 送信結果
///
/// プロバイダ呼び出しの成否を分類したもの。送信失敗は例外ではなく
/// `success: false` の値として扱い、配信ログにも記録する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
}

impl DispatchResult {
    /// 送信成功の結果
    pub fn sent(email_type: EmailType) -> Self {
        Self {
            success: true,
            message: email_type.success_message().to_string(),
        }
    }

    /// 送信失敗の結果
    pub fn failed() -> Self {
        Self {
            success: false,
            message: SEND_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case(EmailType::Appointment, "appointment")]
    #[case(EmailType::Registration, "registration")]
    #[case(EmailType::TestStart, "test-start")]
    #[case(EmailType::TestCompletion, "test-completion")]
    #[case(EmailType::DmitScans, "dmit-scans")]
    #[case(EmailType::Counseling, "counseling")]
    fn test_email_typeの文字列変換が正しい(#[case] email_type: EmailType, #[case] expected: &str) {
        assert_eq!(email_type.to_string(), expected);
        assert_eq!(EmailType::from_str(expected).unwrap(), email_type);
        assert_eq!(
            serde_json::to_value(email_type).unwrap(),
            serde_json::json!(expected)
        );
    }

    #[test]
    fn test_email_typeは6種類の閉じた集合である() {
        assert_eq!(EmailType::iter().count(), 6);
        assert!(EmailType::from_str("newsletter").is_err());
    }

    #[test]
    fn test_成功メッセージは種別ごとに異なる() {
        let messages: std::collections::HashSet<_> =
            EmailType::iter().map(EmailType::success_message).collect();
        assert_eq!(messages.len(), 6);
        assert_eq!(
            EmailType::Registration.success_message(),
            "Registration email sent successfully"
        );
    }

    #[rstest]
    #[case(CounselingAction::Schedule, "Schedule", true)]
    #[case(CounselingAction::Reschedule, "Reschedule", true)]
    #[case(CounselingAction::Cancel, "Cancel", false)]
    fn test_counseling_actionのラベルとリンク要否(
        #[case] action: CounselingAction,
        #[case] label: &str,
        #[case] requires_link: bool,
    ) {
        assert_eq!(action.label(), label);
        assert_eq!(action.requires_meeting_link(), requires_link);
    }

    #[test]
    fn test_dispatch_resultのコンストラクタ() {
        assert_eq!(
            DispatchResult::sent(EmailType::DmitScans),
            DispatchResult {
                success: true,
                message: "DMIT scans collected email sent successfully".to_string(),
            }
        );
        assert_eq!(
            DispatchResult::failed(),
            DispatchResult {
                success: false,
                message: "Failed to send email".to_string(),
            }
        );
    }
}
