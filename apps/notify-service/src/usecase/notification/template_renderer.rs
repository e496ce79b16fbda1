//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **件名の生成はここだけ**: イベント API・管理画面の手動送信・疎通確認メールが同じ件名になる
//! - **HTML は自動エスケープ**: `.html` テンプレートに差し込む値は tera がエスケープする
//! - **副作用なし**: 同じイベントからは常に同じメールが生成される

use bcimail_domain::notification::{
    CounselingAction,
    EmailMessage,
    NotificationError,
    NotificationEvent,
    Recipient,
};
use tera::{Context, Tera};

const BOOKING_CONFIRMATION_PAGE: &str = "booking_confirmation.html";

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`NotificationEvent` から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "appointment.html",
                    include_str!("../../../templates/notifications/appointment.html"),
                ),
                (
                    "appointment.txt",
                    include_str!("../../../templates/notifications/appointment.txt"),
                ),
                (
                    "registration.html",
                    include_str!("../../../templates/notifications/registration.html"),
                ),
                (
                    "registration.txt",
                    include_str!("../../../templates/notifications/registration.txt"),
                ),
                (
                    "test_start.html",
                    include_str!("../../../templates/notifications/test_start.html"),
                ),
                (
                    "test_start.txt",
                    include_str!("../../../templates/notifications/test_start.txt"),
                ),
                (
                    "test_completion.html",
                    include_str!("../../../templates/notifications/test_completion.html"),
                ),
                (
                    "test_completion.txt",
                    include_str!("../../../templates/notifications/test_completion.txt"),
                ),
                (
                    "dmit_scans.html",
                    include_str!("../../../templates/notifications/dmit_scans.html"),
                ),
                (
                    "dmit_scans.txt",
                    include_str!("../../../templates/notifications/dmit_scans.txt"),
                ),
                (
                    "counseling_schedule.html",
                    include_str!("../../../templates/notifications/counseling_schedule.html"),
                ),
                (
                    "counseling_reschedule.html",
                    include_str!("../../../templates/notifications/counseling_reschedule.html"),
                ),
                (
                    "counseling_cancel.html",
                    include_str!("../../../templates/notifications/counseling_cancel.html"),
                ),
                (
                    "counseling.txt",
                    include_str!("../../../templates/notifications/counseling.txt"),
                ),
                (
                    BOOKING_CONFIRMATION_PAGE,
                    include_str!("../../../templates/pages/booking_confirmation.html"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 通知イベントからメールメッセージを生成する
    pub fn render(&self, event: &NotificationEvent) -> Result<EmailMessage, NotificationError> {
        let params = build_template_params(event);

        let html_body = self.render_template(params.html_template, &params.context)?;
        let text_body = self.render_template(params.text_template, &params.context)?;

        Ok(EmailMessage {
            to: event.recipient().email.as_str().to_string(),
            subject: params.subject,
            html_body,
            text_body,
        })
    }

    /// `/book` の送信完了ページを生成する
    pub fn render_booking_confirmation(
        &self,
        recipient: &Recipient,
    ) -> Result<String, NotificationError> {
        let mut context = Context::new();
        context.insert("name", recipient.name.as_str());
        context.insert("email", recipient.email.as_str());
        self.render_template(BOOKING_CONFIRMATION_PAGE, &context)
    }

    fn render_template(&self, name: &str, context: &Context) -> Result<String, NotificationError> {
        self.engine
            .render(name, context)
            .map_err(|e| NotificationError::TemplateFailed(format!("{name}: {e}")))
    }
}

struct TemplateParams {
    html_template: &'static str,
    text_template: &'static str,
    subject:       String,
    context:       Context,
}

/// テンプレート名、件名、コンテキストを構築する
fn build_template_params(event: &NotificationEvent) -> TemplateParams {
    let mut context = Context::new();
    context.insert("name", event.recipient().name.as_str());

    let (html_template, text_template, subject) = match event {
        NotificationEvent::Appointment { .. } => (
            "appointment.html",
            "appointment.txt",
            "Appointment Confirmed".to_string(),
        ),
        NotificationEvent::Registration {
            user_code,
            test_type,
            ..
        } => {
            context.insert("user_code", user_code);
            context.insert("test_type", test_type);
            (
                "registration.html",
                "registration.txt",
                format!("Welcome to {test_type} Test - Registration Confirmed"),
            )
        }
        NotificationEvent::TestStart {
            test_type,
            start_url,
            resume_url,
            ..
        } => {
            context.insert("test_type", test_type);
            context.insert("start_url", start_url);
            context.insert("resume_url", resume_url);
            (
                "test_start.html",
                "test_start.txt",
                format!("Your {test_type} Test is Ready to Begin"),
            )
        }
        NotificationEvent::TestCompletion {
            test_type,
            report_url,
            ..
        } => {
            context.insert("test_type", test_type);
            context.insert("report_url", report_url);
            (
                "test_completion.html",
                "test_completion.txt",
                format!("Your {test_type} Test Results are Ready"),
            )
        }
        NotificationEvent::DmitScans { .. } => (
            "dmit_scans.html",
            "dmit_scans.txt",
            "DMIT Scans Successfully Collected".to_string(),
        ),
        NotificationEvent::Counseling {
            action, session, ..
        } => {
            let (html_template, heading, date_label, time_label) = match action {
                CounselingAction::Schedule => (
                    "counseling_schedule.html",
                    "Counseling Session Scheduled",
                    "Date",
                    "Time",
                ),
                CounselingAction::Reschedule => (
                    "counseling_reschedule.html",
                    "Counseling Session Rescheduled",
                    "New Date",
                    "New Time",
                ),
                CounselingAction::Cancel => (
                    "counseling_cancel.html",
                    "Counseling Session Cancelled",
                    "Date",
                    "Time",
                ),
            };
            context.insert("heading", heading);
            context.insert("date_label", date_label);
            context.insert("time_label", time_label);
            context.insert("date", &session.date);
            context.insert("time", &session.time);
            context.insert("counselor", &session.counselor);
            context.insert("meeting_link", &session.meeting_link);
            (
                html_template,
                "counseling.txt",
                format!("{} Counseling Session", action.label()),
            )
        }
    };

    TemplateParams {
        html_template,
        text_template,
        subject,
        context,
    }
}
