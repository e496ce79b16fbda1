//! # ペイロード検証
//!
//! JSON ペイロードから [`NotificationEvent`] を生成する。
//!
//! フィールドが「欠落」とみなされるのは、キーが存在しない・`null`・空文字列
//! （空白のみを含む）のいずれかの場合。数値は文字列として受け付ける
//! （受検コードが数値で送られてくるクライアントがあるため）。
//!
//! 欠落があった場合は、その種別で必須のフィールドを全て列挙したメッセージを返す。

use std::str::FromStr;

use serde_json::{Map, Value};

use super::{CounselingAction, EmailType, NotificationEvent, Recipient, SessionDetails};
use crate::{
    DomainError,
    value_objects::{DisplayName, Email},
};

/// ペイロードのフィールド名
pub mod field {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const USERNAME: &str = "username";
    pub const EMAIL_ID: &str = "emailid";
    pub const USER_CODE: &str = "usercode";
    pub const TEST_TYPE: &str = "testType";
    pub const START_URL: &str = "startUrl";
    pub const RESUME_URL: &str = "resumeUrl";
    pub const REPORT_URL: &str = "reportUrl";
    pub const ACTION: &str = "action";
    pub const SESSION_DETAILS: &str = "sessionDetails";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const COUNSELOR: &str = "counselor";
    pub const MEETING_LINK: &str = "meetingLink";
}

use field::*;

impl NotificationEvent {
    /// イベント種別と JSON ペイロードから検証済みイベントを生成する
    ///
    /// # エラー
    ///
    /// 必須フィールドの欠落、メールアドレスの形式不正、未知のカウンセリング操作は
    /// [`DomainError::Validation`] を返す。
    pub fn from_payload(email_type: EmailType, payload: &Value) -> Result<Self, DomainError> {
        let fields = Fields::of(payload)?;

        match email_type {
            EmailType::Appointment => {
                fields.require(&[NAME, EMAIL])?;
                Ok(Self::Appointment {
                    recipient: fields.recipient(NAME, EMAIL)?,
                })
            }
            EmailType::Registration => {
                fields.require(&[USERNAME, EMAIL_ID, USER_CODE, TEST_TYPE])?;
                Ok(Self::Registration {
                    recipient: fields.recipient(USERNAME, EMAIL_ID)?,
                    user_code: fields.required_text(USER_CODE)?,
                    test_type: fields.required_text(TEST_TYPE)?,
                })
            }
            EmailType::TestStart => {
                fields.require(&[USERNAME, EMAIL_ID, START_URL, RESUME_URL, TEST_TYPE])?;
                Ok(Self::TestStart {
                    recipient:  fields.recipient(USERNAME, EMAIL_ID)?,
                    test_type:  fields.required_text(TEST_TYPE)?,
                    start_url:  fields.required_text(START_URL)?,
                    resume_url: fields.required_text(RESUME_URL)?,
                })
            }
            EmailType::TestCompletion => {
                fields.require(&[USERNAME, EMAIL_ID, REPORT_URL, TEST_TYPE])?;
                Ok(Self::TestCompletion {
                    recipient:  fields.recipient(USERNAME, EMAIL_ID)?,
                    test_type:  fields.required_text(TEST_TYPE)?,
                    report_url: fields.required_text(REPORT_URL)?,
                })
            }
            EmailType::DmitScans => {
                fields.require(&[USERNAME, EMAIL_ID])?;
                Ok(Self::DmitScans {
                    recipient: fields.recipient(USERNAME, EMAIL_ID)?,
                })
            }
            EmailType::Counseling => counseling_from_fields(&fields),
        }
    }
}

fn counseling_from_fields(fields: &Fields<'_>) -> Result<NotificationEvent, DomainError> {
    fields.require(&[USERNAME, EMAIL_ID, ACTION, SESSION_DETAILS])?;

    let raw_action = fields.required_text(ACTION)?;
    let action = CounselingAction::from_str(&raw_action).map_err(|_| {
        DomainError::Validation(format!(
            "Invalid counseling action: {raw_action}. Must be one of: schedule, reschedule, cancel"
        ))
    })?;

    let details = fields.nested(SESSION_DETAILS)?;
    let required: &[&str] = if action.requires_meeting_link() {
        &[DATE, TIME, COUNSELOR, MEETING_LINK]
    } else {
        &[DATE, TIME, COUNSELOR]
    };
    if !required.iter().all(|key| details.is_present(key)) {
        return Err(DomainError::Validation(format!(
            "Missing required session details: {}",
            required.join(", ")
        )));
    }

    let meeting_link = if action.requires_meeting_link() {
        Some(details.required_text(MEETING_LINK)?)
    } else {
        None
    };

    Ok(NotificationEvent::Counseling {
        recipient: fields.recipient(USERNAME, EMAIL_ID)?,
        action,
        session: SessionDetails {
            date: details.required_text(DATE)?,
            time: details.required_text(TIME)?,
            counselor: details.required_text(COUNSELOR)?,
            meeting_link,
        },
    })
}

/// JSON オブジェクトのフィールドアクセサ
struct Fields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn of(payload: &'a Value) -> Result<Self, DomainError> {
        payload
            .as_object()
            .map(|object| Self { object })
            .ok_or_else(|| {
                DomainError::Validation("Request body must be a JSON object".to_string())
            })
    }

    fn nested(&self, key: &str) -> Result<Fields<'a>, DomainError> {
        let object = self
            .object
            .get(key)
            .and_then(Value::as_object)
            .ok_or_else(|| DomainError::Validation(format!("{key} must be an object")))?;
        Ok(Fields { object })
    }

    fn is_present(&self, key: &str) -> bool {
        match self.object.get(key) {
            Some(Value::Object(_)) => true,
            other => text_value(other).is_some(),
        }
    }

    fn require(&self, keys: &[&str]) -> Result<(), DomainError> {
        if keys.iter().all(|key| self.is_present(key)) {
            Ok(())
        } else {
            Err(missing(keys))
        }
    }

    fn required_text(&self, key: &str) -> Result<String, DomainError> {
        text_value(self.object.get(key)).ok_or_else(|| missing(&[key]))
    }

    fn recipient(&self, name_key: &str, email_key: &str) -> Result<Recipient, DomainError> {
        Ok(Recipient {
            name:  DisplayName::new(self.required_text(name_key)?)?,
            email: Email::new(self.required_text(email_key)?)?,
        })
    }
}

fn text_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing(keys: &[&str]) -> DomainError {
    DomainError::Validation(format!("Missing required fields: {}", keys.join(", ")))
}
