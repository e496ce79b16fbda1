//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! bcimail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bcimail_domain::{
    customer::{Customer, CustomerId},
    email_log::{EmailLogEntry, EmailLogId, EmailTypeStats, NewEmailLog},
    notification::{EmailMessage, EmailType, NotificationError},
    value_objects::{DisplayName, Email},
};
use chrono::{DateTime, Utc};

use crate::{
    error::InfraError,
    notification::NotificationSender,
    repository::{CreateOrFetch, CustomerRepository, EmailLogRepository},
};

// ===== MockCustomerRepository =====

#[derive(Clone)]
pub struct MockCustomerRepository {
    customers:   Arc<Mutex<Vec<Customer>>>,
    next_id:     Arc<Mutex<i64>>,
    unavailable: bool,
}

impl Default for MockCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCustomerRepository {
    pub fn new() -> Self {
        Self {
            customers:   Arc::new(Mutex::new(Vec::new())),
            next_id:     Arc::new(Mutex::new(CustomerId::FIRST)),
            unavailable: false,
        }
    }

    /// 全操作がエラーを返すリポジトリ（ストア障害の再現用）
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.customers.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), InfraError> {
        if self.unavailable {
            Err(InfraError::unexpected("顧客ストアに接続できません"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CustomerRepository for MockCustomerRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, InfraError> {
        self.check_available()?;
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email() == email)
            .cloned())
    }

    async fn create(
        &self,
        display_name: &DisplayName,
        email: &Email,
        created_at: DateTime<Utc>,
    ) -> Result<CreateOrFetch, InfraError> {
        self.check_available()?;
        let mut customers = self.customers.lock().unwrap();
        if let Some(existing) = customers.iter().find(|c| c.email() == email) {
            return Ok(CreateOrFetch::Existing(existing.clone()));
        }

        let mut next_id = self.next_id.lock().unwrap();
        let customer = Customer::from_db(
            CustomerId::from_i64(*next_id),
            display_name.clone(),
            email.clone(),
            created_at,
        );
        *next_id += 1;
        customers.push(customer.clone());
        Ok(CreateOrFetch::Created(customer))
    }

    async fn list_all(&self) -> Result<Vec<Customer>, InfraError> {
        self.check_available()?;
        let mut customers = self.customers.lock().unwrap().clone();
        customers.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(customers)
    }

    async fn count(&self) -> Result<i64, InfraError> {
        self.check_available()?;
        Ok(self.customers.lock().unwrap().len() as i64)
    }
}

// ===== MockEmailLogRepository =====

#[derive(Clone, Default)]
pub struct MockEmailLogRepository {
    logs:    Arc<Mutex<Vec<NewEmailLog>>>,
    failing: bool,
}

impl MockEmailLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `append` が常に失敗するリポジトリ
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn logs(&self) -> Vec<NewEmailLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailLogRepository for MockEmailLogRepository {
    async fn append(&self, log: &NewEmailLog) -> Result<EmailLogId, InfraError> {
        if self.failing {
            return Err(InfraError::unexpected("配信ログストアに書き込めません"));
        }
        let mut logs = self.logs.lock().unwrap();
        logs.push(log.clone());
        Ok(EmailLogId::from_i64(logs.len() as i64))
    }

    async fn list_all(&self) -> Result<Vec<EmailLogEntry>, InfraError> {
        let logs = self.logs.lock().unwrap();
        let mut entries: Vec<EmailLogEntry> = logs
            .iter()
            .enumerate()
            .map(|(i, log)| EmailLogEntry {
                id:              EmailLogId::from_i64(i as i64 + 1),
                customer_id:     log.customer_id,
                email_type:      log.email_type,
                recipient_email: log.recipient_email.clone(),
                recipient_name:  log.recipient_name.clone(),
                subject:         log.subject.clone(),
                status:          log.outcome.status(),
                error_message:   log.outcome.error_message().map(str::to_string),
                sent_at:         log.sent_at,
                customer_name:   None,
                customer_email:  None,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.sent_at
                .cmp(&a.sent_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(entries)
    }

    async fn aggregate_by_type(&self) -> Result<Vec<EmailTypeStats>, InfraError> {
        let logs = self.logs.lock().unwrap();
        let mut stats: Vec<EmailTypeStats> = Vec::new();
        for log in logs.iter() {
            let index = match stats.iter().position(|s| s.email_type == log.email_type) {
                Some(index) => index,
                None => {
                    stats.push(EmailTypeStats {
                        email_type: log.email_type,
                        total:      0,
                        successful: 0,
                        failed:     0,
                    });
                    stats.len() - 1
                }
            };
            let entry = &mut stats[index];
            entry.total += 1;
            match log.outcome.error_message() {
                None => entry.successful += 1,
                Some(_) => entry.failed += 1,
            }
        }
        stats.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.email_type.to_string().cmp(&b.email_type.to_string()))
        });
        Ok(stats)
    }
}

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `failing()` で作成すると全送信が [`NotificationError::SendFailed`] になる。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failing: bool,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::SendFailed(
                "プロバイダが送信を拒否しました".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// 種別ごとの集計結果を種別から引く（テストの検証用）
pub fn stats_for(stats: &[EmailTypeStats], email_type: EmailType) -> Option<&EmailTypeStats> {
    stats.iter().find(|s| s.email_type == email_type)
}
