//! # 顧客
//!
//! 通知の配信先となる顧客エンティティを定義する。
//!
//! ## 不変条件
//!
//! - メールアドレスが顧客の自然キーであり、同じメールアドレスの顧客は 1 件しか存在しない
//! - ID は永続化されたカウンタから 1000 以降の連番で払い出され、再利用されない
//! - 作成後は表示名・メールアドレス・作成日時のいずれも変更されない
//!   （同じメールアドレスで異なる表示名が渡されても既存の表示名を維持する）

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::value_objects::{DisplayName, Email};

/// 顧客 ID
///
/// `customer_id_counter` テーブルから払い出される整数の代理キー。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(transparent)]
#[display("{_0}")]
pub struct CustomerId(i64);

impl CustomerId {
    /// 最初に払い出される顧客 ID
    pub const FIRST: i64 = 1000;

    pub fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// 顧客エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id:           CustomerId,
    display_name: DisplayName,
    email:        Email,
    created_at:   DateTime<Utc>,
}

impl Customer {
    /// 永続化済みの値から顧客を復元する
    pub fn from_db(
        id: CustomerId,
        display_name: DisplayName,
        email: Email,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name,
            email,
            created_at,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
