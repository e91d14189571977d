//! # 分散 ID 採番レコード
//!
//! グループ単位で払い出し済みの ID を管理するレコード。
//! このクレートは採番アルゴリズムを持たず、データの形状のみを定義する。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::TableEntity;

/// 分散 ID 採番レコード
///
/// `group` ごとに 1 行を持ち、`current_id` が払い出し済みの最大値を表す。
/// `version` は楽観的ロック用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uid {
    pub id:          i64,
    pub group:       String,
    pub version:     i32,
    pub current_id:  i64,
    pub update_time: Option<DateTime<Utc>>,
}

impl TableEntity for Uid {
    const ENTITY_NAME: &'static str = "Uid";
}

impl fmt::Display for Uid {
    /// コンパクトな JSON として出力する
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
