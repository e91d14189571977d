//! # PostgreSQL データベース接続管理
//!
//! データベース接続プールの作成と管理を行う。
//!
//! ## 設計方針
//!
//! - **接続プール**: 毎回接続を張り直すオーバーヘッドを避け、接続を再利用
//! - **固定ポリシー**: プール設定とテーブル命名規則は設定ファイルから変更できない
//!   定数として持つ（[`POOL_POLICY`], [`TABLE_NAMING`]）
//! - **プリペアドステートメント**: 接続ごとにステートメントをキャッシュし再利用する
//!
//! ## 接続記述子
//!
//! 設定ファイルの `username` / `password` / `url` から
//! `postgres://{username}:{password}@{url}` を組み立てる。
//!
//! ```yaml
//! datasource:
//!   url: localhost:5432/haul
//!   username: haul
//!   password: secret
//! ```
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use haul_infra::Datastore;
//! use haul_domain::Uid;
//!
//! let datastore = Datastore::connect("haul", "secret", "localhost:5432/haul").await?;
//! let table = datastore.table_name::<Uid>(); // "haul_uid"
//! let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
//!     .fetch_one(datastore.pool())
//!     .await?;
//! ```

use std::{str::FromStr, time::Duration};

use haul_domain::TableEntity;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::error::InfraError;

/// 接続プールのポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolPolicy {
    /// 接続の最大寿命
    pub max_lifetime:        Duration,
    /// 最大接続数
    pub max_open:            u32,
    /// アイドル状態で保持する最大接続数
    pub max_idle:            u32,
    /// プリペアドステートメントのキャッシュを有効にするか
    pub prepared_statements: bool,
}

/// 本アプリケーションの接続プールポリシー
pub const POOL_POLICY: PoolPolicy = PoolPolicy {
    max_lifetime:        Duration::from_secs(3 * 60),
    max_open:            10,
    max_idle:            10,
    prepared_statements: true,
};

/// プリペアドステートメント有効時の接続あたりキャッシュ数
pub const STATEMENT_CACHE_CAPACITY: usize = 100;

/// テーブル命名規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableNaming {
    /// テーブル名のプレフィックス
    pub prefix:   &'static str,
    /// 単数形のテーブル名を使用するか
    pub singular: bool,
}

/// 本アプリケーションのテーブル命名規則
///
/// `Uid` → `haul_uid`, `UserAccount` → `haul_user_account`
pub const TABLE_NAMING: TableNaming = TableNaming {
    prefix:   "haul_",
    singular: true,
};

impl TableNaming {
    /// エンティティ型からテーブル名を求める
    pub fn table_name<E: TableEntity>(&self) -> String {
        self.to_table_name(E::ENTITY_NAME)
    }

    /// エンティティ名（CamelCase）からテーブル名を求める
    pub fn to_table_name(&self, entity_name: &str) -> String {
        let snake = to_snake_case(entity_name);
        if self.singular {
            format!("{}{snake}", self.prefix)
        } else {
            format!("{}{snake}s", self.prefix)
        }
    }
}

/// CamelCase を snake_case に変換する
///
/// 連続する大文字は略語として 1 語に扱う（`HTTPServer` → `http_server`）。
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_uppercase() {
            out.push(c);
            continue;
        }
        let prev = i.checked_sub(1).map(|j| chars[j]);
        let next = chars.get(i + 1).copied();
        let boundary = prev.is_some_and(|p| {
            p.is_ascii_lowercase()
                || p.is_ascii_digit()
                || (p.is_ascii_uppercase() && next.is_some_and(|n| n.is_ascii_lowercase()))
        });
        if boundary {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// 接続記述子を組み立てる
///
/// `url` は `host:port/database[?params]` 形式の断片。
pub fn connection_url(username: &str, password: &str, url: &str) -> String {
    format!("postgres://{username}:{password}@{url}")
}

/// 接続オプションを作成する
///
/// ポリシーに応じてステートメントキャッシュを設定する。
pub fn connect_options(url: &str, policy: &PoolPolicy) -> Result<PgConnectOptions, InfraError> {
    let capacity = if policy.prepared_statements {
        STATEMENT_CACHE_CAPACITY
    } else {
        0
    };
    Ok(PgConnectOptions::from_str(url)?.statement_cache_capacity(capacity))
}

/// ポリシーを適用した `PgPoolOptions` を返す
///
/// sqlx のプールはアイドル接続数の上限を持たないため、`max_idle` は
/// アイドルタイムアウトの有無で表現する。`max_idle >= max_open` の場合は
/// アイドル接続を破棄しない。
pub fn pool_options(policy: &PoolPolicy) -> PgPoolOptions {
    let idle_timeout = (policy.max_idle < policy.max_open).then_some(policy.max_lifetime);
    PgPoolOptions::new()
        .max_connections(policy.max_open)
        .min_connections(0)
        .max_lifetime(policy.max_lifetime)
        .idle_timeout(idle_timeout)
}

/// データストアハンドル
///
/// 接続プールとテーブル命名規則をまとめたもの。`Clone` はプールを共有する。
#[derive(Debug, Clone)]
pub struct Datastore {
    pool:   PgPool,
    naming: TableNaming,
}

impl Datastore {
    /// データベースに接続する
    ///
    /// アプリケーション起動時に一度だけ呼び出し、作成したハンドルを
    /// アプリケーション全体で共有する。
    ///
    /// # エラー
    ///
    /// - 接続記述子の解析エラー
    /// - 接続エラー、認証エラー
    pub async fn connect(username: &str, password: &str, url: &str) -> Result<Self, InfraError> {
        let options = connect_options(&connection_url(username, password, url), &POOL_POLICY)?;
        let pool = pool_options(&POOL_POLICY).connect_with(options).await?;
        Ok(Self {
            pool,
            naming: TABLE_NAMING,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// エンティティ型に対応するテーブル名
    pub fn table_name<E: TableEntity>(&self) -> String {
        self.naming.table_name::<E>()
    }
}
