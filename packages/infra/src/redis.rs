//! # Redis 接続管理
//!
//! Redis キャッシュサーバーへの接続管理を行う。
//!
//! ## 設計方針
//!
//! - **起動時の疎通確認**: 接続直後に `PING` を送り、応答がなければ起動を中止する
//! - **ConnectionManager**: 疎通確認後は自動再接続機能を持つ接続マネージャを共有する
//! - **非同期対応**: tokio ランタイムとの統合
//!
//! ## 接続 URL
//!
//! 設定ファイルの `address` / `password` / `db` から
//! `redis://[:password@]address/db` を組み立てる。パスワードはパーセントエンコードする。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use haul_infra::Cache;
//! use redis::AsyncCommands;
//!
//! let cache = Cache::connect("localhost:6379", "", 0).await?;
//! let mut conn = cache.connection();
//! let value: Option<String> = conn.get("aid:1054034957").await?;
//! ```

use std::fmt;

use redis::{Client, aio::ConnectionManager};

use crate::error::InfraError;

/// 接続 URL を組み立てる
pub fn redis_url(address: &str, password: &str, db: i64) -> String {
    if password.is_empty() {
        format!("redis://{address}/{db}")
    } else {
        format!(
            "redis://:{}@{address}/{db}",
            urlencoding::encode(password)
        )
    }
}

/// `PING` を送信し、`PONG` が返ることを確認する
///
/// 自動再接続を行わない単発の接続で確認するため、
/// 到達できない場合は即座にエラーを返す。
pub async fn ping(client: &Client) -> Result<(), InfraError> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    if pong != "PONG" {
        return Err(InfraError::UnexpectedPong(pong));
    }
    Ok(())
}

/// キャッシュハンドル
///
/// `Clone` は同じ接続マネージャを共有する。
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

impl Cache {
    /// Redis に接続し、疎通確認を行う
    ///
    /// アプリケーション起動時に一度だけ呼び出し、作成したハンドルを
    /// アプリケーション全体で共有する。疎通確認に失敗した場合はハンドルを返さない。
    ///
    /// # エラー
    ///
    /// - URL パースエラー: 不正なアドレス形式
    /// - 接続エラー: Redis サーバーに接続できない
    /// - 認証エラー: パスワードが不正
    pub async fn connect(address: &str, password: &str, db: i64) -> Result<Self, InfraError> {
        let client = Client::open(redis_url(address, password, db).as_str())?;
        ping(&client).await?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// 接続マネージャを取得する
    ///
    /// `ConnectionManager` は内部で接続を共有するため、呼び出しごとに複製してよい。
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}
