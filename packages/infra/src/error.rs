//! # インフラ層エラー定義
//!
//! データベースや Redis との通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: `sqlx::Error`, `redis::RedisError` を `#[from]` でラップ
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示

use thiserror::Error;

/// インフラ層で発生するエラー
#[derive(Debug, Error)]
pub enum InfraError {
    /// データベースエラー
    ///
    /// 接続 URL の解析失敗、接続エラー、認証エラーなど。
    #[error("データベースエラー: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis エラー
    ///
    /// Redis への接続失敗、コマンド実行エラーなど。
    #[error("Redis エラー: {0}")]
    Redis(#[from] redis::RedisError),

    /// PING に対して PONG 以外の応答が返った
    #[error("Redis の疎通確認で予期しない応答を受信しました: {0:?}")]
    UnexpectedPong(String),
}
