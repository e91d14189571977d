//! # Haul インフラ層
//!
//! データベース・Redis など外部システムへの接続を管理する。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続プール（プール設定・テーブル命名規則）
//! - [`redis`] - Redis クライアント（起動時の疎通確認を含む）
//! - [`error`] - インフラ層エラー

pub mod db;
pub mod error;
pub mod redis;

pub use db::Datastore;
pub use error::InfraError;
pub use redis::Cache;
