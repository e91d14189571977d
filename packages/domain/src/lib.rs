//! # Haul ドメイン層
//!
//! インフラ・HTTP に依存しないドメイン型を定義する。
//!
//! ## モジュール構成
//!
//! - [`secret`] - 認証用シークレット鍵（base64 エンコード文字列からの導出）
//! - [`request_client`] - リクエスト送信元クライアントの分類
//! - [`uid`] - 分散 ID 採番レコード
//! - [`entity`] - テーブルに永続化されるエンティティの名前定義

pub mod entity;
pub mod request_client;
pub mod secret;
pub mod uid;

pub use entity::TableEntity;
pub use request_client::{REQUEST_CLIENT_HEADER, RequestClient, RequestClientError};
pub use secret::{SecretDecodeError, SecretKey};
pub use uid::Uid;
