//! # Haul 共有ユーティリティ
//!
//! このクレートは、Haul プロジェクト全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, server）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える
//!
//! ## モジュール構成
//!
//! - [`observability`] - ファイル出力ロガーの構築（ログレベル解決を含む）
//! - [`error_response`] - HTTP エラーレスポンスの共通形式
//! - [`health`] - ヘルスチェックレスポンス

pub mod error_response;
pub mod health;
pub mod observability;

pub use error_response::ErrorResponse;
pub use health::HealthResponse;
pub use observability::{FileLogger, LogLevel, LoggerError};
