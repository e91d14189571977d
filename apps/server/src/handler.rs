//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供

pub mod client;
pub mod health;
pub mod welcome;

pub use client::{ClientChannel, ClientResponse, whoami};
pub use health::health_check;
pub use welcome::welcome;
