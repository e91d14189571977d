//! # サーバーエラー定義
//!
//! 起動処理（設定読み込み・サブシステム初期化）と HTTP ハンドラのエラーを定義する。
//!
//! ## エラーの分類
//!
//! | エラー | 発生箇所 | 扱い |
//! |--------|----------|------|
//! | [`ConfigError`] | 設定ファイルの読み込み・環境選択 | 起動中止 |
//! | [`InitError`] | サブシステム初期化 | 起動中止 |
//! | [`ApiError`] | HTTP ハンドラ | エラーレスポンスに変換 |
//!
//! 起動処理のエラーはリトライも警告への格下げも行わず、そのまま呼び出し元に返す。
//! サブシステム設定の省略はエラーではない。

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use haul_domain::{RequestClientError, SecretDecodeError};
use haul_infra::InfraError;
use haul_shared::{ErrorResponse, LoggerError};
use thiserror::Error;

/// 設定ファイルの読み込み・環境選択エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルが存在しない、または読み込めない
    #[error("設定ファイルを読み込めません: {}", path.display())]
    Load {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML として不正
    #[error("設定ファイルを解析できません: {}: {source}", path.display())]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// 指定した環境が定義されていない
    #[error("環境 [{env}] の設定が設定ファイルに存在しません（定義済み: {}）", available.join(", "))]
    Selection {
        env:       String,
        available: Vec<String>,
    },
}

/// サブシステム初期化エラー
///
/// 最初に失敗した初期化処理のエラーをそのまま保持する。
#[derive(Debug, Error)]
pub enum InitError {
    /// シークレット鍵のデコード失敗
    #[error(transparent)]
    Decode(#[from] SecretDecodeError),

    /// ロガーの構築失敗（ログレベル名が不正、ログファイルを開けない）
    #[error(transparent)]
    Logger(#[from] LoggerError),

    /// データベースに接続できない
    #[error("データベースに接続できません: datasource={config}")]
    Datastore {
        /// 秘匿値をマスクした設定
        config: String,
        #[source]
        source: InfraError,
    },

    /// Redis に接続できない、または疎通確認に失敗
    #[error("Redis に接続できません: redis config={config}")]
    Cache {
        /// 秘匿値をマスクした設定
        config: String,
        #[source]
        source: InfraError,
    },
}

impl InitError {
    /// 外部システムへの接続エラーか
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Datastore { .. } | Self::Cache { .. })
    }
}

/// HTTP ハンドラで発生するエラー
///
/// `IntoResponse` を実装しているため、axum が自動的に HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum ApiError {
    /// `request_client` ヘッダが不正（400 Bad Request）
    #[error(transparent)]
    RequestClient(#[from] RequestClientError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::RequestClient(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::bad_request(err.to_string()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_selectionエラーは定義済みの環境を列挙する() {
        let sut = ConfigError::Selection {
            env:       "prod".to_string(),
            available: vec!["dev".to_string(), "test".to_string()],
        };

        assert_eq!(
            sut.to_string(),
            "環境 [prod] の設定が設定ファイルに存在しません（定義済み: dev, test）"
        );
    }

    #[test]
    fn test_decodeエラーはメッセージをそのまま伝える() {
        let sut = InitError::from(SecretDecodeError {
            encoded: "!!".to_string(),
        });

        assert_eq!(sut.to_string(), "jwt の secret_key をデコードできません: !!");
        assert!(!sut.is_connection_error());
    }

    #[test]
    fn test_request_clientエラーは400になる() {
        let response = ApiError::from(RequestClientError::Missing).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
