//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換はサーバー側の責務（shared に axum 依存を入れない）
//! - よく使うエラーは便利コンストラクタで提供し、メッセージのハードコードを排除

use std::fmt;

use serde::{Deserialize, Serialize};

/// エラーレスポンス
///
/// `code` は HTTP ステータスコードと同じ値、`msg` は人間可読なメッセージ。
///
/// ```json
/// {"code":403,"msg":"permission denied"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: i16,
    pub msg:  String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    pub fn new(code: i16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(400, msg)
    }

    /// 403 Forbidden
    pub fn forbidden() -> Self {
        Self::new(403, "permission denied")
    }

    /// 500 サービス利用不可
    ///
    /// 依存サービスの障害など、クライアント側で再試行すべき状況に使用する。
    pub fn unavailable() -> Self {
        Self::new(500, "service is unavailable for now, please try again later")
    }
}

impl fmt::Display for ErrorResponse {
    /// コンパクトな JSON として出力する
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
