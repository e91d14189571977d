//! # 認証用シークレット鍵
//!
//! 設定ファイルに base64 で記述された鍵文字列から、トークン署名・検証用の
//! バイト列を導出する。
//!
//! ## 設計判断
//!
//! - 空文字列は「認証を使用しない」という正当な設定であり、エラーにしない
//! - 導出したバイト列は [`SecretKey`] に閉じ込め、読み取り専用で公開する
//! - `Debug` 出力では鍵の中身を表示しない

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

/// シークレット鍵のデコードエラー
///
/// 不正な入力文字列をそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("jwt の secret_key をデコードできません: {encoded}")]
pub struct SecretDecodeError {
    /// デコードに失敗した文字列
    pub encoded: String,
}

/// デコード済みのシークレット鍵
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// base64 文字列からシークレット鍵を導出する
    ///
    /// # 戻り値
    ///
    /// - `Ok(None)`: 入力が空（認証無効）
    /// - `Ok(Some(key))`: デコード成功
    /// - `Err(SecretDecodeError)`: 標準 base64 として不正
    ///
    /// # 例
    ///
    /// ```rust
    /// use haul_domain::SecretKey;
    ///
    /// assert!(SecretKey::derive("").unwrap().is_none());
    ///
    /// let key = SecretKey::derive("c2VjcmV0").unwrap().unwrap();
    /// assert_eq!(key.as_bytes(), b"secret");
    ///
    /// assert!(SecretKey::derive("not base64!").is_err());
    /// ```
    pub fn derive(encoded: &str) -> Result<Option<Self>, SecretDecodeError> {
        if encoded.is_empty() {
            return Ok(None);
        }
        STANDARD
            .decode(encoded)
            .map(|bytes| Some(Self(bytes)))
            .map_err(|_| SecretDecodeError {
                encoded: encoded.to_string(),
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {} bytes])", self.0.len())
    }
}
