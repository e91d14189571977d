//! # リクエスト送信元クライアントハンドラ
//!
//! `request_client` ヘッダから送信元クライアントを判定する。
//!
//! ## エンドポイント
//!
//! ```text
//! GET /client
//! request_client: merchant_ios
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! { "client": "merchant_ios", "code": 22, "group": "merchant" }
//! ```
//!
//! ヘッダがない、または未対応の名前の場合は 400 と [`haul_shared::ErrorResponse`] を返す。

use axum::{Json, extract::FromRequestParts, http::request::Parts};
use haul_domain::{REQUEST_CLIENT_HEADER, RequestClient, RequestClientError};
use serde::Serialize;

use crate::error::ApiError;

/// `request_client` ヘッダから判定したクライアント
///
/// ハンドラの引数に置くと、判定できないリクエストは
/// ハンドラに到達する前に 400 で拒否される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientChannel(pub RequestClient);

impl<S: Send + Sync> FromRequestParts<S> for ClientChannel {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(REQUEST_CLIENT_HEADER)
            .map(|value| {
                value.to_str().map_err(|_| {
                    RequestClientError::Unsupported(
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
            })
            .transpose()?;
        let client = RequestClient::from_header(value)?;
        Ok(Self(client))
    }
}

/// クライアント判定結果
#[derive(Debug, Clone, Serialize)]
pub struct ClientResponse {
    pub client: RequestClient,
    pub code:   i8,
    pub group:  &'static str,
}

impl From<RequestClient> for ClientResponse {
    fn from(client: RequestClient) -> Self {
        Self {
            client,
            code: client.code(),
            group: client.group(),
        }
    }
}

/// 送信元クライアントを返すエンドポイント
pub async fn whoami(ClientChannel(client): ClientChannel) -> Json<ClientResponse> {
    Json(ClientResponse::from(client))
}
