//! # リクエスト送信元クライアント
//!
//! すべての HTTP リクエストは `request_client` ヘッダで送信元クライアントを
//! 名乗る。これにより同一エンドポイントで複数のクライアントを扱える。
//!
//! ## コード体系
//!
//! | グループ | 範囲 | クライアント |
//! |----------|------|--------------|
//! | 管理者 | 11〜19 | `admin` |
//! | 加盟店 | 21〜29 | `merchant_web`, `merchant_ios`, `merchant_andriod` |
//! | 消費者 | 31〜39 | `consumer_web`, `consumer_ios`, `consumer_andriod` |
//!
//! `andriod` の綴りは既存クライアントとのワイヤ互換のため維持している。

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// `request_client` ヘッダ名
pub const REQUEST_CLIENT_HEADER: &str = "request_client";

/// クライアント分類エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestClientError {
    /// ヘッダが存在しない、または空
    #[error("there is no request_client in request header")]
    Missing,

    /// 未対応のクライアント名
    #[error("request client [{0}] is not supported")]
    Unsupported(String),
}

/// リクエスト送信元クライアント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(i8)]
pub enum RequestClient {
    Admin           = 11,
    MerchantWeb     = 21,
    MerchantIos     = 22,
    MerchantAndriod = 23,
    ConsumerWeb     = 31,
    ConsumerIos     = 32,
    ConsumerAndriod = 33,
}

impl RequestClient {
    /// ヘッダ値からクライアントを判定する
    ///
    /// 大文字小文字は区別しない。
    ///
    /// # 例
    ///
    /// ```rust
    /// use haul_domain::{RequestClient, RequestClientError};
    ///
    /// assert_eq!(
    ///     RequestClient::from_header(Some("Merchant_Web")),
    ///     Ok(RequestClient::MerchantWeb)
    /// );
    /// assert_eq!(
    ///     RequestClient::from_header(None),
    ///     Err(RequestClientError::Missing)
    /// );
    /// ```
    pub fn from_header(value: Option<&str>) -> Result<Self, RequestClientError> {
        match value {
            None => Err(RequestClientError::Missing),
            Some(v) if v.is_empty() => Err(RequestClientError::Missing),
            Some(v) => v.parse(),
        }
    }

    /// 数値コード
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn is_admin(self) -> bool {
        (11..20).contains(&self.code())
    }

    pub fn is_merchant(self) -> bool {
        (21..30).contains(&self.code())
    }

    pub fn is_consumer(self) -> bool {
        (31..40).contains(&self.code())
    }

    /// 所属グループ名（`admin` / `merchant` / `consumer`）
    pub fn group(self) -> &'static str {
        if self.is_admin() {
            "admin"
        } else if self.is_merchant() {
            "merchant"
        } else {
            "consumer"
        }
    }
}

impl FromStr for RequestClient {
    type Err = RequestClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let client = s.to_lowercase();
        match client.as_str() {
            "admin" => Ok(Self::Admin),
            "merchant_web" => Ok(Self::MerchantWeb),
            "merchant_ios" => Ok(Self::MerchantIos),
            "merchant_andriod" => Ok(Self::MerchantAndriod),
            "consumer_web" => Ok(Self::ConsumerWeb),
            "consumer_ios" => Ok(Self::ConsumerIos),
            "consumer_andriod" => Ok(Self::ConsumerAndriod),
            _ => Err(RequestClientError::Unsupported(client)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("admin", RequestClient::Admin, 11)]
    #[case("merchant_web", RequestClient::MerchantWeb, 21)]
    #[case("merchant_ios", RequestClient::MerchantIos, 22)]
    #[case("merchant_andriod", RequestClient::MerchantAndriod, 23)]
    #[case("consumer_web", RequestClient::ConsumerWeb, 31)]
    #[case("consumer_ios", RequestClient::ConsumerIos, 32)]
    #[case("consumer_andriod", RequestClient::ConsumerAndriod, 33)]
    fn test_from_header_対応クライアントを判定する(
        #[case] header: &str,
        #[case] expected: RequestClient,
        #[case] code: i8,
    ) {
        let sut = RequestClient::from_header(Some(header)).unwrap();

        assert_eq!(sut, expected);
        assert_eq!(sut.code(), code);
        assert_eq!(sut.to_string(), header);
    }

    #[test]
    fn test_from_header_大文字小文字を区別しない() {
        assert_eq!(
            RequestClient::from_header(Some("CONSUMER_IOS")),
            Ok(RequestClient::ConsumerIos)
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn test_from_header_ヘッダなしはmissingになる(#[case] header: Option<&str>) {
        assert_eq!(
            RequestClient::from_header(header),
            Err(RequestClientError::Missing)
        );
    }

    #[test]
    fn test_from_header_未対応クライアントはunsupportedになる() {
        let result = RequestClient::from_header(Some("Partner_Web"));

        assert_eq!(
            result,
            Err(RequestClientError::Unsupported("partner_web".to_string()))
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "request client [partner_web] is not supported"
        );
    }

    #[rstest]
    #[case(RequestClient::Admin, "admin")]
    #[case(RequestClient::MerchantWeb, "merchant")]
    #[case(RequestClient::MerchantAndriod, "merchant")]
    #[case(RequestClient::ConsumerWeb, "consumer")]
    #[case(RequestClient::ConsumerAndriod, "consumer")]
    fn test_groupでコード範囲に応じたグループを返す(
        #[case] client: RequestClient,
        #[case] group: &str,
    ) {
        assert_eq!(client.group(), group);
        assert_eq!(client.is_admin(), group == "admin");
        assert_eq!(client.is_merchant(), group == "merchant");
        assert_eq!(client.is_consumer(), group == "consumer");
    }
}
