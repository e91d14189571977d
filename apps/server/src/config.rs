//! # アプリケーション設定
//!
//! 環境名をキーとする YAML 設定ファイルを読み込み、実行環境の設定を選択する。
//!
//! ## 設計方針
//!
//! - 設定ファイルには全環境（dev / test / prod）の設定を記述する
//! - 起動時に選択した環境の設定だけを取り出し、残りは破棄する
//!   （他環境のシークレットをメモリに残さない）
//! - サブシステムの設定（`jwt` / `log` / `datasource` / `redis`）は省略可能で、
//!   省略は「そのサブシステムを使用しない」ことを意味する
//!
//! ## 設定ファイル例
//!
//! ```yaml
//! dev:
//!   app_name: haul
//!   server_port: 8080
//!   jwt:
//!     secret_key: c2VjcmV0
//!     ttl: 2h
//!   log:
//!     file: /var/log/haul.log
//!     level: info
//!   datasource:
//!     url: localhost:5432/haul
//!     username: haul
//!     password: secret
//!   redis:
//!     address: localhost:6379
//!     password: ""
//!     db: 0
//! ```
//!
//! ## 文字列表現
//!
//! 各設定は `Display` でコンパクトな JSON を出力する。パスワードと
//! シークレット鍵は `******` に置き換えるため、ログやエラーメッセージに
//! そのまま埋め込める。

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use haul_domain::{SecretDecodeError, SecretKey};
use haul_shared::observability::DEFAULT_LOG_LEVEL;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// デフォルトの実行環境名
pub const DEFAULT_ENV: &str = "dev";

/// デフォルトの設定ファイルパス
pub const DEFAULT_CONFIG_PATH: &str = "app.yaml";

/// `server_port` が未設定または不正な場合のポート番号
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// 秘匿値のマスク文字列
const REDACTED: &str = "******";

// =============================================================================
// ConfigDocument
// =============================================================================

/// 設定ファイル全体
///
/// 環境名から [`AppConfig`] へのマッピング。
/// [`select`](Self::select) で消費され、選択されなかった環境の設定は破棄される。
#[derive(Debug, Default)]
pub struct ConfigDocument {
    environments: HashMap<String, AppConfig>,
}

impl ConfigDocument {
    /// 設定ファイルを読み込む
    ///
    /// # エラー
    ///
    /// - [`ConfigError::Load`]: ファイルが存在しない、または読み込めない
    /// - [`ConfigError::Parse`]: YAML として不正
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// YAML 文字列から設定を構築する
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let environments = serde_yaml::from_str(yaml)?;
        Ok(Self { environments })
    }

    /// 定義されている環境名（昇順）
    pub fn environments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 実行環境の設定を取り出す
    ///
    /// ドキュメントを消費し、他環境の設定はこの時点で破棄する。
    /// 取り出した設定の `env` には選択した環境名を設定する。
    ///
    /// # エラー
    ///
    /// - [`ConfigError::Selection`]: 指定した環境が定義されていない
    pub fn select(mut self, env: &str) -> Result<AppConfig, ConfigError> {
        let available = self
            .environments()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let selected = self.environments.remove(env);
        self.environments.clear();

        let mut config = selected.ok_or_else(|| ConfigError::Selection {
            env: env.to_string(),
            available,
        })?;
        config.env = env.to_string();
        Ok(config)
    }
}

// =============================================================================
// AppConfig
// =============================================================================

/// 実行環境ごとのアプリケーション設定
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 実行環境名（設定ファイル上では省略し、選択時に設定される）
    #[serde(default)]
    pub env:         String,
    /// アプリケーション名（デフォルトのログファイル名に使用）
    #[serde(default)]
    pub app_name:    String,
    /// HTTP サーバーのポート番号
    #[serde(default)]
    pub server_port: Option<i64>,
    /// 認証設定
    pub jwt:         Option<JwtConfig>,
    /// ログ設定
    pub log:         Option<LogConfig>,
    /// データベース設定
    pub datasource:  Option<DatastoreConfig>,
    /// Redis 設定
    pub redis:       Option<CacheConfig>,
}

impl AppConfig {
    /// HTTP サーバーがリッスンするポート番号
    ///
    /// `server_port` が 1〜65535 の範囲にない場合は [`DEFAULT_SERVER_PORT`]。
    pub fn listen_port(&self) -> u16 {
        self.server_port
            .and_then(|port| u16::try_from(port).ok())
            .filter(|port| *port > 0)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}

// =============================================================================
// JwtConfig
// =============================================================================

/// 認証設定
///
/// `secret_key` は base64 エンコードされた鍵。空の場合は認証を使用しない。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret_key: Sensitive,
    /// トークンの有効期間
    #[serde(default, with = "duration")]
    pub ttl:        Duration,
    #[serde(skip)]
    secret:         Option<SecretKey>,
}

impl JwtConfig {
    pub fn new(secret_key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret_key: Sensitive::new(secret_key),
            ttl,
            secret: None,
        }
    }

    /// デコード済みのシークレット鍵
    ///
    /// 起動処理で導出されるまで、または `secret_key` が空の場合は `None`。
    pub fn secret(&self) -> Option<&SecretKey> {
        self.secret.as_ref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// `secret_key` からシークレット鍵を導出する
    ///
    /// 導出済みの場合は何もしない。
    pub(crate) fn derive_secret(&mut self) -> Result<(), SecretDecodeError> {
        if self.secret.is_some() {
            return Ok(());
        }
        self.secret = SecretKey::derive(self.secret_key.expose())?;
        Ok(())
    }
}

// =============================================================================
// LogConfig
// =============================================================================

/// ログ設定
///
/// 空文字列は未指定として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// 出力先ファイルパス（デフォルト: `<app_name>.log`）
    pub file:  Option<String>,
    /// ログレベル名（デフォルト: `debug`）
    pub level: Option<String>,
}

/// 解決済みのログ出力先とレベル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub file:  PathBuf,
    pub level: String,
}

impl LogTarget {
    /// ログ設定にデフォルト値を補って出力先を決定する
    pub fn resolve(app_name: &str, log: Option<&LogConfig>) -> Self {
        let non_empty = |value: Option<&String>| value.filter(|v| !v.is_empty()).cloned();
        let file = non_empty(log.and_then(|l| l.file.as_ref()))
            .unwrap_or_else(|| format!("{app_name}.log"));
        let level = non_empty(log.and_then(|l| l.level.as_ref()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Self {
            file: PathBuf::from(file),
            level,
        }
    }
}

// =============================================================================
// DatastoreConfig / CacheConfig
// =============================================================================

/// データベース設定
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// 接続先（`host:port/database[?params]`）
    #[serde(default)]
    pub url:      String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Sensitive,
}

/// Redis 設定
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 接続先（`host:port`）
    #[serde(default)]
    pub address:  String,
    #[serde(default)]
    pub password: Sensitive,
    /// 論理データベース番号
    #[serde(default)]
    pub db:       i64,
}

macro_rules! impl_json_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                    f.write_str(&json)
                }
            }
        )+
    };
}

impl_json_display!(AppConfig, JwtConfig, LogConfig, DatastoreConfig, CacheConfig);

// =============================================================================
// Sensitive
// =============================================================================

/// 秘匿値（パスワード、鍵）
///
/// `Debug` / `Serialize` では値を出力せず、空でなければ `******` を出力する。
/// 読み込み時は通常の文字列として扱う。
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);

impl Sensitive {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 平文の値を取得する
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn masked(&self) -> &'static str {
        if self.0.is_empty() { "" } else { REDACTED }
    }
}

impl fmt::Debug for Sensitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.masked())
    }
}

impl Serialize for Sensitive {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.masked())
    }
}

// =============================================================================
// 期間の表現
// =============================================================================

/// 期間のシリアライズ / デシリアライズ
///
/// 整数はナノ秒として扱う。文字列は `<数値><単位>` の連続で、数値は小数を含んでよい
/// （単位: `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`、例: `"1h30m"`, `"1.5h"`）。
mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Nanos(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", value.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ns", value.as_nanos()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match RawDuration::deserialize(deserializer)? {
            RawDuration::Nanos(nanos) => Ok(Duration::from_nanos(nanos)),
            RawDuration::Text(text) => parse(&text).map_err(D::Error::custom),
        }
    }

    /// 小数部として保持する最大桁数（これ以降の桁は切り捨てる）
    const MAX_FRACTION_DIGITS: u32 = 18;

    /// 単位のナノ秒換算
    fn unit_nanos(unit: &str) -> Option<u128> {
        match unit {
            "ns" => Some(1),
            "us" | "µs" | "μs" => Some(1_000),
            "ms" => Some(1_000_000),
            "s" => Some(1_000_000_000),
            "m" => Some(60 * 1_000_000_000),
            "h" => Some(60 * 60 * 1_000_000_000),
            _ => None,
        }
    }

    /// 先頭の ASCII 数字列とその残りに分割する
    fn split_digits(text: &str) -> (&str, &str) {
        let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
        text.split_at(end)
    }

    /// 期間文字列をパースする
    ///
    /// 符号は `+` のみ受け付ける（負の期間は表現できない）。
    pub fn parse(text: &str) -> Result<Duration, String> {
        let invalid = || format!("不正な期間です: {text:?}");
        let body = text.strip_prefix('+').unwrap_or(text);
        if body == "0" {
            return Ok(Duration::ZERO);
        }
        if body.is_empty() {
            return Err(invalid());
        }

        let mut total: u128 = 0;
        let mut rest = body;
        while !rest.is_empty() {
            let (int_part, after_int) = split_digits(rest);
            let (frac_part, after_num) = match after_int.strip_prefix('.') {
                Some(after_dot) => split_digits(after_dot),
                None => ("", after_int),
            };
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid());
            }

            let unit_len = after_num
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(after_num.len());
            let unit = unit_nanos(&after_num[..unit_len]).ok_or_else(invalid)?;
            rest = &after_num[unit_len..];

            let whole: u128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| invalid())?
            };
            let mut nanos = whole.checked_mul(unit).ok_or_else(invalid)?;

            let frac_digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS as usize)];
            if !frac_digits.is_empty() {
                let numerator: u128 = frac_digits.parse().map_err(|_| invalid())?;
                let scale = 10u128.pow(frac_digits.len() as u32);
                nanos = nanos
                    .checked_add(numerator * unit / scale)
                    .ok_or_else(invalid)?;
            }

            total = total.checked_add(nanos).ok_or_else(invalid)?;
        }

        let secs = u64::try_from(total / 1_000_000_000).map_err(|_| invalid())?;
        let subsec = u32::try_from(total % 1_000_000_000).map_err(|_| invalid())?;
        Ok(Duration::new(secs, subsec))
    }
}
