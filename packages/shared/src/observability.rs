//! # Observability 基盤
//!
//! ファイルに構造化ログ（JSON）を出力するロガーを構築する。
//!
//! ## 設計方針
//!
//! - **グローバル状態を持たない**: 構築結果は [`tracing::Dispatch`] を保持する
//!   [`FileLogger`] として返し、グローバル登録は呼び出し元が明示的に行う
//! - **呼び出し位置の記録**: すべてのイベントにファイル名と行番号を付与する
//! - **レベル名の互換性**: `panic` / `fatal` / `warning` などの名前も受け付ける
//!
//! ## 出力例
//!
//! ```json
//! {"timestamp":"...","level":"INFO","message":"listening to 8080.......","target":"haul_server","filename":"apps/server/src/main.rs","line_number":42}
//! ```
//!
//! ## 使用例
//!
//! ```rust,no_run
//! use haul_shared::FileLogger;
//!
//! let logger = FileLogger::open("svc.log", "info")?;
//! tracing::dispatcher::with_default(logger.dispatch(), || {
//!     tracing::info!("起動しました");
//! });
//! # Ok::<(), haul_shared::LoggerError>(())
//! ```

use std::{
    fmt,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;
use tracing::{Dispatch, dispatcher::SetGlobalDefaultError};
use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

/// ログレベル名が未指定の場合のデフォルト
pub const DEFAULT_LOG_LEVEL: &str = "debug";

/// ロガー構築時のエラー
#[derive(Debug, Error)]
pub enum LoggerError {
    /// 認識できないログレベル名
    #[error("不正なログレベルです: {0:?}")]
    InvalidLevel(String),

    /// ログファイルを開けない
    #[error("ログファイルを開けません: {}", path.display())]
    Io {
        /// 開こうとしたパス
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

/// ログレベル
///
/// `Panic` と `Fatal` は出力フィルタ上は `ERROR` と同じ扱いになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Panic,
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 文字列からログレベルをパースする
    ///
    /// 大文字小文字は区別しない。`warning` は `warn` の別名として扱う。
    pub fn parse(s: &str) -> Result<Self, LoggerError> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(Self::Panic),
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }

    /// tracing の出力フィルタに変換する
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Panic | Self::Fatal | Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warn => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ファイル出力ロガー
///
/// 追記モードで開いたファイルに JSON 形式でイベントを書き出す
/// [`Dispatch`] を保持する。`Clone` しても同じファイルハンドルを共有する。
#[derive(Debug, Clone)]
pub struct FileLogger {
    dispatch: Dispatch,
    path:     PathBuf,
    level:    LogLevel,
}

impl FileLogger {
    /// ロガーを構築する
    ///
    /// レベル名の検証はファイルを開く前に行うため、
    /// レベル名が不正な場合はファイルが作成されない。
    ///
    /// # エラー
    ///
    /// - [`LoggerError::InvalidLevel`]: レベル名が不正
    /// - [`LoggerError::Io`]: ファイルを開けない
    pub fn open(path: impl Into<PathBuf>, level_name: &str) -> Result<Self, LoggerError> {
        let path = path.into();
        let level = LogLevel::parse(level_name)?;
        let file = open_append(&path).map_err(|source| LoggerError::Io {
            path: path.clone(),
            source,
        })?;

        let layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .with_filter(level.as_level_filter());
        let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

        Ok(Self {
            dispatch,
            path,
            level,
        })
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// プロセス全体のデフォルトとして登録する
    ///
    /// プロセスにつき一度だけ成功する。
    pub fn install_global(&self) -> Result<(), SetGlobalDefaultError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        options.mode(0o644);
    }
    options.open(path)
}
