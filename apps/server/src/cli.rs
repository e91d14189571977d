//! # コマンドライン引数
//!
//! | 引数 | 環境変数 | デフォルト | 説明 |
//! |------|----------|------------|------|
//! | `--env` | `APP_ENV` | `dev` | 使用する環境名 |
//! | `--app-config` | `APP_CONFIG` | `app.yaml` | 設定ファイルのパス |
//!
//! 引数が環境変数より優先される。

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_CONFIG_PATH, DEFAULT_ENV};

/// 設定ファイルの環境を選択してサーバーを起動する
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "haul-server", version, about)]
pub struct Cli {
    /// 使用する環境名（設定ファイルのトップレベルキー）
    #[arg(long, env = "APP_ENV", default_value = DEFAULT_ENV)]
    pub env: String,

    /// 設定ファイルのパス
    #[arg(
        long = "app-config",
        alias = "app_config",
        env = "APP_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub app_config: PathBuf,
}
