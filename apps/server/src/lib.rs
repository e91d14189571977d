//! # Haul サーバーライブラリ
//!
//! 設定の選択、サブシステムの初期化、HTTP ルーターを公開する。
//! 結合テストから起動処理を直接呼び出せるようにライブラリとして分離している。

pub mod app;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
