//! # Haul サーバー
//!
//! 環境ごとの YAML 設定を読み込み、サブシステムを初期化してから
//! HTTP リクエストの受付を開始する。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（app.yaml の dev を使用）
//! cargo run -p haul-server
//!
//! # 本番環境
//! cargo run -p haul-server --release -- --env prod --app-config /etc/haul/app.yaml
//!
//! # 環境変数でも指定できる
//! APP_ENV=prod APP_CONFIG=/etc/haul/app.yaml cargo run -p haul-server --release
//! ```

use clap::Parser;
use haul_server::{app, cli::Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    app::run(cli).await
}
