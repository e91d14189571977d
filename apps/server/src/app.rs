//! # アプリケーション構築・起動
//!
//! 設定の読み込みから HTTP リスナーの起動までの一連の流れを担当する。
//!
//! ```text
//! 1. 設定ファイル読み込み（--app-config）
//! 2. 環境選択（--env）
//! 3. サブシステム初期化（認証 → ロガー → DB → Redis）
//! 4. ロガーをグローバルに設定し、選択した設定を記録
//! 5. 0.0.0.0:{server_port} でリッスン
//! ```
//!
//! いずれかの段階で失敗した場合、リスナーを開かずにエラーを返す。

use std::{net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    bootstrap::{Bootstrapper, Resources},
    cli::Cli,
    config::{AppConfig, ConfigDocument},
    handler::{health_check, welcome, whoami},
};

/// ハンドラから参照する共有状態
#[derive(Debug, Clone)]
pub struct AppState {
    pub config:    Arc<AppConfig>,
    pub resources: Arc<Resources>,
}

/// ルーターを構築する
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/client", get(whoami))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 設定を読み込み、初期化を済ませてから HTTP サーバーを起動する
///
/// 正常時はサーバーが停止するまで戻らない。
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigDocument::load(&cli.app_config)?.select(&cli.env)?;

    let mut bootstrapper = Bootstrapper::new(config);
    let resources = bootstrapper.init().await?;
    if let Err(e) = resources.logger().install_global() {
        tracing::warn!(error = %e, "グローバルロガーは設定済みのため置き換えません");
    }

    let config = Arc::new(bootstrapper.into_config());
    tracing::info!(env = %config.env, config = %config, "設定を読み込みました");

    let port = config.listen_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening to {port}.......");

    let state = AppState { config, resources };
    axum::serve(listener, router(state)).await?;

    Ok(())
}
