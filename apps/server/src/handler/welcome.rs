//! # ルートハンドラ

/// `GET /` の応答本文
pub const WELCOME_MESSAGE: &str = "Welcome!\n";

/// 起動確認用のエンドポイント
pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}
