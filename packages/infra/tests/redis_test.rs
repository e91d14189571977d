//! Redis 接続の統合テスト
//!
//! 到達できないアドレスに対する失敗経路のみを扱うため、
//! Redis サーバーの起動は不要。
//!
//! 実行方法:
//! ```bash
//! cargo test -p haul-infra --test redis_test
//! ```

use haul_infra::{Cache, InfraError};

#[tokio::test]
async fn test_到達できないアドレスではハンドルを返さずエラーになる() {
    // 127.0.0.1:1 は通常リッスンされていないため接続拒否になる
    let result = Cache::connect("127.0.0.1:1", "", 0).await;

    assert!(matches!(result, Err(InfraError::Redis(_))));
}

#[tokio::test]
async fn test_名前解決できないホストではエラーになる() {
    let result = Cache::connect("bad:1", "", 0).await;

    assert!(matches!(result, Err(InfraError::Redis(_))));
}

#[tokio::test]
async fn test_不正なアドレス形式ではエラーになる() {
    let result = Cache::connect("cache.internal:notaport", "", 0).await;

    assert!(result.is_err());
}
