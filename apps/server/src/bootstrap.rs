//! # 起動処理
//!
//! 選択済みの [`AppConfig`] から、プロセス全体で共有するリソース
//! （ロガー・データストア・キャッシュ）を構築する。
//!
//! ## 初期化順序
//!
//! ```text
//! 1. 認証    secret_key → SecretKey（jwt 未設定・空なら何もしない）
//! 2. ロガー  log.file / log.level → FileLogger
//! 3. DB      datasource → Datastore（未設定なら None）
//! 4. Redis   redis → Cache（未設定なら None、疎通確認必須）
//! ```
//!
//! - 最初に失敗した処理で中止し、そのエラーをそのまま返す
//! - ロガーを先に構築するのは、後続処理の結果を記録するため
//! - DB と Redis は互いに独立だが、順序は設定の記述順で固定する
//!
//! ## 冪等性
//!
//! 初期化に成功すると [`InitState::Initialized`] に遷移し、以降の
//! [`Bootstrapper::init`] は何もせず同じ [`Resources`] を返す。
//!
//! ## 並行性
//!
//! 起動時に一度だけ、リクエストの受付開始前に呼び出す前提。
//! `init` は `&mut self` を取るため、同時呼び出しはコンパイル時に排除される。

use std::sync::Arc;

use async_trait::async_trait;
use haul_infra::{Cache, Datastore};
use haul_shared::FileLogger;
use tracing::instrument::WithSubscriber as _;

use crate::{
    config::{AppConfig, CacheConfig, DatastoreConfig, LogConfig, LogTarget},
    error::InitError,
};

/// プロセス全体で共有するリソース
///
/// 起動処理で一度だけ構築し、`Arc` で HTTP 層に渡す。
#[derive(Debug)]
pub struct Resources {
    logger:    FileLogger,
    datastore: Option<Datastore>,
    cache:     Option<Cache>,
}

impl Resources {
    pub fn new(logger: FileLogger, datastore: Option<Datastore>, cache: Option<Cache>) -> Self {
        Self {
            logger,
            datastore,
            cache,
        }
    }

    pub fn logger(&self) -> &FileLogger {
        &self.logger
    }

    /// データストア（`datasource` 未設定なら `None`）
    pub fn datastore(&self) -> Option<&Datastore> {
        self.datastore.as_ref()
    }

    /// キャッシュ（`redis` 未設定なら `None`）
    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }
}

/// 初期化状態
#[derive(Debug, Default)]
pub enum InitState {
    #[default]
    Uninitialized,
    Initialized(Arc<Resources>),
}

// =============================================================================
// ResourceFactory
// =============================================================================

/// I/O を伴うリソースの構築
///
/// 本番では [`LiveResourceFactory`] を使用する。
/// テストでは呼び出しを記録する実装に差し替え、順序と冪等性を検証する。
#[async_trait]
pub trait ResourceFactory: Send + Sync {
    /// ロガーを構築する
    fn build_logger(&self, app_name: &str, log: Option<&LogConfig>)
    -> Result<FileLogger, InitError>;

    /// データストアを構築する（設定がなければ `None`）
    async fn build_datastore(
        &self,
        config: Option<&DatastoreConfig>,
    ) -> Result<Option<Datastore>, InitError>;

    /// キャッシュを構築する（設定がなければ `None`）
    async fn build_cache(&self, config: Option<&CacheConfig>) -> Result<Option<Cache>, InitError>;
}

/// 実際のファイル・DB・Redis に接続する実装
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveResourceFactory;

#[async_trait]
impl ResourceFactory for LiveResourceFactory {
    fn build_logger(
        &self,
        app_name: &str,
        log: Option<&LogConfig>,
    ) -> Result<FileLogger, InitError> {
        let target = LogTarget::resolve(app_name, log);
        Ok(FileLogger::open(target.file, &target.level)?)
    }

    async fn build_datastore(
        &self,
        config: Option<&DatastoreConfig>,
    ) -> Result<Option<Datastore>, InitError> {
        let Some(config) = config else {
            return Ok(None);
        };
        Datastore::connect(&config.username, config.password.expose(), &config.url)
            .await
            .map(Some)
            .map_err(|source| InitError::Datastore {
                config: config.to_string(),
                source,
            })
    }

    async fn build_cache(&self, config: Option<&CacheConfig>) -> Result<Option<Cache>, InitError> {
        let Some(config) = config else {
            return Ok(None);
        };
        Cache::connect(&config.address, config.password.expose(), config.db)
            .await
            .map(Some)
            .map_err(|source| InitError::Cache {
                config: config.to_string(),
                source,
            })
    }
}

// =============================================================================
// Bootstrapper
// =============================================================================

/// 起動処理のオーケストレータ
pub struct Bootstrapper<F = LiveResourceFactory> {
    config:  AppConfig,
    factory: F,
    state:   InitState,
}

impl Bootstrapper<LiveResourceFactory> {
    pub fn new(config: AppConfig) -> Self {
        Self::with_factory(config, LiveResourceFactory)
    }
}

impl<F: ResourceFactory> Bootstrapper<F> {
    pub fn with_factory(config: AppConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            state: InitState::Uninitialized,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 設定を取り出す（シークレット鍵の導出結果を含む）
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, InitState::Initialized(_))
    }

    /// 構築済みのリソース
    pub fn resources(&self) -> Option<&Arc<Resources>> {
        match &self.state {
            InitState::Initialized(resources) => Some(resources),
            InitState::Uninitialized => None,
        }
    }

    /// サブシステムを順に初期化する
    ///
    /// 初期化済みの場合は何もせず、構築済みのリソースを返す。
    ///
    /// # エラー
    ///
    /// 最初に失敗した処理のエラー。失敗時はリソースを公開せず、
    /// 状態も [`InitState::Uninitialized`] のまま。
    pub async fn init(&mut self) -> Result<Arc<Resources>, InitError> {
        if let InitState::Initialized(resources) = &self.state {
            return Ok(Arc::clone(resources));
        }

        self.init_auth()?;
        let logger = self
            .factory
            .build_logger(&self.config.app_name, self.config.log.as_ref())?;

        let config = &self.config;
        let factory = &self.factory;
        let (datastore, cache) = async {
            tracing::info!(
                env = %config.env,
                file = %logger.path().display(),
                level = %logger.level(),
                "ロガーを初期化しました"
            );

            let datastore = factory
                .build_datastore(config.datasource.as_ref())
                .await
                .inspect_err(|e| tracing::error!(error = %e, "データストアの初期化に失敗しました"))?;
            tracing::info!(enabled = datastore.is_some(), "データストアを初期化しました");

            let cache = factory
                .build_cache(config.redis.as_ref())
                .await
                .inspect_err(|e| tracing::error!(error = %e, "キャッシュの初期化に失敗しました"))?;
            tracing::info!(enabled = cache.is_some(), "キャッシュを初期化しました");

            Ok::<_, InitError>((datastore, cache))
        }
        .with_subscriber(logger.dispatch().clone())
        .await?;

        let resources = Arc::new(Resources::new(logger, datastore, cache));
        self.state = InitState::Initialized(Arc::clone(&resources));
        Ok(resources)
    }

    fn init_auth(&mut self) -> Result<(), InitError> {
        if let Some(jwt) = self.config.jwt.as_mut() {
            jwt.derive_secret()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use haul_infra::InfraError;
    use haul_shared::LogLevel;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::config::{JwtConfig, Sensitive};

    /// 呼び出しを記録し、指定したステップで失敗するファクトリ
    struct RecordingFactory {
        dir:     TempDir,
        calls:   Mutex<Vec<&'static str>>,
        fail_at: Option<&'static str>,
    }

    impl RecordingFactory {
        fn new() -> Self {
            Self {
                dir:     tempfile::tempdir().unwrap(),
                calls:   Mutex::new(Vec::new()),
                fail_at: None,
            }
        }

        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::new()
            }
        }

        fn record(&self, step: &'static str) -> bool {
            self.calls.lock().unwrap().push(step);
            self.fail_at == Some(step)
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn unreachable(config: String) -> InfraError {
            InfraError::UnexpectedPong(config)
        }
    }

    #[async_trait]
    impl ResourceFactory for RecordingFactory {
        fn build_logger(
            &self,
            app_name: &str,
            log: Option<&LogConfig>,
        ) -> Result<FileLogger, InitError> {
            if self.record("logger") {
                return Err(haul_shared::LoggerError::InvalidLevel("loud".to_string()).into());
            }
            let target = LogTarget::resolve(app_name, log);
            Ok(FileLogger::open(
                self.dir.path().join(target.file),
                &target.level,
            )?)
        }

        async fn build_datastore(
            &self,
            config: Option<&DatastoreConfig>,
        ) -> Result<Option<Datastore>, InitError> {
            if self.record("datastore") {
                return Err(InitError::Datastore {
                    config: format!("{config:?}"),
                    source: Self::unreachable("datastore".to_string()),
                });
            }
            Ok(None)
        }

        async fn build_cache(
            &self,
            config: Option<&CacheConfig>,
        ) -> Result<Option<Cache>, InitError> {
            if self.record("cache") {
                return Err(InitError::Cache {
                    config: format!("{config:?}"),
                    source: Self::unreachable("cache".to_string()),
                });
            }
            Ok(None)
        }
    }

    fn config_with_secret(secret_key: &str) -> AppConfig {
        AppConfig {
            env: "test".to_string(),
            app_name: "svc".to_string(),
            jwt: Some(JwtConfig::new(secret_key, Duration::from_secs(3600))),
            ..AppConfig::default()
        }
    }

    // ===== 順序 =====

    #[tokio::test]
    async fn test_initはロガー_db_redisの順に初期化する() {
        let mut sut =
            Bootstrapper::with_factory(config_with_secret("c2VjcmV0"), RecordingFactory::new());

        let resources = sut.init().await.unwrap();

        assert_eq!(sut.factory.calls(), vec!["logger", "datastore", "cache"]);
        assert!(sut.is_initialized());
        assert!(resources.datastore().is_none());
        assert!(resources.cache().is_none());
        let secret = sut.config().jwt.as_ref().unwrap().secret().unwrap();
        assert_eq!(secret.as_bytes(), b"secret");
    }

    #[tokio::test]
    async fn test_ログ設定がなければアプリ名のファイルにdebugレベルで出力する() {
        // Given
        let dir = tempfile::tempdir().unwrap();
        let app_name = dir.path().join("svc").display().to_string();
        let config = AppConfig {
            env: "test".to_string(),
            app_name,
            ..AppConfig::default()
        };
        let mut sut = Bootstrapper::new(config);

        // When
        let resources = sut.init().await.unwrap();

        // Then
        let logger = resources.logger();
        assert_eq!(logger.level(), LogLevel::Debug);
        assert!(logger.path().ends_with("svc.log"));
        assert_eq!(logger.path(), dir.path().join("svc.log"));
        assert!(logger.path().exists());
    }

    #[tokio::test]
    async fn test_initはロガー構築後の処理結果をログファイルに記録する() {
        let mut sut =
            Bootstrapper::with_factory(config_with_secret(""), RecordingFactory::new());

        let resources = sut.init().await.unwrap();

        let content = std::fs::read_to_string(resources.logger().path()).unwrap();
        assert!(content.contains("ロガーを初期化しました"));
        assert!(content.contains("データストアを初期化しました"));
        assert!(content.contains("キャッシュを初期化しました"));
    }

    // ===== 冪等性 =====

    #[tokio::test]
    async fn test_initを2回呼んでも副作用は1回だけ() {
        let mut sut =
            Bootstrapper::with_factory(config_with_secret("c2VjcmV0"), RecordingFactory::new());

        let first = sut.init().await.unwrap();
        let second = sut.init().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(sut.factory.calls(), vec!["logger", "datastore", "cache"]);
    }

    // ===== 失敗時の中止 =====

    #[tokio::test]
    async fn test_不正なシークレット鍵ではロガーを構築せずに中止する() {
        let mut sut =
            Bootstrapper::with_factory(config_with_secret("not base64!"), RecordingFactory::new());

        let result = sut.init().await;

        assert!(matches!(result, Err(InitError::Decode(_))));
        assert!(sut.factory.calls().is_empty());
        assert!(!sut.is_initialized());
        assert!(sut.resources().is_none());
    }

    #[tokio::test]
    async fn test_空のシークレット鍵は認証無効として成功する() {
        let mut sut = Bootstrapper::with_factory(config_with_secret(""), RecordingFactory::new());

        sut.init().await.unwrap();

        assert_eq!(sut.config().jwt.as_ref().unwrap().secret(), None);
    }

    #[tokio::test]
    async fn test_ロガー構築に失敗したらdbとredisを初期化しない() {
        let mut sut = Bootstrapper::with_factory(
            config_with_secret(""),
            RecordingFactory::failing_at("logger"),
        );

        let result = sut.init().await;

        assert!(matches!(result, Err(InitError::Logger(_))));
        assert_eq!(sut.factory.calls(), vec!["logger"]);
    }

    #[tokio::test]
    async fn test_db初期化に失敗したらredisを初期化しない() {
        let mut sut = Bootstrapper::with_factory(
            config_with_secret(""),
            RecordingFactory::failing_at("datastore"),
        );

        let result = sut.init().await;

        assert!(matches!(result, Err(InitError::Datastore { .. })));
        assert_eq!(sut.factory.calls(), vec!["logger", "datastore"]);
        assert!(!sut.is_initialized());
    }

    #[tokio::test]
    async fn test_redis初期化の失敗はそのまま返りリソースを公開しない() {
        let mut sut = Bootstrapper::with_factory(
            config_with_secret(""),
            RecordingFactory::failing_at("cache"),
        );

        let result = sut.init().await;

        let err = result.unwrap_err();
        assert!(err.is_connection_error());
        assert!(matches!(err, InitError::Cache { .. }));
        assert!(sut.resources().is_none());
    }

    // ===== LiveResourceFactory =====

    #[test]
    fn test_live_build_loggerは指定ファイルにログを出力する() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogConfig {
            file:  Some(dir.path().join("svc.log").display().to_string()),
            level: Some("info".to_string()),
        };

        let sut = LiveResourceFactory.build_logger("svc", Some(&log)).unwrap();

        assert_eq!(sut.path(), dir.path().join("svc.log"));
        assert!(sut.path().exists());
    }

    #[test]
    fn test_live_build_loggerは不正なレベル名でファイルを作らない() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svc.log");
        let log = LogConfig {
            file:  Some(path.display().to_string()),
            level: Some("loud".to_string()),
        };

        let result = LiveResourceFactory.build_logger("svc", Some(&log));

        assert!(matches!(
            result,
            Err(InitError::Logger(haul_shared::LoggerError::InvalidLevel(_)))
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_live_build_datastoreは設定がなければnoneを返す() {
        let result = LiveResourceFactory.build_datastore(None).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_live_build_datastoreは不正な接続先でエラーになる() {
        let config = DatastoreConfig {
            url:      "db.internal:notaport/haul".to_string(),
            username: "haul".to_string(),
            password: Sensitive::new("secret"),
        };

        let result = LiveResourceFactory.build_datastore(Some(&config)).await;

        match result {
            Err(InitError::Datastore { config, .. }) => {
                assert!(config.contains("db.internal:notaport/haul"));
                assert!(!config.contains("secret"));
            }
            other => panic!("expected Datastore error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_live_build_cacheは設定がなければnoneを返す() {
        let result = LiveResourceFactory.build_cache(None).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_live_build_cacheは到達できないアドレスでエラーになる() {
        let config = CacheConfig {
            address: "127.0.0.1:1".to_string(),
            ..CacheConfig::default()
        };

        let result = LiveResourceFactory.build_cache(Some(&config)).await;

        match result {
            Err(InitError::Cache { config, source }) => {
                assert_eq!(config, r#"{"address":"127.0.0.1:1","password":"","db":0}"#);
                assert!(matches!(source, InfraError::Redis(_)));
            }
            other => panic!("expected Cache error, got {other:?}"),
        }
    }

    #[test]
    fn test_init_stateのデフォルトは未初期化() {
        assert!(matches!(InitState::default(), InitState::Uninitialized));
    }
}
