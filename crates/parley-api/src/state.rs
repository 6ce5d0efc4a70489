//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository traits; AppState pins them to the
//! SQLite and HTTP implementations from parley-infra.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parley_core::analytics::dispatcher::AnalyticsDispatcher;
use parley_core::analytics::sink::{BoxAnalyticsSink, NoopSink};
use parley_core::chat::service::ConversationStore;
use parley_core::enrich::boxed::{BoxFileRecognizer, BoxImageRecognizer};
use parley_core::enrich::context::ContextEnricher;
use parley_core::llm::box_gateway::BoxInferenceGateway;
use parley_core::llm::title::TitleGenerator;
use parley_core::message::orchestrator::MessageOrchestrator;
use parley_core::quota::ledger::QuotaLedger;
use parley_core::service::model::ModelService;
use parley_core::service::subscription::SubscriptionService;
use parley_core::service::user::UserService;
use parley_core::shortcut::resolver::ShortcutResolver;
use parley_core::shortcut::service::ShortcutService;
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::remote::{EnrichmentClient, HttpInferenceGateway, PosthogSink};
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::model::SqliteModelRepository;
use parley_infra::sqlite::pool::{database_url, DatabasePool};
use parley_infra::sqlite::shortcut::SqliteShortcutRepository;
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::{AnalyticsConfig, GlobalConfig};
use parley_types::llm::ModelTarget;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteOrchestrator = MessageOrchestrator<
    SqliteUserRepository,
    SqliteModelRepository,
    SqliteShortcutRepository,
    SqliteChatRepository,
>;

pub type ConcreteUserService = UserService<SqliteUserRepository, SqliteModelRepository>;

pub type ConcreteShortcutService = ShortcutService<SqliteShortcutRepository, SqliteModelRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ConcreteOrchestrator>,
    pub user_service: Arc<ConcreteUserService>,
    pub model_service: Arc<ModelService<SqliteModelRepository>>,
    pub shortcut_service: Arc<ConcreteShortcutService>,
    pub subscription_service: Arc<SubscriptionService<SqliteUserRepository>>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load config,
    /// connect to the DB and wire services.
    ///
    /// Returns the analytics worker handle; it finishes once `cancel` fires.
    pub async fn init(cancel: CancellationToken) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        Ok(Self::build(db_pool, config, data_dir, cancel))
    }

    /// Wire services on top of an open pool and a loaded config.
    pub fn build(
        db_pool: DatabasePool,
        config: GlobalConfig,
        data_dir: PathBuf,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let gateway = Arc::new(BoxInferenceGateway::new(HttpInferenceGateway::new(
            config.inference.base_url.clone(),
            Duration::from_secs(config.inference.timeout_secs),
        )));

        let enrichment_timeout = Duration::from_secs(config.enrichment.timeout_secs);
        let enrichment = EnrichmentClient::new(config.enrichment.base_url.clone(), enrichment_timeout);
        let enricher = ContextEnricher::new(
            BoxImageRecognizer::new(enrichment.clone()),
            BoxFileRecognizer::new(enrichment),
            enrichment_timeout,
        );

        let (analytics, worker) = AnalyticsDispatcher::spawn(
            build_sink(&config.analytics),
            config.analytics.queue_capacity,
            Duration::from_secs(config.analytics.timeout_secs),
            cancel,
        );

        let titles = TitleGenerator::new(
            gateway.clone(),
            ModelTarget {
                system_name: config.inference.title_model.clone(),
                providers: config.inference.title_providers.clone(),
            },
        );
        let conversations =
            ConversationStore::new(SqliteChatRepository::new(db_pool.clone()), titles);

        let orchestrator = MessageOrchestrator::new(
            QuotaLedger::new(SqliteUserRepository::new(db_pool.clone())),
            SqliteModelRepository::new(db_pool.clone()),
            ShortcutResolver::new(SqliteShortcutRepository::new(db_pool.clone())),
            enricher,
            conversations,
            gateway,
            analytics,
        );

        let user_service = UserService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteModelRepository::new(db_pool.clone()),
            config.quota.clone(),
        );
        let shortcut_service = ShortcutService::new(
            SqliteShortcutRepository::new(db_pool.clone()),
            SqliteModelRepository::new(db_pool.clone()),
            config.shortcuts.clone(),
        );
        let model_service = ModelService::new(SqliteModelRepository::new(db_pool.clone()));
        let subscription_service =
            SubscriptionService::new(SqliteUserRepository::new(db_pool.clone()));

        let state = Self {
            orchestrator: Arc::new(orchestrator),
            user_service: Arc::new(user_service),
            model_service: Arc::new(model_service),
            shortcut_service: Arc::new(shortcut_service),
            subscription_service: Arc::new(subscription_service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        };
        (state, worker)
    }
}

/// PostHog when analytics is enabled and a key is configured, otherwise a no-op.
fn build_sink(config: &AnalyticsConfig) -> BoxAnalyticsSink {
    match (&config.api_key, config.enabled) {
        (Some(key), true) => BoxAnalyticsSink::new(PosthogSink::new(
            config.endpoint.clone(),
            SecretString::from(key.clone()),
            Duration::from_secs(config.timeout_secs),
        )),
        (None, true) => {
            tracing::warn!("analytics enabled but no API key configured, events will be discarded");
            BoxAnalyticsSink::new(NoopSink)
        }
        _ => BoxAnalyticsSink::new(NoopSink),
    }
}
