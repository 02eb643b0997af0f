//! Profile assignment service entry point.
//!
//! Wires configuration, stores, event transports and handlers together, then
//! runs the stream consumers and the expertise decay sweep until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use profile_assignment::adapters::{
    HttpBehaviorSource, HttpBehaviorSourceConfig, IdempotentHandler, InMemoryAssignmentStore,
    InMemoryBehaviorSource, InMemoryEventBus, InMemoryExpertiseRepository,
    InMemoryProcessedEventStore, PostgresAssignmentStore, PostgresExpertiseRepository,
    PostgresProcessedEventStore, RedisStreamPublisher, StreamConsumer, StreamConsumerConfig,
    StreamRouting, DRIFT_DETECTED,
};
use profile_assignment::application::{
    DecayExpertiseHandler, DetectDriftHandler, DriftTriggerHandler, EvaluateObservationHandler,
    ObservationIntakeHandler, ProcessDriftBatchHandler, UpdateExpertiseHandler, UserLocks,
    OBSERVATION_RECEIVED,
};
use profile_assignment::config::{AppConfig, LogFormat, LoggingConfig};
use profile_assignment::domain::foundation::Timestamp;
use profile_assignment::ports::{
    AssignmentStore, EventHandler, EventPublisher, EventSubscriber, ExpertiseRepository,
    ProcessedEventStore, RecentBehaviorSource,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DECAY_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

struct Stores {
    assignments: Arc<dyn AssignmentStore>,
    expertise: Arc<dyn ExpertiseRepository>,
    processed_events: Arc<dyn ProcessedEventStore>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let catalog = Arc::new(config.catalog()?);
    tracing::info!(profiles = catalog.len(), "profile catalog loaded");

    let stores = connect_stores(&config).await?;
    let locks = Arc::new(UserLocks::new());

    let redis_conn = match &config.redis {
        Some(redis) => {
            let client = redis::Client::open(redis.url.as_str())?;
            let conn = tokio::time::timeout(
                redis.timeout(),
                client.get_multiplexed_async_connection(),
            )
            .await??;
            Some(conn)
        }
        None => None,
    };
    let bus = Arc::new(InMemoryEventBus::new());
    let publisher: Arc<dyn EventPublisher> = match (&config.redis, &redis_conn) {
        (Some(redis), Some(conn)) => Arc::new(RedisStreamPublisher::new(
            conn.clone(),
            StreamRouting::new(&redis.assigned_stream, &redis.events_stream),
        )),
        _ => bus.clone(),
    };

    let behavior_source: Arc<dyn RecentBehaviorSource> = match &config.intake.behavior_source_url
    {
        Some(url) => Arc::new(HttpBehaviorSource::new(
            HttpBehaviorSourceConfig::new(url).with_timeout(config.intake.fetch_timeout()),
        )?),
        None => {
            tracing::warn!("no behavior source configured; drift fallback batches will be empty");
            Arc::new(InMemoryBehaviorSource::new())
        }
    };

    let assigner = Arc::new(EvaluateObservationHandler::new(
        stores.assignments.clone(),
        publisher.clone(),
        catalog,
        config.matching.matcher(),
        config.assignment.clone(),
        locks.clone(),
    ));
    let detector = Arc::new(DetectDriftHandler::new(
        stores.assignments.clone(),
        publisher.clone(),
        config.drift.clone(),
        locks.clone(),
    ));
    let batches = Arc::new(ProcessDriftBatchHandler::new(
        stores.assignments.clone(),
        assigner.clone(),
    ));
    let drift_triggers: Arc<dyn EventHandler> = Arc::new(IdempotentHandler::new(
        DriftTriggerHandler::new(
            detector,
            batches,
            behavior_source,
            config.intake.drift_batch_limit,
        ),
        stores.processed_events.clone(),
    ));
    let intake: Arc<dyn EventHandler> = Arc::new(IdempotentHandler::new(
        ObservationIntakeHandler::new(
            assigner,
            Arc::new(UpdateExpertiseHandler::new(stores.expertise.clone())),
        ),
        stores.processed_events.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    match (&config.redis, redis_conn) {
        (Some(redis), Some(conn)) => {
            let drift_config = StreamConsumerConfig::drift_triggers()
                .with_stream(&redis.drift_stream)
                .with_group(&redis.consumer_group, &redis.consumer_name)
                .with_max_concurrent_users(config.intake.max_concurrent_users)
                .with_max_deliveries(redis.max_deliveries)
                .with_retry_backoff(redis.retry_backoff());
            let consumer = StreamConsumer::new(conn.clone(), drift_triggers, drift_config);
            let rx = shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = consumer.run(rx).await {
                    tracing::error!(error = %e, "drift trigger consumer stopped");
                }
            }));

            if let Some(stream) = &redis.observation_stream {
                let observation_config = StreamConsumerConfig::observations(OBSERVATION_RECEIVED)
                    .with_stream(stream)
                    .with_group(&redis.consumer_group, &redis.consumer_name)
                    .with_max_concurrent_users(config.intake.max_concurrent_users)
                    .with_max_deliveries(redis.max_deliveries)
                    .with_retry_backoff(redis.retry_backoff());
                let consumer = StreamConsumer::new(conn, intake, observation_config);
                let rx = shutdown_rx.clone();
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = consumer.run(rx).await {
                        tracing::error!(error = %e, "observation consumer stopped");
                    }
                }));
            }
        }
        _ => {
            tracing::info!("redis not configured; events stay in-process");
            bus.subscribe(DRIFT_DETECTED, drift_triggers);
            bus.subscribe(OBSERVATION_RECEIVED, intake);
        }
    }

    let decay = DecayExpertiseHandler::new(stores.expertise);
    let mut decay_shutdown = shutdown_rx;
    tasks.push(tokio::spawn(async move {
        let mut interval = tokio::time::interval(DECAY_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => match decay.handle(Timestamp::now()).await {
                    Ok(result) => tracing::info!(
                        scanned = result.scanned,
                        decayed = result.decayed,
                        "expertise decay sweep finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "expertise decay sweep failed"),
                },
                _ = decay_shutdown.changed() => break,
            }
        }
    }));

    tracing::info!("profile assignment service started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;
    let registry = tracing_subscriber::registry().with(filter);
    match logging.log_format()? {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
    }
    Ok(())
}

async fn connect_stores(config: &AppConfig) -> Result<Stores, BoxError> {
    let Some(database) = &config.database else {
        tracing::info!("database not configured; using in-memory stores");
        return Ok(Stores {
            assignments: Arc::new(InMemoryAssignmentStore::new()),
            expertise: Arc::new(InMemoryExpertiseRepository::new()),
            processed_events: Arc::new(InMemoryProcessedEventStore::new()),
        });
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(&database.url)
        .await?;
    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }
    tracing::info!("connected to PostgreSQL");

    Ok(Stores {
        assignments: Arc::new(PostgresAssignmentStore::new(pool.clone())),
        expertise: Arc::new(PostgresExpertiseRepository::new(pool.clone())),
        processed_events: Arc::new(PostgresProcessedEventStore::new(pool)),
    })
}
