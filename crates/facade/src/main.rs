//! Order-orchestrator façade entry point: wires Postgres, the AMQP bus,
//! the sagas and ingress handlers, and the HTTP router together.

use std::sync::Arc;

use bus::{BusError, LapinBus, MessageBus};
use facade::config::Config;
use facade::routes::orders::AppState;
use repository::{PostgresRepository, Repository};
use saga::{
    AuthKeyCache, AuthStatusIngress, CancellationSaga, ConfirmationSaga, DeliveryFinishedIngress,
    DeliveryResultIngress, FabricationCanceledIngress, LegacyPaymentIngress, MoneyReturnedIngress,
    PaymentResultIngress, RefundResultIngress, SagaRegistry, WarehouseIngress,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, starting graceful shutdown"),
        () = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}

/// Declares the durable queues this process consumes and binds each to its
/// routing-key pattern (spec §6 "Durability"). Consumers are wired
/// separately once each handler is constructed.
async fn declare_and_bind(bus: &dyn MessageBus, warehouse_binding: &str) -> Result<(), BusError> {
    let bindings: &[(&str, &str, &str)] = &[
        ("payment-result", bus::routing::exchange::EVENTS, bus::routing::PAYMENT_RESULT),
        ("legacy-payment-paid", bus::routing::exchange::EVENTS, bus::routing::PAYMENT_PAID),
        ("legacy-payment-failed", bus::routing::exchange::EVENTS, bus::routing::PAYMENT_FAILED),
        ("delivery-result", bus::routing::exchange::EVENTS, bus::routing::DELIVERY_RESULT),
        ("delivery-finished", bus::routing::exchange::EVENTS, bus::routing::DELIVERY_FINISHED),
        ("delivery-ready", bus::routing::exchange::EVENTS, bus::routing::DELIVERY_READY),
        ("money-returned", bus::routing::exchange::EVENTS, bus::routing::MONEY_RETURNED),
        ("auth-running", bus::routing::exchange::EVENTS, bus::routing::AUTH_RUNNING),
        ("auth-not-running", bus::routing::exchange::EVENTS, bus::routing::AUTH_NOT_RUNNING),
        ("fabrication-canceled", bus::routing::exchange::SAGA, bus::routing::EVT_FABRICATION_CANCELED),
        ("refund-result", bus::routing::exchange::SAGA, bus::routing::REFUND_RESULT),
        ("refund-refunded", bus::routing::exchange::SAGA, bus::routing::REFUND_REFUNDED),
        ("refund-failed", bus::routing::exchange::SAGA, bus::routing::REFUND_FAILED),
    ];

    for (queue, exchange, pattern) in bindings {
        bus.bind(queue, exchange, pattern).await?;
    }

    bus.bind("warehouse-events", bus::routing::exchange::EVENTS, warehouse_binding).await?;

    Ok(())
}

async fn register_consumers<R: Repository + 'static>(
    bus: &dyn MessageBus,
    bus_handle: Arc<dyn MessageBus>,
    repository: Arc<R>,
    confirmation: Arc<ConfirmationSaga<R>>,
    cancellation: Arc<CancellationSaga<R>>,
    auth_cache: Arc<AuthKeyCache>,
) -> Result<(), BusError> {
    bus.consume("payment-result", Arc::new(PaymentResultIngress::new(confirmation.clone()))).await?;
    bus.consume("legacy-payment-paid", Arc::new(LegacyPaymentIngress::new(repository.clone()))).await?;
    bus.consume("legacy-payment-failed", Arc::new(LegacyPaymentIngress::new(repository.clone()))).await?;
    bus.consume("delivery-result", Arc::new(DeliveryResultIngress::new(confirmation.clone()))).await?;
    bus.consume("delivery-finished", Arc::new(DeliveryFinishedIngress::new(repository.clone()))).await?;
    bus.consume("delivery-ready", Arc::new(DeliveryFinishedIngress::new(repository.clone()))).await?;
    bus.consume("money-returned", Arc::new(MoneyReturnedIngress::new(confirmation.clone()))).await?;
    bus.consume("auth-running", Arc::new(AuthStatusIngress::new(auth_cache.clone()))).await?;
    bus.consume("auth-not-running", Arc::new(AuthStatusIngress::new(auth_cache))).await?;
    bus.consume("fabrication-canceled", Arc::new(FabricationCanceledIngress::new(cancellation.clone()))).await?;
    bus.consume("refund-result", Arc::new(RefundResultIngress::new(cancellation.clone()))).await?;
    bus.consume("refund-refunded", Arc::new(RefundResultIngress::new(cancellation.clone()))).await?;
    bus.consume("refund-failed", Arc::new(RefundResultIngress::new(cancellation))).await?;
    bus.consume("warehouse-events", Arc::new(WarehouseIngress::new(repository.clone(), bus_handle))).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("failed to load configuration from environment");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(?config, "loaded configuration");

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect(&config.database_url)
        .await
        .expect("failed to connect to Postgres");
    let repository = Arc::new(PostgresRepository::new(pool));
    repository.run_migrations().await.expect("failed to run migrations");

    let amqp_pool = deadpool_lapin::Config {
        url: Some(config.amqp_url.clone()),
        ..Default::default()
    }
    .create_pool(Some(deadpool_lapin::Runtime::Tokio1))
    .expect("failed to build AMQP connection pool");
    let bus: Arc<dyn MessageBus> = Arc::new(LapinBus::new(amqp_pool));

    declare_and_bind(bus.as_ref(), &config.warehouse_events_binding)
        .await
        .expect("failed to declare and bind queues");

    let registry = Arc::new(SagaRegistry::new());
    let confirmation = Arc::new(ConfirmationSaga::new(repository.clone(), bus.clone(), registry.clone()));
    let cancellation = Arc::new(CancellationSaga::new(repository.clone(), bus.clone(), registry));
    let auth_cache = Arc::new(AuthKeyCache::new(config.auth_issuer_url.clone()));

    register_consumers(
        bus.as_ref(),
        bus.clone(),
        repository.clone(),
        confirmation.clone(),
        cancellation.clone(),
        auth_cache.clone(),
    )
    .await
    .expect("failed to register bus consumers");

    let state = Arc::new(AppState {
        repository,
        confirmation,
        cancellation,
    });

    let app = facade::create_app(state, auth_cache, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting order-facade");

    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
