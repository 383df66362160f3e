//! PostgreSQL integration tests.
//!
//! These tests run serially with a single shared PostgreSQL container. The
//! container is cleaned up when the test process exits.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p repository --test postgres_integration
//! ```

use std::sync::{Arc, OnceLock};

use common::{ClientId, OrderId, SagaId};
use domain::{CancellationSagaState, CreationStatus, DeliveryStatus, FabricationStatus};
use repository::{CancelSagaRepository, OrderRepository, PostgresRepository, RepositoryError};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, ImageExt, core::IntoContainerPort, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct TestContainer {
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static TEST_CONTAINER: OnceCell<Arc<TestContainer>> = OnceCell::const_new();
static CONTAINER_ID: OnceLock<String> = OnceLock::new();

#[ctor::dtor]
fn cleanup_container() {
    if let Some(container_id) = CONTAINER_ID.get() {
        let _ = std::process::Command::new("docker")
            .args(["rm", "-f", container_id])
            .output();
    }
}

async fn get_container() -> Arc<TestContainer> {
    TEST_CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default()
                .with_tag("18-alpine")
                .start()
                .await
                .expect("failed to start postgres container");

            let _ = CONTAINER_ID.set(container.id().to_string());

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432.tcp()).await.unwrap();
            let connection_string = format!("postgres://postgres:postgres@{host}:{port}/postgres");

            let pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../migrations/0001_create_fabrication_order.sql"))
                .execute(&pool)
                .await
                .unwrap();
            sqlx::raw_sql(include_str!("../migrations/0002_create_cancel_saga.sql"))
                .execute(&pool)
                .await
                .unwrap();
            pool.close().await;

            Arc::new(TestContainer {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_repository() -> PostgresRepository {
    let container = get_container().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&container.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE cancel_saga, fabrication_order RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresRepository::new(pool)
}

#[tokio::test]
#[serial]
async fn create_and_get_order_roundtrips() {
    let repo = get_test_repository().await;

    let created = repo
        .create_order(ClientId::new(1), 3, 2, "a batch of widgets".into(), Some("123 Main St".into()))
        .await
        .unwrap();

    assert_eq!(created.number_of_pieces(), 5);
    assert_eq!(created.creation_status, CreationStatus::Pending);

    let fetched = repo.get_order(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
#[serial]
async fn create_order_rejects_zero_pieces() {
    let repo = get_test_repository().await;
    let result = repo.create_order(ClientId::new(1), 0, 0, "empty".into(), None).await;
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
async fn get_unknown_order_returns_not_found() {
    let repo = get_test_repository().await;
    let err = repo.get_order(OrderId::new(999_999)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::OrderNotFound(_)));
}

#[tokio::test]
#[serial]
async fn phase_status_updates_are_independent() {
    let repo = get_test_repository().await;
    let order = repo
        .create_order(ClientId::new(2), 1, 0, "one piece".into(), None)
        .await
        .unwrap();

    repo.update_creation_status(order.id, CreationStatus::Confirmed).await.unwrap();
    let updated = repo
        .update_fabrication_status(order.id, FabricationStatus::InProgress, Some("working".into()))
        .await
        .unwrap();

    assert_eq!(updated.creation_status, CreationStatus::Confirmed);
    assert_eq!(updated.fabrication_status, FabricationStatus::InProgress);
    assert_eq!(updated.fabrication_status_raw.as_deref(), Some("working"));
    assert_eq!(updated.delivery_status, DeliveryStatus::NotStarted);
}

#[tokio::test]
#[serial]
async fn list_orders_returns_all_in_id_order() {
    let repo = get_test_repository().await;
    let first = repo.create_order(ClientId::new(1), 1, 0, "first".into(), None).await.unwrap();
    let second = repo.create_order(ClientId::new(1), 1, 0, "second".into(), None).await.unwrap();

    let all = repo.list_orders().await.unwrap();
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![first.id, second.id]);
}

#[tokio::test]
#[serial]
async fn delete_order_removes_it() {
    let repo = get_test_repository().await;
    let order = repo.create_order(ClientId::new(1), 1, 0, "gone soon".into(), None).await.unwrap();

    repo.delete_order(order.id).await.unwrap();
    assert!(repo.get_order(order.id).await.is_err());
}

#[tokio::test]
#[serial]
async fn cancel_saga_lifecycle() {
    let repo = get_test_repository().await;
    let order = repo.create_order(ClientId::new(1), 2, 0, "cancel me".into(), None).await.unwrap();
    let saga_id = SagaId::new();

    repo.create_cancel_saga(saga_id, order.id, CancellationSagaState::Canceling)
        .await
        .unwrap();

    let updated = repo
        .update_cancel_saga(saga_id, CancellationSagaState::CancelPendingRefund, Some("refund service down".into()))
        .await
        .unwrap();
    assert_eq!(updated.state, CancellationSagaState::CancelPendingRefund);
    assert_eq!(updated.error.as_deref(), Some("refund service down"));

    let fetched = repo.get_cancel_saga(saga_id).await.unwrap();
    assert_eq!(fetched.state, CancellationSagaState::CancelPendingRefund);
}

#[tokio::test]
#[serial]
async fn get_unknown_cancel_saga_returns_not_found() {
    let repo = get_test_repository().await;
    let err = repo.get_cancel_saga(SagaId::new()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::SagaNotFound(_)));
}
