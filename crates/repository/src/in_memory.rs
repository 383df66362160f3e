use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use common::{ClientId, OrderId, SagaId};
use domain::{CancellationSagaRecord, CancellationSagaState, CreationStatus, DeliveryStatus, FabricationStatus, Order};
use tokio::sync::RwLock;

use crate::error::{RepositoryError, Result};
use crate::repo::{CancelSagaRepository, OrderRepository};

/// In-memory repository used by saga and facade unit tests, mirroring the
/// reference workspace's `InMemoryEventStore` test double.
#[derive(Default)]
pub struct InMemoryRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    sagas: RwLock<HashMap<SagaId, CancellationSagaRecord>>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            sagas: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn create_order(
        &self,
        client_id: ClientId,
        pieces_a: u32,
        pieces_b: u32,
        description: String,
        address: Option<String>,
    ) -> Result<Order> {
        let id = OrderId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let order = Order::new(id, client_id, description, address, pieces_a, pieces_b)?;

        self.orders.write().await.insert(id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::OrderNotFound(id))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|o| o.id.as_i64());
        Ok(orders)
    }

    async fn update_creation_status(&self, id: OrderId, status: CreationStatus) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(RepositoryError::OrderNotFound(id))?;
        order.creation_status = status;
        Ok(order.clone())
    }

    async fn update_fabrication_status(
        &self,
        id: OrderId,
        status: FabricationStatus,
        raw: Option<String>,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(RepositoryError::OrderNotFound(id))?;
        order.fabrication_status = status;
        order.fabrication_status_raw = raw;
        Ok(order.clone())
    }

    async fn update_delivery_status(&self, id: OrderId, status: DeliveryStatus) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(RepositoryError::OrderNotFound(id))?;
        order.delivery_status = status;
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        self.orders
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::OrderNotFound(id))
    }
}

#[async_trait]
impl CancelSagaRepository for InMemoryRepository {
    async fn create_cancel_saga(
        &self,
        saga_id: SagaId,
        order_id: OrderId,
        state: CancellationSagaState,
    ) -> Result<CancellationSagaRecord> {
        let mut record = CancellationSagaRecord::new(saga_id, order_id);
        record.state = state;
        self.sagas.write().await.insert(saga_id, record.clone());
        Ok(record)
    }

    async fn update_cancel_saga(
        &self,
        saga_id: SagaId,
        state: CancellationSagaState,
        error: Option<String>,
    ) -> Result<CancellationSagaRecord> {
        let mut sagas = self.sagas.write().await;
        let record = sagas.get_mut(&saga_id).ok_or(RepositoryError::SagaNotFound(saga_id))?;
        record.state = state;
        record.error = error;
        Ok(record.clone())
    }

    async fn get_cancel_saga(&self, saga_id: SagaId) -> Result<CancellationSagaRecord> {
        self.sagas
            .read()
            .await
            .get(&saga_id)
            .cloned()
            .ok_or(RepositoryError::SagaNotFound(saga_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_order_roundtrips() {
        let repo = InMemoryRepository::new();
        let created = repo
            .create_order(ClientId::new(1), 2, 3, "widgets".into(), None)
            .await
            .unwrap();

        let fetched = repo.get_order(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.number_of_pieces(), 5);
    }

    #[tokio::test]
    async fn create_order_rejects_zero_pieces() {
        let repo = InMemoryRepository::new();
        let result = repo.create_order(ClientId::new(1), 0, 0, "nothing".into(), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_unknown_order_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_order(OrderId::new(999)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn status_updates_affect_only_their_own_field() {
        let repo = InMemoryRepository::new();
        let order = repo.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();

        repo.update_creation_status(order.id, CreationStatus::Confirmed).await.unwrap();
        let updated = repo
            .update_fabrication_status(order.id, FabricationStatus::Requested, Some("queued".into()))
            .await
            .unwrap();

        assert_eq!(updated.creation_status, CreationStatus::Confirmed);
        assert_eq!(updated.fabrication_status, FabricationStatus::Requested);
        assert_eq!(updated.fabrication_status_raw.as_deref(), Some("queued"));
        assert_eq!(updated.delivery_status, DeliveryStatus::NotStarted);
    }

    #[tokio::test]
    async fn delete_order_removes_it() {
        let repo = InMemoryRepository::new();
        let order = repo.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        repo.delete_order(order.id).await.unwrap();
        assert!(repo.get_order(order.id).await.is_err());
    }

    #[tokio::test]
    async fn cancel_saga_lifecycle() {
        let repo = InMemoryRepository::new();
        let order = repo.create_order(ClientId::new(1), 1, 0, "x".into(), None).await.unwrap();
        let saga_id = SagaId::new();

        repo.create_cancel_saga(saga_id, order.id, CancellationSagaState::Canceling)
            .await
            .unwrap();

        let updated = repo
            .update_cancel_saga(saga_id, CancellationSagaState::Refunding, None)
            .await
            .unwrap();
        assert_eq!(updated.state, CancellationSagaState::Refunding);

        let fetched = repo.get_cancel_saga(saga_id).await.unwrap();
        assert_eq!(fetched.state, CancellationSagaState::Refunding);
    }
}
