use std::str::FromStr;

use async_trait::async_trait;
use common::{ClientId, OrderId, SagaId};
use domain::{CancellationSagaRecord, CancellationSagaState, CreationStatus, DeliveryStatus, FabricationStatus, Order};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{RepositoryError, Result};
use crate::repo::{CancelSagaRepository, OrderRepository};

/// `sqlx::PgPool`-backed order and cancellation-saga repository.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let creation_status: String = row.try_get("creation_status")?;
        let fabrication_status: String = row.try_get("fabrication_status")?;
        let delivery_status: String = row.try_get("delivery_status")?;
        let pieces_a: i32 = row.try_get("pieces_a")?;
        let pieces_b: i32 = row.try_get("pieces_b")?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            client_id: ClientId::new(row.try_get("client_id")?),
            description: row.try_get("description")?,
            address: row.try_get("address")?,
            pieces_a: pieces_a as u32,
            pieces_b: pieces_b as u32,
            creation_status: CreationStatus::from_str(&creation_status)
                .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(Box::new(e))))?,
            fabrication_status: FabricationStatus::from_str(&fabrication_status)
                .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(Box::new(e))))?,
            delivery_status: DeliveryStatus::from_str(&delivery_status)
                .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(Box::new(e))))?,
            fabrication_status_raw: row.try_get("fabrication_status_raw")?,
        })
    }

    fn row_to_saga(row: PgRow) -> Result<CancellationSagaRecord> {
        let state: String = row.try_get("state")?;

        Ok(CancellationSagaRecord {
            saga_id: SagaId::from_uuid(row.try_get("saga_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            state: CancellationSagaState::from_str(&state)
                .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(Box::new(e))))?,
            error: row.try_get("error")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresRepository {
    async fn create_order(
        &self,
        client_id: ClientId,
        pieces_a: u32,
        pieces_b: u32,
        description: String,
        address: Option<String>,
    ) -> Result<Order> {
        domain::Order::new(OrderId::new(0), client_id, &description, address.clone(), pieces_a, pieces_b)?;

        let row = sqlx::query(
            r#"
            INSERT INTO fabrication_order
                (client_id, description, address, pieces_a, pieces_b,
                 creation_status, fabrication_status, delivery_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, client_id, description, address, pieces_a, pieces_b,
                      creation_status, fabrication_status, delivery_status, fabrication_status_raw
            "#,
        )
        .bind(client_id.as_i64())
        .bind(&description)
        .bind(&address)
        .bind(pieces_a as i32)
        .bind(pieces_b as i32)
        .bind(CreationStatus::default().as_str())
        .bind(FabricationStatus::default().as_str())
        .bind(DeliveryStatus::default().as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, client_id, description, address, pieces_a, pieces_b,
                   creation_status, fabrication_status, delivery_status, fabrication_status_raw
            FROM fabrication_order
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::OrderNotFound(id))?;

        Self::row_to_order(row)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, description, address, pieces_a, pieces_b,
                   creation_status, fabrication_status, delivery_status, fabrication_status_raw
            FROM fabrication_order
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_creation_status(&self, id: OrderId, status: CreationStatus) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE fabrication_order SET creation_status = $2
            WHERE id = $1
            RETURNING id, client_id, description, address, pieces_a, pieces_b,
                      creation_status, fabrication_status, delivery_status, fabrication_status_raw
            "#,
        )
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::OrderNotFound(id))?;

        Self::row_to_order(row)
    }

    async fn update_fabrication_status(
        &self,
        id: OrderId,
        status: FabricationStatus,
        raw: Option<String>,
    ) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE fabrication_order SET fabrication_status = $2, fabrication_status_raw = $3
            WHERE id = $1
            RETURNING id, client_id, description, address, pieces_a, pieces_b,
                      creation_status, fabrication_status, delivery_status, fabrication_status_raw
            "#,
        )
        .bind(id.as_i64())
        .bind(status.as_str())
        .bind(&raw)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::OrderNotFound(id))?;

        Self::row_to_order(row)
    }

    async fn update_delivery_status(&self, id: OrderId, status: DeliveryStatus) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE fabrication_order SET delivery_status = $2
            WHERE id = $1
            RETURNING id, client_id, description, address, pieces_a, pieces_b,
                      creation_status, fabrication_status, delivery_status, fabrication_status_raw
            "#,
        )
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::OrderNotFound(id))?;

        Self::row_to_order(row)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query("DELETE FROM fabrication_order WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OrderNotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl CancelSagaRepository for PostgresRepository {
    async fn create_cancel_saga(
        &self,
        saga_id: SagaId,
        order_id: OrderId,
        state: CancellationSagaState,
    ) -> Result<CancellationSagaRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO cancel_saga (saga_id, order_id, state, error)
            VALUES ($1, $2, $3, NULL)
            RETURNING saga_id, order_id, state, error
            "#,
        )
        .bind(saga_id.as_uuid())
        .bind(order_id.as_i64())
        .bind(state.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_saga(row)
    }

    async fn update_cancel_saga(
        &self,
        saga_id: SagaId,
        state: CancellationSagaState,
        error: Option<String>,
    ) -> Result<CancellationSagaRecord> {
        let row = sqlx::query(
            r#"
            UPDATE cancel_saga SET state = $2, error = $3
            WHERE saga_id = $1
            RETURNING saga_id, order_id, state, error
            "#,
        )
        .bind(saga_id.as_uuid())
        .bind(state.as_str())
        .bind(&error)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::SagaNotFound(saga_id))?;

        Self::row_to_saga(row)
    }

    async fn get_cancel_saga(&self, saga_id: SagaId) -> Result<CancellationSagaRecord> {
        let row = sqlx::query(
            r#"
            SELECT saga_id, order_id, state, error
            FROM cancel_saga
            WHERE saga_id = $1
            "#,
        )
        .bind(saga_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::SagaNotFound(saga_id))?;

        Self::row_to_saga(row)
    }
}
