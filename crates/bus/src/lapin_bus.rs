use std::sync::Arc;

use async_trait::async_trait;
use deadpool_lapin::Pool;
use futures_util::StreamExt;
use lapin::{
    BasicProperties, ExchangeKind,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
        ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use serde_json::Value;
use tracing::{error, warn};

use crate::bus::{MessageBus, MessageHandler};
use crate::error::Result;
use crate::message::IncomingMessage;

/// `lapin`/`deadpool-lapin`-backed [`MessageBus`] over a real AMQP broker.
#[derive(Clone)]
pub struct LapinBus {
    pool: Pool,
}

impl LapinBus {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn declare_exchange(&self, exchange: &str) -> Result<()> {
        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageBus for LapinBus {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &Value) -> Result<()> {
        self.declare_exchange(exchange).await?;

        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        let body = serde_json::to_vec(payload)?;

        channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_content_type("application/json".into()),
            )
            .await?
            .await?;

        metrics::counter!("bus_messages_published_total", "routing_key" => routing_key.to_string()).increment(1);
        Ok(())
    }

    async fn declare_queue(&self, queue: &str) -> Result<()> {
        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    async fn bind(&self, queue: &str, exchange: &str, pattern: &str) -> Result<()> {
        self.declare_exchange(exchange).await?;
        self.declare_queue(queue).await?;

        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        channel
            .queue_bind(
                queue,
                exchange,
                pattern,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    async fn consume(&self, queue: &str, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let conn = self.pool.get().await?;
        let channel = conn.create_channel().await?;
        let consumer_tag = format!("{queue}-consumer");

        let mut consumer = channel
            .basic_consume(
                queue,
                &consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let queue = queue.to_string();
        tokio::spawn(async move {
            while let Some(delivery) = consumer.next().await {
                let delivery = match delivery {
                    Ok(delivery) => delivery,
                    Err(err) => {
                        error!(queue = %queue, error = %err, "failed to read delivery");
                        continue;
                    }
                };

                let routing_key = delivery.routing_key.to_string();
                let payload: Value = match serde_json::from_slice(&delivery.data) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(queue = %queue, %routing_key, error = %err, "dropping undecodable message");
                        let _ = delivery.ack(BasicAckOptions::default()).await;
                        continue;
                    }
                };

                let message = IncomingMessage::new(routing_key, payload);
                match handler.handle(message).await {
                    Ok(()) => {
                        if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                            error!(queue = %queue, error = %err, "failed to ack delivery");
                        }
                    }
                    Err(err) => {
                        error!(queue = %queue, error = %err, "handler failed, nacking for redelivery");
                        let _ = delivery
                            .nack(BasicNackOptions {
                                requeue: true,
                                ..Default::default()
                            })
                            .await;
                    }
                }
            }
        });

        Ok(())
    }
}
