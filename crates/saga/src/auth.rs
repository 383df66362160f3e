//! Caches the issuer's public key once `auth.running` fires (spec §4.7
//! supplement; §5 "filesystem-stored auth public key").
//!
//! The façade's health check consults [`AuthKeyCache::public_key`] to decide
//! between 200 and 503: readers tolerate absence rather than blocking on it.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{IncomingMessage, MessageHandler, routing};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Holds the most recently fetched auth public key, if any.
pub struct AuthKeyCache {
    issuer_url: String,
    http: reqwest::Client,
    key: RwLock<Option<String>>,
}

impl AuthKeyCache {
    pub fn new(issuer_url: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            http: reqwest::Client::new(),
            key: RwLock::new(None),
        }
    }

    /// Returns the cached key, or `None` if auth has never reported ready.
    pub async fn public_key(&self) -> Option<String> {
        self.key.read().await.clone()
    }

    async fn refresh(&self) -> reqwest::Result<()> {
        let key = self.http.get(&self.issuer_url).send().await?.text().await?;
        *self.key.write().await = Some(key);
        Ok(())
    }

    async fn clear(&self) {
        *self.key.write().await = None;
    }
}

/// Reacts to `auth.running` (fetch and cache) and `auth.not_running` (clear).
pub struct AuthStatusIngress {
    cache: Arc<AuthKeyCache>,
}

impl AuthStatusIngress {
    pub fn new(cache: Arc<AuthKeyCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl MessageHandler for AuthStatusIngress {
    async fn handle(&self, message: IncomingMessage) -> bus::Result<()> {
        match message.routing_key.as_str() {
            routing::AUTH_RUNNING => {
                if let Err(err) = self.cache.refresh().await {
                    warn!(%err, "failed to fetch auth public key, will retry on next auth.running");
                    return Err(bus::BusError::Handler(err.to_string()));
                }
                info!("auth public key refreshed");
                Ok(())
            }
            routing::AUTH_NOT_RUNNING => {
                self.cache.clear().await;
                warn!("auth service reported not running, cleared cached key");
                Ok(())
            }
            other => {
                warn!(routing_key = other, "unexpected routing key on auth ingress");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_starts_empty() {
        let cache = AuthKeyCache::new("http://localhost:0/jwks");
        assert!(cache.public_key().await.is_none());
    }

    #[tokio::test]
    async fn clear_resets_to_none() {
        let cache = AuthKeyCache::new("http://localhost:0/jwks");
        *cache.key.write().await = Some("some-key".into());
        cache.clear().await;
        assert!(cache.public_key().await.is_none());
    }

    #[tokio::test]
    async fn not_running_clears_cached_key() {
        let cache = Arc::new(AuthKeyCache::new("http://localhost:0/jwks"));
        *cache.key.write().await = Some("some-key".into());

        let ingress = AuthStatusIngress::new(cache.clone());
        let message = IncomingMessage::new(routing::AUTH_NOT_RUNNING, serde_json::json!({"status": "not_running"}));
        ingress.handle(message).await.unwrap();

        assert!(cache.public_key().await.is_none());
    }
}
