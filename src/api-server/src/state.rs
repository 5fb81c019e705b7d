use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use authx_authz::{PipelineMetrics, PolicyPipeline, Result as AuthxResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::ServerFileConfig;
use crate::error::{ApiError, Result};
use crate::resolver::BearerTokenResolver;
use crate::rights::orders_tree;

/// A stored order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Principal id of the customer
    pub owner: String,
    pub amount_cents: u64,
    #[serde(default)]
    pub refunded: bool,
}

/// Order entry in the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSeed {
    pub owner: String,
    pub amount_cents: u64,
    #[serde(default)]
    pub refunded: bool,
}

/// In-memory order store
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seeds<'a>(seeds: impl IntoIterator<Item = (&'a String, &'a OrderSeed)>) -> Self {
        let orders = seeds
            .into_iter()
            .map(|(id, seed)| {
                let order = Order {
                    id: id.clone(),
                    owner: seed.owner.clone(),
                    amount_cents: seed.amount_cents,
                    refunded: seed.refunded,
                };
                (id.clone(), order)
            })
            .collect();

        Self {
            orders: Arc::new(RwLock::new(orders)),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Mark an order refunded, failing if it is unknown or already refunded
    pub async fn refund(&self, id: &str) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(format!("order {} not found", id)))?;

        if order.refunded {
            return Err(ApiError::Conflict(format!("order {} is already refunded", id)));
        }

        order.refunded = true;
        Ok(order.clone())
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: PolicyPipeline,
    pub metrics: PipelineMetrics,
    pub orders: OrderStore,
    pub tokens: Arc<BearerTokenResolver>,
    pub start_time: Instant,
    pub version: String,
}

impl AppState {
    /// Wire the pipeline, token table and order store from a configuration
    pub fn from_config(config: &ServerFileConfig) -> AuthxResult<Self> {
        let registry = config.authx.to_registry()?;
        let orders = OrderStore::from_seeds(&config.orders);
        let tokens = Arc::new(BearerTokenResolver::new(
            config.tokens.iter().map(|(k, v)| (k.clone(), v.clone())),
        ));
        let metrics = PipelineMetrics::new();

        let pipeline = PolicyPipeline::builder()
            .shared_resolver(tokens.clone())
            .metadata(registry)
            .rights_tree(orders_tree(orders.clone()))
            .anonymous_grants(config.authx.anonymous_grants.iter().cloned())
            .metrics(metrics.clone())
            .build()?;

        Ok(Self {
            pipeline,
            metrics,
            orders,
            tokens,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
