use authx_core::Identity;
use serde::{Deserialize, Serialize};

use crate::state::Order;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Order as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner: String,
    pub amount_cents: u64,
    pub refunded: bool,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            owner: order.owner,
            amount_cents: order.amount_cents,
            refunded: order.refunded,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicStatusResponse {
    pub status: String,
    pub orders: usize,
}

/// Login request exchanging a token for a session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub principal: String,
}

/// Who the caller is, as seen by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub identified: bool,
    pub principal: Option<String>,
    pub grants: Vec<String>,
}

impl From<&Identity> for MeResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            identified: identity.is_identified(),
            principal: identity.principal().map(|p| p.id.clone()),
            grants: identity.grants().to_vec(),
        }
    }
}
