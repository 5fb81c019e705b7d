//! Pipeline exit counters

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::DenyReason;

/// Snapshot of pipeline exits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Total number of pipeline runs that reached an exit
    pub total_requests: u64,
    pub allowed: u64,
    pub skipped: u64,
    pub unauthorized: u64,
    pub forbidden_grant_mismatch: u64,
    pub forbidden_rights_mismatch: u64,
    /// Configuration and collaborator errors
    pub errors: u64,
}

impl PipelineStats {
    pub fn forbidden(&self) -> u64 {
        self.forbidden_grant_mismatch + self.forbidden_rights_mismatch
    }

    /// Share of authorized runs (allowed or skipped)
    pub fn pass_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.allowed + self.skipped) as f64 / self.total_requests as f64
        }
    }
}

/// Metrics collector shared by clones of a pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    stats: Arc<RwLock<PipelineStats>>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_allowed(&self) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        stats.allowed += 1;
    }

    pub async fn record_skipped(&self) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        stats.skipped += 1;
    }

    pub async fn record_unauthorized(&self) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        stats.unauthorized += 1;
    }

    pub async fn record_forbidden(&self, reason: &DenyReason) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        match reason {
            DenyReason::GrantMismatch { .. } => stats.forbidden_grant_mismatch += 1,
            DenyReason::RightsMismatch { .. } => stats.forbidden_rights_mismatch += 1,
        }
    }

    pub async fn record_error(&self) {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        stats.errors += 1;
    }

    pub async fn snapshot(&self) -> PipelineStats {
        self.stats.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.stats.write().await = PipelineStats::default();
    }
}
