//! Permission change propagation (requires 'async' feature).
//!
//! When an administrator grants or revokes permissions, every affected
//! principal's live sessions must receive the recomputed effective
//! permission set. The triggering mutation must not block on that work, so
//! changes are enqueued as explicit [`PermissionChange`] values into a
//! bounded channel consumed by a dedicated worker task.
//!
//! Per-token and per-principal failures are logged and counted but never
//! abort the rest of a batch.

use crate::error::{Error, Result};
use crate::metrics::ResolverMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A permission mutation whose effects must be pushed to live sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub enum PermissionChange {
    /// A single user's direct grants or role assignments changed.
    User(String),
    /// A role's permission set changed; affects every holder of the role.
    Role(String),
}

/// Directory of principals, their direct grants and role memberships.
///
/// Implemented by the identity collaborator that owns the user/role tables.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Permission codes granted directly to the user.
    async fn direct_permissions(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Names of all roles the user holds.
    async fn roles_of(&self, user_id: &str) -> Result<Vec<String>>;

    /// Permission codes granted through a role.
    async fn role_permissions(&self, role_id: &str) -> Result<HashSet<String>>;

    /// All users holding a role.
    async fn users_with_role(&self, role_id: &str) -> Result<Vec<String>>;
}

/// The externally-owned session/identity store holding live tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Every live token the user currently holds.
    async fn live_tokens(&self, user_id: &str) -> Result<Vec<String>>;

    /// Replace the permission set carried by a token.
    async fn update_token_permissions(&self, token: &str, codes: &HashSet<String>) -> Result<()>;
}

/// Aggregated outcome of processing one [`PermissionChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    /// Principals whose sessions were fully updated.
    pub succeeded: u64,
    /// Principals for whom at least one step failed.
    pub failed: u64,
    /// When the batch finished.
    pub finished_at: DateTime<Utc>,
}

impl PropagationReport {
    fn new(succeeded: u64, failed: u64) -> Self {
        Self {
            succeeded,
            failed,
            finished_at: Utc::now(),
        }
    }
}

/// Recomputes effective permission sets and pushes them into live sessions.
pub struct PermissionPropagator<D, S>
where
    D: PrincipalDirectory,
    S: SessionStore,
{
    directory: D,
    sessions: S,
    metrics: Arc<ResolverMetrics>,
}

impl<D, S> PermissionPropagator<D, S>
where
    D: PrincipalDirectory,
    S: SessionStore,
{
    /// Create a propagator over the given collaborators.
    pub fn new(directory: D, sessions: S) -> Self {
        Self::with_metrics(directory, sessions, Arc::new(ResolverMetrics::new()))
    }

    /// Create a propagator sharing an existing metrics collector.
    pub fn with_metrics(directory: D, sessions: S, metrics: Arc<ResolverMetrics>) -> Self {
        Self {
            directory,
            sessions,
            metrics,
        }
    }

    /// The propagator's metrics collector.
    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// Process one change end to end, returning the aggregate outcome.
    pub async fn apply_change(&self, change: &PermissionChange) -> PropagationReport {
        let report = match change {
            PermissionChange::User(user_id) => match self.refresh_user(user_id).await {
                Ok(()) => PropagationReport::new(1, 0),
                Err(e) => {
                    error!("propagation failed for user '{user_id}': {e}");
                    PropagationReport::new(0, 1)
                }
            },
            PermissionChange::Role(role_id) => self.refresh_role_holders(role_id).await,
        };

        self.metrics.record_propagation(report.succeeded, report.failed);
        info!(
            "propagation for {change:?}: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    /// Recompute a user's effective permission set: direct grants united
    /// with the grants of every held role, deduplicated.
    pub async fn effective_permissions(&self, user_id: &str) -> Result<HashSet<String>> {
        let mut codes = self.directory.direct_permissions(user_id).await?;
        for role in self.directory.roles_of(user_id).await? {
            codes.extend(self.directory.role_permissions(&role).await?);
        }
        Ok(codes)
    }

    async fn refresh_user(&self, user_id: &str) -> Result<()> {
        let codes = self.effective_permissions(user_id).await?;
        let tokens = self.sessions.live_tokens(user_id).await?;

        // One token failing must not abort the user's other tokens.
        let mut last_err = None;
        for token in tokens {
            if let Err(e) = self
                .sessions
                .update_token_permissions(&token, &codes)
                .await
            {
                warn!("token update failed for user '{user_id}': {e}");
                last_err = Some(e);
            }
        }

        match last_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn refresh_role_holders(&self, role_id: &str) -> PropagationReport {
        let users = match self.directory.users_with_role(role_id).await {
            Ok(users) => users,
            Err(e) => {
                error!("cannot enumerate holders of role '{role_id}': {e}");
                return PropagationReport::new(0, 0);
            }
        };

        let mut succeeded = 0;
        let mut failed = 0;
        for user_id in users {
            match self.refresh_user(&user_id).await {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    error!("propagation failed for user '{user_id}' (role '{role_id}'): {e}");
                    failed += 1;
                }
            }
        }

        PropagationReport::new(succeeded, failed)
    }
}

/// Handle for enqueuing changes into the propagation worker.
#[derive(Clone)]
pub struct PropagationHandle {
    sender: mpsc::Sender<PermissionChange>,
}

impl PropagationHandle {
    /// Enqueue a change without blocking the administrative call path.
    pub fn enqueue(&self, change: PermissionChange) -> Result<()> {
        self.sender.try_send(change).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::QueueFull,
            mpsc::error::TrySendError::Closed(_) => Error::QueueClosed,
        })
    }
}

/// The dedicated worker consuming the propagation queue.
pub struct PropagationWorker;

impl PropagationWorker {
    /// Default queue capacity.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

    /// Spawn the worker task on the current tokio runtime.
    ///
    /// Returns the enqueue handle and the worker's join handle. The worker
    /// exits when every handle is dropped and the queue drains.
    pub fn spawn<D, S>(
        propagator: PermissionPropagator<D, S>,
        queue_capacity: usize,
    ) -> (PropagationHandle, JoinHandle<()>)
    where
        D: PrincipalDirectory + 'static,
        S: SessionStore + 'static,
    {
        let (sender, mut receiver) = mpsc::channel(queue_capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(change) = receiver.recv().await {
                propagator.apply_change(&change).await;
            }
        });

        (PropagationHandle { sender }, worker)
    }
}
