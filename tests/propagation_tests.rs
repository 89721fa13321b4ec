//! Integration tests for permission change propagation.

#![cfg(feature = "async")]

use async_trait::async_trait;
use dashmap::DashMap;
use permission_gate::{
    Error, PermissionChange, PermissionPropagator, PrincipalDirectory, PropagationWorker,
    ResolverMetrics, SessionStore,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// In-memory principal directory shared across tests.
#[derive(Default)]
struct Directory {
    direct: DashMap<String, HashSet<String>>,
    user_roles: DashMap<String, Vec<String>>,
    role_perms: DashMap<String, HashSet<String>>,
    role_users: DashMap<String, Vec<String>>,
}

#[async_trait]
impl PrincipalDirectory for Directory {
    async fn direct_permissions(&self, user_id: &str) -> Result<HashSet<String>, Error> {
        Ok(self.direct.get(user_id).map(|v| v.clone()).unwrap_or_default())
    }

    async fn roles_of(&self, user_id: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .user_roles
            .get(user_id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn role_permissions(&self, role_id: &str) -> Result<HashSet<String>, Error> {
        Ok(self
            .role_perms
            .get(role_id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn users_with_role(&self, role_id: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .role_users
            .get(role_id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }
}

/// Session store that fails updates for a configurable set of users' tokens.
#[derive(Default)]
struct Sessions {
    tokens: DashMap<String, Vec<String>>,
    updated: Arc<DashMap<String, HashSet<String>>>,
    failing_tokens: HashSet<String>,
}

#[async_trait]
impl SessionStore for Sessions {
    async fn live_tokens(&self, user_id: &str) -> Result<Vec<String>, Error> {
        Ok(self.tokens.get(user_id).map(|v| v.clone()).unwrap_or_default())
    }

    async fn update_token_permissions(
        &self,
        token: &str,
        codes: &HashSet<String>,
    ) -> Result<(), Error> {
        if self.failing_tokens.contains(token) {
            return Err(Error::SessionUpdate(
                token.to_string(),
                "simulated outage".to_string(),
            ));
        }
        self.updated.insert(token.to_string(), codes.clone());
        Ok(())
    }
}

fn set(codes: &[&str]) -> HashSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn directory_with_role(role: &str, perms: &[&str], users: &[&str]) -> Directory {
    let directory = Directory::default();
    directory.role_perms.insert(role.to_string(), set(perms));
    directory
        .role_users
        .insert(role.to_string(), users.iter().map(|u| u.to_string()).collect());
    for user in users {
        directory
            .user_roles
            .insert(user.to_string(), vec![role.to_string()]);
    }
    directory
}

#[tokio::test]
async fn test_role_event_with_one_failing_principal() {
    // N = 5 principals; principal u2's only token fails.
    let users = ["u0", "u1", "u2", "u3", "u4"];
    let directory = directory_with_role("moderator", &["forum:post:delete"], &users);

    let mut failing = HashSet::new();
    failing.insert("u2-token".to_string());
    let sessions = Sessions {
        failing_tokens: failing,
        ..Sessions::default()
    };
    for user in users {
        sessions
            .tokens
            .insert(user.to_string(), vec![format!("{user}-token")]);
    }
    let updated = sessions.updated.clone();

    let propagator = PermissionPropagator::new(directory, sessions);
    let report = propagator
        .apply_change(&PermissionChange::Role("moderator".into()))
        .await;

    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);

    // The other four principals' tokens all carry the recomputed set.
    for user in ["u0", "u1", "u3", "u4"] {
        let codes = updated.get(&format!("{user}-token")).unwrap();
        assert_eq!(*codes, set(&["forum:post:delete"]));
    }
    assert!(!updated.contains_key("u2-token"));
}

#[tokio::test]
async fn test_user_event_pushes_union_of_direct_and_role_grants() {
    let directory = directory_with_role("member", &["forum:post:read"], &["u1"]);
    directory.direct.insert("u1".into(), set(&["profile:edit"]));

    let sessions = Sessions::default();
    sessions
        .tokens
        .insert("u1".into(), vec!["web".into(), "mobile".into()]);
    let updated = sessions.updated.clone();

    let propagator = PermissionPropagator::new(directory, sessions);
    let report = propagator
        .apply_change(&PermissionChange::User("u1".into()))
        .await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    for token in ["web", "mobile"] {
        assert_eq!(
            *updated.get(token).unwrap(),
            set(&["forum:post:read", "profile:edit"])
        );
    }
}

#[tokio::test]
async fn test_user_with_no_live_tokens_succeeds_quietly() {
    let directory = Directory::default();
    directory.direct.insert("u1".into(), set(&["x"]));

    let propagator = PermissionPropagator::new(directory, Sessions::default());
    let report = propagator
        .apply_change(&PermissionChange::User("u1".into()))
        .await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_worker_processes_enqueued_changes_asynchronously() {
    let directory = directory_with_role("member", &["forum:post:read"], &["u1", "u2"]);
    let sessions = Sessions::default();
    sessions.tokens.insert("u1".into(), vec!["t1".into()]);
    sessions.tokens.insert("u2".into(), vec!["t2".into()]);
    let updated = sessions.updated.clone();

    let metrics = Arc::new(ResolverMetrics::new());
    let propagator = PermissionPropagator::with_metrics(directory, sessions, metrics.clone());
    let (handle, worker) = PropagationWorker::spawn(propagator, 16);

    // Enqueue returns immediately; the worker catches up on its own.
    handle
        .enqueue(PermissionChange::Role("member".into()))
        .unwrap();
    handle.enqueue(PermissionChange::User("u1".into())).unwrap();

    drop(handle);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();

    assert!(updated.contains_key("t1"));
    assert!(updated.contains_key("t2"));
    // Role event: 2 successes; user event: 1 more.
    assert_eq!(metrics.summary().propagation_successes, 3);
    assert_eq!(metrics.summary().propagation_failures, 0);
}

#[tokio::test]
async fn test_enqueue_after_worker_shutdown_is_an_error() {
    let propagator = PermissionPropagator::new(Directory::default(), Sessions::default());
    let (handle, worker) = PropagationWorker::spawn(propagator, 4);

    worker.abort();
    let _ = worker.await;

    // The receiver is gone; enqueue reports a closed queue.
    let result = handle.enqueue(PermissionChange::User("u1".into()));
    assert!(matches!(result, Err(Error::QueueClosed) | Err(Error::QueueFull)));
}
