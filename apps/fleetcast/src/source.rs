//! Watch notification source.
//!
//! Reads newline-delimited notifications, hands them to an [`EventHandler`]
//! and requeues failed dispatches with exponential backoff:
//!
//! ```text
//! {"op":"add","kind":"GameServer","object":{"name":"gs-1","namespace":"default"}}
//! {"op":"update","kind":"Fleet","old_object":{..},"object":{..}}
//! ```
//!
//! Undecodable lines are logged and skipped.

use std::sync::Arc;
use std::time::Duration;

use fleetcast_broadcaster::{BroadcastError, EventHandler};
use fleetcast_events::resources::{Fleet, GameServer};
use fleetcast_events::{Resource, ResourceRef, UnstructuredResource};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

use crate::error::NotificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchOp {
    Add,
    Update,
    Delete,
}

/// One change observed on a watched resource.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchNotification {
    pub op: WatchOp,
    pub kind: String,
    pub object: Value,
    #[serde(default)]
    pub old_object: Option<Value>,
}

impl WatchNotification {
    pub fn parse(line: &str) -> Result<Self, NotificationError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Resolve into the typed change handed to the handler.
    pub fn into_change(self) -> Result<Change, NotificationError> {
        let kind = self.kind;
        match self.op {
            WatchOp::Add => Ok(Change::Add(to_resource(&kind, self.object)?)),
            WatchOp::Delete => Ok(Change::Delete(to_resource(&kind, self.object)?)),
            WatchOp::Update => {
                let old = self
                    .old_object
                    .ok_or_else(|| NotificationError::MissingOldObject { kind: kind.clone() })?;
                Ok(Change::Update {
                    old: to_resource(&kind, old)?,
                    new: to_resource(&kind, self.object)?,
                })
            }
        }
    }
}

/// A decoded notification. Resources are shared so retries don't re-decode.
#[derive(Debug, Clone)]
pub enum Change {
    Add(ResourceRef),
    Update { old: ResourceRef, new: ResourceRef },
    Delete(ResourceRef),
}

impl Change {
    pub async fn apply(&self, handler: &dyn EventHandler) -> Result<(), BroadcastError> {
        match self {
            Change::Add(obj) => handler.on_add(Arc::clone(obj)).await,
            Change::Update { old, new } => {
                handler.on_update(Arc::clone(old), Arc::clone(new)).await
            }
            Change::Delete(obj) => handler.on_delete(Arc::clone(obj)).await,
        }
    }
}

/// Decode `object` as the typed resource for `kind`. Kinds without a typed
/// model are carried as unstructured JSON.
pub fn to_resource(kind: &str, object: Value) -> Result<ResourceRef, NotificationError> {
    if kind == GameServer::KIND {
        typed::<GameServer>(kind, object)
    } else if kind == Fleet::KIND {
        typed::<Fleet>(kind, object)
    } else {
        Ok(Arc::new(UnstructuredResource::new(kind, object)))
    }
}

fn typed<R: Resource + DeserializeOwned>(
    kind: &str,
    object: Value,
) -> Result<ResourceRef, NotificationError> {
    let resource: R =
        serde_json::from_value(object).map_err(|e| NotificationError::InvalidObject {
            kind: kind.to_string(),
            cause: e.to_string(),
        })?;
    Ok(Arc::new(resource))
}

/// Requeue policy for failed dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (zero based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Apply `change`, retrying failures until the policy is exhausted.
pub async fn dispatch_with_retry(
    handler: &dyn EventHandler,
    change: &Change,
    policy: &RetryPolicy,
) -> Result<(), BroadcastError> {
    let mut attempt = 0;
    loop {
        match change.apply(handler).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Dispatch failed, requeueing"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceStats {
    pub dispatched: usize,
    pub invalid: usize,
    pub failed: usize,
}

/// Consume `reader` until EOF.
pub async fn run<R>(
    reader: R,
    handler: &dyn EventHandler,
    policy: &RetryPolicy,
) -> std::io::Result<SourceStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = SourceStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let change = match WatchNotification::parse(line).and_then(WatchNotification::into_change)
        {
            Ok(change) => change,
            Err(e) => {
                warn!(error = %e, "Skipping notification");
                stats.invalid += 1;
                continue;
            }
        };

        match dispatch_with_retry(handler, &change, policy).await {
            Ok(()) => stats.dispatched += 1,
            Err(e) => {
                error!(error = %e, retries = policy.max_retries, "Dropping notification");
                stats.failed += 1;
            }
        }
    }

    debug!(?stats, "Watch source exhausted");
    Ok(stats)
}
