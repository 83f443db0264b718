//! Callback contract between the watch layer and the broadcaster.

use async_trait::async_trait;
use fleetcast_events::ResourceRef;

use crate::error::BroadcastError;

/// Handler for resource lifecycle notifications.
///
/// An `Err` asks the watch layer to requeue the change with backoff; `Ok`
/// means the change was published or deliberately skipped.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_add(&self, obj: ResourceRef) -> Result<(), BroadcastError>;

    async fn on_update(
        &self,
        old_obj: ResourceRef,
        new_obj: ResourceRef,
    ) -> Result<(), BroadcastError>;

    async fn on_delete(&self, obj: ResourceRef) -> Result<(), BroadcastError>;
}
